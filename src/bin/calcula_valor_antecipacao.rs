use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::finance::{anticipation_handler, AnticipationRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<AnticipationRequest>| async move {
        let _guard = invocation_span("calcula-valor-antecipacao", &event.context.request_id).entered();
        Ok::<_, Error>(anticipation_handler(event.payload)?)
    }))
    .await
}
