use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::simulation::open_ticket;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<serde_json::Value>| async move {
        let _guard = invocation_span("sim-open-ticket", &event.context.request_id).entered();
        Ok::<_, Error>(open_ticket())
    }))
    .await
}
