use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::simulation::{check_outage, CustomerRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<CustomerRequest>| async move {
        let _guard = invocation_span("check-outage-status", &event.context.request_id).entered();
        Ok::<_, Error>(check_outage(event.payload)?)
    }))
    .await
}
