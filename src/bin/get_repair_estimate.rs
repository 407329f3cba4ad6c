use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::simulation::{repair_estimate, CustomerRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<CustomerRequest>| async move {
        let _guard = invocation_span("get-repair-estimate", &event.context.request_id).entered();
        Ok::<_, Error>(repair_estimate(event.payload)?)
    }))
    .await
}
