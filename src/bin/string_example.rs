use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::text::{character_count, CountRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<CountRequest>| async move {
        let _guard = invocation_span("string-example", &event.context.request_id).entered();
        Ok::<_, Error>(character_count(event.payload))
    }))
    .await
}
