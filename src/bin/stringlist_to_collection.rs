use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::text::{string_list_to_collection, CitiesRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<CitiesRequest>| async move {
        let _guard = invocation_span("stringlist-to-collection", &event.context.request_id).entered();
        Ok::<_, Error>(string_list_to_collection(event.payload)?)
    }))
    .await
}
