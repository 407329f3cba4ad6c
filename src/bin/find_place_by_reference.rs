use contact_center_lambdas::config::{init_tracing, invocation_span, Settings};
use contact_center_lambdas::http;
use contact_center_lambdas::places::{find_place_google, FindPlaceRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::Instrument;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let settings = &Settings::from_env();
    let client = &http::build_client()?;

    run(service_fn(move |event: LambdaEvent<FindPlaceRequest>| async move {
        let span = invocation_span("find-place-by-reference", &event.context.request_id);
        Ok::<_, Error>(find_place_google(settings, client, event.payload).instrument(span).await?)
    }))
    .await
}
