use contact_center_lambdas::config::{init_tracing, invocation_span, Settings};
use contact_center_lambdas::gemini::{image_analysis_handler, ImageAnalysisRequest};
use contact_center_lambdas::http;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::Instrument;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let settings = &Settings::from_env();
    let client = &http::build_client()?;

    run(service_fn(move |event: LambdaEvent<ImageAnalysisRequest>| async move {
        let span = invocation_span("gemini-image-analyzer", &event.context.request_id);
        Ok::<_, Error>(image_analysis_handler(settings, client, event.payload).instrument(span).await?)
    }))
    .await
}
