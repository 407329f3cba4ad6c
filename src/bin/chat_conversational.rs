use contact_center_lambdas::config::{init_tracing, invocation_span, Settings};
use contact_center_lambdas::http;
use contact_center_lambdas::chat::{chat_handler, ChatRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::Instrument;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let settings = &Settings::from_env();
    let client = &http::build_client()?;

    run(service_fn(move |event: LambdaEvent<ChatRequest>| async move {
        let span = invocation_span("chat-conversational", &event.context.request_id);
        Ok::<_, Error>(chat_handler(settings, client, event.payload).instrument(span).await?)
    }))
    .await
}
