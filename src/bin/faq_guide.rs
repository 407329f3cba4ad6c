use std::collections::HashMap;

use contact_center_lambdas::config::{init_tracing, invocation_span, Settings};
use contact_center_lambdas::http;
use contact_center_lambdas::genesys::knowledge::faq_handler;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::Instrument;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let settings = &Settings::from_env();
    let client = &http::build_client()?;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        let span = invocation_span("faq-guide", &event.context.request_id);
        let client_context: HashMap<String, String> = event
            .context
            .client_context
            .as_ref()
            .map(|c| c.custom.clone())
            .unwrap_or_default();
        Ok::<_, Error>(
            faq_handler(settings, client, event.payload, &client_context)
                .instrument(span)
                .await,
        )
    }))
    .await
}
