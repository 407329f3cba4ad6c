use contact_center_lambdas::config::{init_tracing, invocation_span};
use contact_center_lambdas::simulation::{fetch_article, ArticleRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    run(service_fn(|event: LambdaEvent<ArticleRequest>| async move {
        let _guard = invocation_span("sim-kb-fetch-article", &event.context.request_id).entered();
        Ok::<_, Error>(fetch_article(event.payload)?)
    }))
    .await
}
