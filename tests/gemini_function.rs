//! Image analysis against mocked image host and Gemini API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use contact_center_lambdas::gemini::{image_analysis_handler, ImageAnalysisRequest};
use contact_center_lambdas::{AdapterError, Settings};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nfatura";

fn settings_for(server: &MockServer) -> Settings {
    let uri = server.uri();
    Settings::from_lookup(|key| match key {
        "GEMINI_BASE_URL" => Some(uri.clone()),
        _ => None,
    })
}

fn request_for(server: &MockServer) -> ImageAnalysisRequest {
    ImageAnalysisRequest {
        image_uri: format!("{}/images/fatura.png", server.uri()),
        api_key: "g-key".into(),
        content_text: "Qual o valor total da fatura?".into(),
        mime_type: "image/png".into(),
    }
}

async fn mount_image(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/images/fatura.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn image_is_sent_inline_and_answer_returned() {
    let server = MockServer::start().await;
    mount_image(&server).await;
    let answer = json!({
        "candidates": [{"content": {"parts": [{"text": "R$ 154,90"}], "role": "model"}}],
        "modelVersion": "gemini-2.5-flash-lite"
    });
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
        .and(query_param("key", "g-key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [
                {"text": "Qual o valor total da fatura?"},
                {"inline_data": {"mime_type": "image/png", "data": STANDARD.encode(IMAGE)}}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let response = image_analysis_handler(&settings_for(&server), &Client::new(), request_for(&server))
        .await
        .unwrap();

    assert_eq!(response, answer);
}

#[tokio::test]
async fn gemini_rejection_is_upstream_failure() {
    let server = MockServer::start().await;
    mount_image(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = image_analysis_handler(&settings_for(&server), &Client::new(), request_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdapterError::UpstreamRequestFailed { status: 400, ref body, .. } if body == "API key not valid"
    ));
}

#[tokio::test]
async fn missing_image_stops_before_gemini() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/fatura.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = image_analysis_handler(&settings_for(&server), &Client::new(), request_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::UpstreamRequestFailed { status: 404, .. }));
}

#[tokio::test]
async fn blank_prompt_is_invalid_input() {
    let server = MockServer::start().await;
    let mut request = request_for(&server);
    request.content_text = String::new();

    let err = image_analysis_handler(&settings_for(&server), &Client::new(), request)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidInput(ref m) if m.contains("content_text")));
}
