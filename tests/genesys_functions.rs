//! Knowledge search and WhatsApp template functions against a mocked Genesys Cloud.

use std::collections::HashMap;

use contact_center_lambdas::genesys::knowledge::{faq_handler, INTERNAL_ERROR, NO_RESULTS};
use contact_center_lambdas::genesys::messaging::{
    whatsapp_template_handler, WhatsAppTemplateRequest, WhatsAppTemplateResponse,
};
use contact_center_lambdas::Settings;
use reqwest::Client;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASIC_CLIENT_SECRET: &str = "Basic Y2xpZW50OnNlY3JldA==";

fn settings_for(server: &MockServer) -> Settings {
    let uri = server.uri();
    Settings::from_lookup(|key| match key {
        "GENESYS_LOGIN_BASE_URL" | "GENESYS_API_BASE_URL" => Some(uri.clone()),
        _ => None,
    })
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "client_credentials"))
        .and(header("authorization", BASIC_CLIENT_SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gc-token",
            "token_type": "bearer",
            "expires_in": 86399
        })))
        .mount(server)
        .await;
}

fn kb_event(headers: Value) -> Value {
    json!({
        "query": "como trocar a senha",
        "KBId": "kb-1",
        "maxArticles": 2,
        "minConfidence": 0.4,
        "headers": headers
    })
}

#[tokio::test]
async fn faq_extracts_answer_from_documents() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/knowledge/knowledgebases/kb-1/documents/search"))
        .and(query_param("expand", "documentVariations"))
        .and(header("authorization", "Bearer gc-token"))
        .and(body_partial_json(json!({
            "query": "como trocar a senha",
            "pageSize": 2,
            "confidenceThreshold": 0.4,
            "answerMode": ["AnswerHighlight"],
            "queryType": "AutoSearch"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "document": {
                    "variations": [{
                        "body": {"blocks": [
                            {"type": "Paragraph", "paragraph": {"blocks": [
                                {"type": "Text", "text": {"text": "Acesse o portal."}}
                            ]}},
                            {"type": "OrderedList", "list": {"blocks": [
                                {"type": "ListItem", "blocks": [{"type": "Text", "text": {"text": "Clique em Perfil"}}]},
                                {"type": "ListItem", "blocks": [{"type": "Text", "text": {"text": "Escolha Senha"}}]}
                            ]}}
                        ]}
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let event = kb_event(json!({"gcClientId": "client", "gcClientSecret": "secret", "domain": "mypurecloud.com"}));
    let answer = faq_handler(&settings_for(&server), &Client::new(), event, &HashMap::new()).await;

    assert_eq!(
        answer.answer,
        "Acesse o portal.\n\n• Clique em Perfil\n• Escolha Senha"
    );
}

#[tokio::test]
async fn faq_reads_raw_request_and_client_context() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/knowledge/knowledgebases/kb-1/documents/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let raw = json!({"query": "q", "KBId": "kb-1", "maxArticles": 1, "minConfidence": 0.1}).to_string();
    let context: HashMap<String, String> = [
        ("gcClientId", "client"),
        ("gcClientSecret", "secret"),
        ("domain", "mypurecloud.com"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let answer = faq_handler(&settings_for(&server), &Client::new(), json!({ "rawRequest": raw }), &context).await;

    assert_eq!(answer.answer, NO_RESULTS);
}

#[tokio::test]
async fn faq_reports_token_failure_in_band() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .mount(&server)
        .await;

    let event = kb_event(json!({"gcClientId": "client", "gcClientSecret": "wrong", "domain": "mypurecloud.com"}));
    let answer = faq_handler(&settings_for(&server), &Client::new(), event, &HashMap::new()).await;

    assert_eq!(answer.answer, INTERNAL_ERROR);
}

fn template_request() -> WhatsAppTemplateRequest {
    WhatsAppTemplateRequest {
        client_id: "client".into(),
        client_secret: "secret".into(),
        from_address: "integration-1".into(),
        to_address: "+5511988887777".into(),
        response_id: "resp-9".into(),
        body_parameters: json!(["Maria", "10/11"]),
    }
}

#[tokio::test]
async fn whatsapp_first_attempt_succeeds() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/conversations/messages/agentless"))
        .and(header("authorization", "Bearer gc-token"))
        .and(body_partial_json(json!({
            "toAddressMessengerType": "whatsapp",
            "useExistingActiveConversation": false,
            "messagingTemplate": {
                "responseId": "resp-9",
                "bodyParameters": [{"id": "1", "value": "Maria"}, {"id": "2", "value": "10/11"}]
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "conv-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = whatsapp_template_handler(&settings_for(&server), &Client::new(), template_request()).await;

    match response {
        WhatsAppTemplateResponse::Sent { success, attempt, response } => {
            assert!(success);
            assert_eq!(attempt, 1);
            assert_eq!(response["id"], "conv-1");
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn whatsapp_retries_on_active_conversation() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/conversations/messages/agentless"))
        .and(body_partial_json(json!({"useExistingActiveConversation": false})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "An active conversation is already in progress for this recipient",
            "code": "bad.request"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/conversations/messages/agentless"))
        .and(body_partial_json(json!({"useExistingActiveConversation": true})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "conv-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = whatsapp_template_handler(&settings_for(&server), &Client::new(), template_request()).await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json, json!({"success": true, "attempt": 2, "response": {"id": "conv-2"}}));
}

#[tokio::test]
async fn whatsapp_other_rejection_is_reported() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/conversations/messages/agentless"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "template not approved"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = whatsapp_template_handler(&settings_for(&server), &Client::new(), template_request()).await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        json!({"success": false, "error": {"message": "template not approved"}})
    );
}
