//! Knowledge-base search and readable-text extraction from document block trees.

use std::collections::HashMap;

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::{fetch_access_token, Credentials};
use crate::config::Settings;
use crate::error::Result;
use crate::http;

pub const NO_RESULTS: &str = "No results found for your query.";
pub const NO_CONTENT: &str = "No content found in the knowledge base results";
pub const INVALID_JSON: &str = "Invalid JSON input";
pub const MISSING_DOMAIN: &str = "Missing domain in headers or client context";
pub const INTERNAL_ERROR: &str = "An internal error occurred.";

/// A node of a knowledge document body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(String),
    Paragraph(Vec<Block>),
    /// Ordered and unordered lists; `None` when the list carries no block array.
    List(Option<Vec<Block>>),
    ListItem(Vec<Block>),
    /// Rows of cells of blocks; `None` when the table carries no rows.
    Table(Option<Vec<Vec<Vec<Block>>>>),
    Image { alt_text: Option<String> },
    Video,
    Other(Vec<Block>),
}

fn child_blocks(value: Option<&Value>) -> Option<Vec<Block>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Block::from_value).collect())
}

fn table_rows(table: &Value) -> Option<Vec<Vec<Vec<Block>>>> {
    let rows = table.get("rows")?.as_array()?;
    let rows = rows
        .iter()
        .map(|row| {
            let cells = row.get("cells").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
            cells
                .iter()
                .map(|cell| child_blocks(cell.get("blocks")).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    Some(rows)
}

impl Block {
    /// Reads one block; non-object entries yield `None` and are skipped by callers.
    pub fn from_value(value: &Value) -> Option<Block> {
        let obj = value.as_object()?;
        let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
        let block = match kind {
            "Text" => Block::Text(
                obj.get("text")
                    .and_then(|t| t.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            "Paragraph" => Block::Paragraph(
                child_blocks(obj.get("paragraph").and_then(|p| p.get("blocks"))).unwrap_or_default(),
            ),
            "UnorderedList" | "OrderedList" => {
                Block::List(child_blocks(obj.get("list").and_then(|l| l.get("blocks"))))
            }
            "ListItem" => Block::ListItem(child_blocks(obj.get("blocks")).unwrap_or_default()),
            "Table" => Block::Table(obj.get("table").and_then(table_rows)),
            "Image" => Block::Image {
                alt_text: obj
                    .get("image")
                    .and_then(|i| i.get("properties"))
                    .and_then(|p| p.get("altText"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            },
            "Video" => Block::Video,
            _ => Block::Other(child_blocks(obj.get("blocks")).unwrap_or_default()),
        };
        Some(block)
    }
}

pub fn parse_blocks(value: &Value) -> Vec<Block> {
    child_blocks(Some(value)).unwrap_or_default()
}

/// Renders blocks as plain text: paragraphs separated by blank lines, bullet lists,
/// ` | ` separated table rows and placeholders for media.
pub fn extract_text(blocks: &[Block]) -> String {
    let mut text = String::new();
    for block in blocks {
        match block {
            Block::Text(t) => text.push_str(t),
            Block::Paragraph(children) => {
                let inner = extract_text(children);
                if !inner.trim().is_empty() {
                    text.push_str(&inner);
                    text.push_str("\n\n");
                }
            }
            Block::List(Some(items)) => {
                for item in items {
                    if let Block::ListItem(children) = item {
                        let inner = extract_text(children);
                        if !inner.trim().is_empty() {
                            text.push_str("• ");
                            text.push_str(&inner);
                            text.push('\n');
                        }
                    }
                }
                text.push('\n');
            }
            Block::List(None) | Block::Table(None) => {}
            Block::ListItem(children) => {
                let inner = extract_text(children);
                if !inner.trim().is_empty() {
                    text.push_str(&inner);
                }
            }
            Block::Table(Some(rows)) => {
                for row in rows {
                    let mut row_text = String::new();
                    for cell in row {
                        let cell_text = extract_text(cell);
                        if !cell_text.trim().is_empty() {
                            row_text.push_str(cell_text.trim());
                            row_text.push_str(" | ");
                        }
                    }
                    if !row_text.trim().is_empty() {
                        text.push_str(row_text.trim());
                        text.push('\n');
                    }
                }
                text.push('\n');
            }
            Block::Image { alt_text } => {
                if let Some(alt) = alt_text {
                    text.push_str(&format!("[Image: {alt}]\n"));
                }
            }
            Block::Video => text.push_str("[Video content]\n"),
            Block::Other(children) => text.push_str(&extract_text(children)),
        }
    }
    text
}

/// Combines the text of every document variation in a search response.
pub fn answer_from_search(response: &Value) -> String {
    let Some(results) = response.get("results").and_then(Value::as_array) else {
        warn!("response has no results array");
        return "No results found".to_string();
    };
    info!(results = results.len(), "processing knowledge base results");

    let mut combined = String::new();
    for (index, result) in results.iter().enumerate() {
        let Some(document) = result.get("document") else {
            warn!(index, "result has no document");
            continue;
        };
        let variations = document
            .get("variations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for variation in variations {
            let Some(blocks) = variation.get("body").and_then(|b| b.get("blocks")) else {
                continue;
            };
            let variation_text = extract_text(&parse_blocks(blocks));
            if !variation_text.trim().is_empty() {
                combined.push_str(variation_text.trim());
                combined.push_str("\n\n");
            }
        }
    }

    let combined = combined.trim();
    if !combined.is_empty() {
        return combined.to_string();
    }
    match response
        .get("answerGeneration")
        .and_then(|a| a.get("answer"))
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty())
    {
        Some(generated) => {
            info!("no text in blocks, using generated answer");
            generated.to_string()
        }
        None => NO_CONTENT.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPayload {
    pub query: String,
    pub kb_id: String,
    pub max_articles: i64,
    pub min_confidence: f64,
}

/// Checks required fields and their JSON types, reporting the first violation.
pub fn validate_payload(payload: &Value) -> std::result::Result<SearchPayload, String> {
    for name in ["query", "KBId", "maxArticles", "minConfidence"] {
        if payload.get(name).is_none() {
            return Err(format!("Missing required property: {name}"));
        }
    }
    let string = |name: &str| {
        payload[name]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| format!("Property '{name}' should be a string"))
    };
    let query = string("query")?;
    let kb_id = string("KBId")?;
    let max_articles = match &payload["maxArticles"] {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.as_i64().unwrap_or(i64::MAX),
        Value::Number(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => {
            n.as_f64().unwrap_or_default() as i64
        }
        _ => return Err("Property 'maxArticles' should be an integer".to_string()),
    };
    let min_confidence = payload["minConfidence"]
        .as_f64()
        .ok_or_else(|| "Property 'minConfidence' should be a number".to_string())?;

    Ok(SearchPayload {
        query,
        kb_id,
        max_articles,
        min_confidence,
    })
}

pub async fn search_knowledge_base(
    client: &Client,
    api_base_url: &str,
    access_token: &str,
    payload: &SearchPayload,
) -> Result<Value> {
    let url = format!(
        "{api_base_url}/api/v2/knowledge/knowledgebases/{}/documents/search",
        payload.kb_id
    );
    let body = json!({
        "query": payload.query,
        "pageSize": payload.max_articles,
        "confidenceThreshold": payload.min_confidence,
        "answerMode": ["AnswerHighlight"],
        "queryType": "AutoSearch",
    });
    info!(url = %url, query = %payload.query, "searching knowledge base");
    let request = client
        .post(&url)
        .query(&[("expand", "documentVariations")])
        .bearer_auth(access_token)
        .json(&body);
    let data: Value = http::send_json("knowledge search", request).await?;
    debug!(data = %data, "knowledge search results");
    Ok(data)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeAnswer {
    pub answer: String,
}

impl KnowledgeAnswer {
    fn new(answer: impl Into<String>) -> Self {
        KnowledgeAnswer {
            answer: answer.into(),
        }
    }
}

fn header<'a>(event: &'a Value, name: &str) -> Option<&'a str> {
    event
        .get("headers")
        .and_then(|h| h.get(name))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

async fn search_and_answer(
    settings: &Settings,
    client: &Client,
    domain: &str,
    credentials: &Credentials,
    payload: &SearchPayload,
) -> Result<String> {
    let token = fetch_access_token(client, &settings.genesys_login_url(domain), credentials).await?;
    let results =
        search_knowledge_base(client, &settings.genesys_api_url(domain), &token, payload).await?;

    let empty = results
        .get("results")
        .and_then(Value::as_array)
        .map_or(true, Vec::is_empty);
    if empty {
        warn!(query = %payload.query, "no results for query");
        return Ok(NO_RESULTS.to_string());
    }
    Ok(answer_from_search(&results))
}

/// Answers a knowledge-base question. Every failure is reported inside `answer`.
///
/// The payload is `event.rawRequest` (a JSON string) when non-empty, else the event itself.
/// Credentials and domain come from `event.headers`, falling back to `client_context`.
pub async fn faq_handler(
    settings: &Settings,
    client: &Client,
    event: Value,
    client_context: &HashMap<String, String>,
) -> KnowledgeAnswer {
    let raw_request = event
        .get("rawRequest")
        .and_then(Value::as_str)
        .filter(|raw| !raw.is_empty());
    let payload = match raw_request {
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "rawRequest is not valid JSON");
                return KnowledgeAnswer::new(INVALID_JSON);
            }
        },
        None => event.clone(),
    };

    let payload = match validate_payload(&payload) {
        Ok(p) => p,
        Err(reason) => {
            warn!(reason = %reason, "input validation failed");
            return KnowledgeAnswer::new(format!("Invalid input: {reason}"));
        }
    };

    let from_context = |name: &str| client_context.get(name).map(String::as_str).filter(|s| !s.is_empty());
    let using_headers = header(&event, "gcClientId").is_some() && header(&event, "gcClientSecret").is_some();
    let credentials = Credentials::new(
        header(&event, "gcClientId").or_else(|| from_context("gcClientId")).unwrap_or_default(),
        header(&event, "gcClientSecret")
            .or_else(|| from_context("gcClientSecret"))
            .unwrap_or_default(),
    );
    let source = if using_headers { "headers" } else { "clientContext" };
    info!(source, "resolved credentials");

    let Some(domain) = header(&event, "domain").or_else(|| from_context("domain")) else {
        error!("missing domain in headers or client context");
        return KnowledgeAnswer::new(MISSING_DOMAIN);
    };

    match search_and_answer(settings, client, domain, &credentials, &payload).await {
        Ok(answer) => {
            info!(answer_len = answer.len(), "knowledge answer ready");
            KnowledgeAnswer::new(answer)
        }
        Err(e) => {
            error!(error = %e, "knowledge search failed");
            KnowledgeAnswer::new(INTERNAL_ERROR)
        }
    }
}
