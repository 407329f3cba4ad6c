//! Scripted demo functions for utility customer-service flows.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AdapterError, Result};

pub const OUTAGE_REPORTED: &str = "Even digit detected — power outage reported.";
pub const NO_OUTAGE: &str = "Odd digit detected — no power outage.";

#[derive(Debug, Default, Deserialize)]
pub struct CustomerRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageStatus {
    pub has_power_outage: bool,
    pub reason: String,
    pub original_customer_id: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct RepairEstimate {
    pub previsao: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRequest {
    #[serde(default)]
    pub input_string: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub article_text: String,
    pub article_id: u32,
}

#[derive(Debug, Serialize)]
pub struct Ticket {
    pub ticket_number: String,
}

fn last_digit(value: &str) -> Option<u32> {
    value.chars().last().and_then(|c| c.to_digit(10))
}

/// Even final digit means an outage is reported.
pub fn check_outage(request: CustomerRequest) -> Result<OutageStatus> {
    let customer_id = request
        .customer_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AdapterError::invalid_input("Invalid or missing 'customer_id'"))?;
    let digit = last_digit(customer_id.trim()).ok_or_else(|| {
        AdapterError::invalid_input("The last character of customer_id must be a digit.")
    })?;

    let has_power_outage = digit % 2 == 0;
    let reason = if has_power_outage { OUTAGE_REPORTED } else { NO_OUTAGE };
    info!(has_power_outage, "outage status computed");
    Ok(OutageStatus {
        has_power_outage,
        reason: reason.to_string(),
        original_customer_id: request.customer_id.clone(),
    })
}

/// Hours until power returns, read from the final digit.
pub fn repair_estimate(request: CustomerRequest) -> Result<RepairEstimate> {
    let customer_id = request
        .customer_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AdapterError::invalid_input("Parâmetro 'customer_id' inválido ou ausente."))?;
    let previsao = last_digit(customer_id).ok_or_else(|| {
        AdapterError::invalid_input("O último caractere de 'customer_id' não é um número válido.")
    })?;
    Ok(RepairEstimate { previsao })
}

pub fn fetch_article(request: ArticleRequest) -> Result<Article> {
    let text = request
        .input_string
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdapterError::invalid_input("Parâmetro 'inputString' é obrigatório e deve ser uma string."))?;
    Ok(Article {
        article_text: text,
        article_id: rand::thread_rng().gen_range(0..1_000_000),
    })
}

pub fn open_ticket() -> Ticket {
    let ticket = Ticket {
        ticket_number: format!("{:05}", rand::thread_rng().gen_range(0..100_000)),
    };
    info!(ticket = %ticket.ticket_number, "ticket opened");
    ticket
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str) -> CustomerRequest {
        CustomerRequest {
            customer_id: Some(id.to_string()),
        }
    }

    #[test]
    fn outage_follows_last_digit_parity() {
        let even = check_outage(customer("ABC-1234 ")).unwrap();
        assert!(even.has_power_outage);
        assert_eq!(even.reason, "Even digit detected — power outage reported.");
        assert_eq!(even.original_customer_id.as_deref(), Some("ABC-1234 "));

        let odd = check_outage(customer("777")).unwrap();
        assert!(!odd.has_power_outage);
        assert_eq!(odd.reason, "Odd digit detected — no power outage.");
    }

    #[test]
    fn outage_requires_trailing_digit() {
        assert!(check_outage(customer("12a")).is_err());
        assert!(check_outage(CustomerRequest::default()).is_err());
    }

    #[test]
    fn repair_estimate_is_last_digit() {
        assert_eq!(repair_estimate(customer("cli-48")).unwrap(), RepairEstimate { previsao: 8 });
        assert!(repair_estimate(customer("48 ")).is_err());
    }

    #[test]
    fn article_echoes_text_with_bounded_id() {
        let article = fetch_article(ArticleRequest {
            input_string: Some("Como religar a energia".into()),
        })
        .unwrap();
        assert_eq!(article.article_text, "Como religar a energia");
        assert!(article.article_id < 1_000_000);
        assert!(fetch_article(ArticleRequest::default()).is_err());
    }

    #[test]
    fn ticket_has_five_digits() {
        for _ in 0..20 {
            let ticket = open_ticket();
            assert_eq!(ticket.ticket_number.len(), 5);
            assert!(ticket.ticket_number.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
