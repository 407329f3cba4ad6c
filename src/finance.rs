//! Present value of the last instalments of a loan, for early settlement.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{AdapterError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnticipationRequest {
    #[serde(default)]
    pub valor_parcela: Value,
    #[serde(default)]
    pub taxa_juros: Value,
    #[serde(default)]
    pub n_parcelas_total: Value,
    #[serde(default)]
    pub n_parcelas_adiantamento: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnticipationResponse {
    pub valor_total_antecipado: f64,
    pub valores_presentes: Vec<f64>,
    pub parcelas_antecipadas: Vec<u32>,
}

/// Upper bound on `nParcelasAdiantamento`, a hundred years of monthly instalments.
pub const MAX_ANTICIPATED: u32 = 1200;

const INVALID_PARAMETERS: &str = "Parâmetros inválidos. Verifique os campos de entrada.";

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Accepts numbers or numeric strings
fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Discounts instalments `total, total-1, ..` (the last `anticipated`), each by its own
/// number of months at `rate`.
pub fn present_values(instalment: f64, rate: f64, total: u32, anticipated: u32) -> Result<AnticipationResponse> {
    if instalment <= 0.0 || rate < 0.0 || total == 0 || anticipated == 0 || anticipated > total {
        return Err(AdapterError::invalid_input(INVALID_PARAMETERS));
    }
    if anticipated > MAX_ANTICIPATED {
        return Err(AdapterError::invalid_input(format!(
            "nParcelasAdiantamento must not exceed {MAX_ANTICIPATED}"
        )));
    }

    let parcelas_antecipadas: Vec<u32> = (0..anticipated).map(|i| total - i).collect();
    let valores_presentes: Vec<f64> = parcelas_antecipadas
        .iter()
        .map(|&k| round_cents(instalment / (1.0 + rate).powf(f64::from(k))))
        .collect();
    let valor_total_antecipado = round_cents(valores_presentes.iter().sum());
    if !valor_total_antecipado.is_finite() {
        return Err(AdapterError::invalid_input(INVALID_PARAMETERS));
    }

    Ok(AnticipationResponse {
        valor_total_antecipado,
        valores_presentes,
        parcelas_antecipadas,
    })
}

pub fn anticipation_handler(request: AnticipationRequest) -> Result<AnticipationResponse> {
    let invalid = || AdapterError::invalid_input(INVALID_PARAMETERS);
    let instalment = as_f64(&request.valor_parcela).ok_or_else(invalid)?;
    let rate = as_f64(&request.taxa_juros).ok_or_else(invalid)?;
    let total = as_count(&request.n_parcelas_total)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(invalid)?;
    let anticipated = as_count(&request.n_parcelas_adiantamento)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(invalid)?;

    let result = present_values(instalment, rate, total, anticipated)?;
    info!(
        total = result.valor_total_antecipado,
        instalments = ?result.parcelas_antecipadas,
        "present value computed"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discounts_last_instalments() {
        let result = present_values(1000.0, 0.02, 12, 3).unwrap();
        assert_eq!(result.parcelas_antecipadas, vec![12, 11, 10]);
        assert_eq!(result.valores_presentes, vec![788.49, 804.26, 820.35]);
        assert_eq!(result.valor_total_antecipado, 2413.1);
    }

    #[test]
    fn zero_rate_keeps_face_value() {
        let result = present_values(250.0, 0.0, 4, 4).unwrap();
        assert_eq!(result.valores_presentes, vec![250.0; 4]);
        assert_eq!(result.valor_total_antecipado, 1000.0);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(present_values(0.0, 0.01, 10, 1).is_err());
        assert!(present_values(100.0, -0.01, 10, 1).is_err());
        assert!(present_values(100.0, 0.01, 10, 11).is_err());
        assert!(present_values(100.0, 0.01, 10, 0).is_err());
    }

    #[test]
    fn far_instalment_discounts_to_zero() {
        let result = present_values(1000.0, 0.02, 2_147_483_648, 1).unwrap();
        assert_eq!(result.valores_presentes, vec![0.0]);
        assert_eq!(result.valor_total_antecipado, 0.0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valoresPresentes"], json!([0.0]));
        assert_eq!(json["valorTotalAntecipado"], json!(0.0));
    }

    #[test]
    fn anticipated_count_is_capped() {
        assert!(present_values(10.0, 0.01, u32::MAX, MAX_ANTICIPATED).is_ok());
        let err = present_values(10.0, 0.01, u32::MAX, MAX_ANTICIPATED + 1).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(ref m) if m.contains("1200")));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        assert!(present_values(f64::MAX, 0.0, 4, 4).is_err());
    }

    #[test]
    fn handler_accepts_numeric_strings() {
        let request: AnticipationRequest = serde_json::from_value(json!({
            "valorParcela": "1000",
            "taxaJuros": "0.02",
            "nParcelasTotal": 12,
            "nParcelasAdiantamento": "3"
        }))
        .unwrap();
        let result = anticipation_handler(request).unwrap();
        assert_eq!(result.valor_total_antecipado, 2413.1);
    }

    #[test]
    fn handler_rejects_missing_and_negative_counts() {
        let missing = AnticipationRequest {
            valor_parcela: json!(100),
            taxa_juros: json!(0.01),
            n_parcelas_total: json!(10),
            ..Default::default()
        };
        assert!(matches!(anticipation_handler(missing), Err(AdapterError::InvalidInput(_))));

        let negative = AnticipationRequest {
            valor_parcela: json!(100),
            taxa_juros: json!(0.01),
            n_parcelas_total: json!(-10),
            n_parcelas_adiantamento: json!(1),
        };
        assert!(anticipation_handler(negative).is_err());
    }

    #[test]
    fn response_uses_platform_field_names() {
        let json = serde_json::to_value(present_values(100.0, 0.0, 1, 1).unwrap()).unwrap();
        assert_eq!(
            json,
            json!({"valorTotalAntecipado": 100.0, "valoresPresentes": [100.0], "parcelasAntecipadas": [1]})
        );
    }
}
