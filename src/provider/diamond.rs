use super::{ExternalResult, ResultProvider};
use crate::error::{AppError, AppResult};
use crate::ledger::models::Bet;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// HTTP client for the Diamond odds provider. Fixed base URL, API key
/// passed as a query parameter on every call.
pub struct DiamondClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DiamondClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Option<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = match self.client.get(&url).query(query).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "provider request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "provider returned non-OK status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%url, error = %err, "provider returned malformed JSON");
                None
            }
        }
    }
}

#[async_trait]
impl ResultProvider for DiamondClient {
    async fn fetch_casino_result(&self, bet: &Bet) -> AppResult<Option<ExternalResult>> {
        let Some(game_type) = bet.market_id.as_deref() else {
            warn!(bet_id = %bet.id, "casino bet has no game type, skipping");
            return Ok(None);
        };

        // Round-specific lookup first.
        if let Some(mid) = bet.event_id.as_deref() {
            let payload = self
                .get_json(
                    "/casino/detail_result",
                    &[("type", game_type), ("mid", mid), ("key", &self.api_key)],
                )
                .await;
            if let Some(result) = payload.as_ref().and_then(parse_result) {
                return Ok(Some(result));
            }
        }

        // Fall back to the latest declared result for this game type.
        let payload = self
            .get_json("/casino/result", &[("type", game_type), ("key", &self.api_key)])
            .await;

        Ok(payload.as_ref().and_then(parse_result))
    }

    async fn fetch_sports_result(&self, bet: &Bet) -> AppResult<Option<ExternalResult>> {
        let url = format!("{}/get-result", self.base_url);
        let body = serde_json::json!({
            "event_id": bet.event_id,
            "event_name": bet.event_name,
            "market_id": bet.market_id,
            "market_name": bet.market_name,
        });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "provider request failed");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "provider returned non-OK status");
            return Ok(None);
        }

        match response.json::<Value>().await {
            Ok(value) => Ok(parse_result(&value)),
            Err(err) => {
                warn!(%url, error = %err, "provider returned malformed JSON");
                Ok(None)
            }
        }
    }
}

/// Map a provider payload onto `ExternalResult`, tolerating numbers
/// arriving as strings and vice versa. An empty payload maps to None.
fn parse_result(value: &Value) -> Option<ExternalResult> {
    // Some provider endpoints wrap the result in a `data` envelope.
    let value = value.get("data").unwrap_or(value);

    let result = ExternalResult {
        result: field_as_string(value, "result"),
        winner: field_as_string(value, "winner"),
        runs: field_as_decimal(value, "runs"),
        score: field_as_decimal(value, "score"),
    };

    if result.result.is_none()
        && result.winner.is_none()
        && result.runs.is_none()
        && result.score.is_none()
    {
        return None;
    }

    Some(result)
}

fn field_as_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_as_decimal(value: &Value, key: &str) -> Option<Decimal> {
    match value.get(key)? {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_builds_a_client() {
        let client = DiamondClient::new("https://provider.example", "key");
        assert!(client.is_ok());
    }

    #[test]
    fn parses_flat_payload() {
        let value = serde_json::json!({ "winner": "Player A", "runs": 12 });
        let result = parse_result(&value).unwrap();
        assert_eq!(result.winner.as_deref(), Some("Player A"));
        assert_eq!(result.runs, Some(dec!(12)));
    }

    #[test]
    fn parses_data_envelope_and_stringly_numbers() {
        let value = serde_json::json!({ "data": { "result": "9", "score": "141.0" } });
        let result = parse_result(&value).unwrap();
        assert_eq!(result.result.as_deref(), Some("9"));
        assert_eq!(result.score, Some(dec!(141.0)));
    }

    #[test]
    fn empty_payload_is_no_result() {
        assert!(parse_result(&serde_json::json!({})).is_none());
        assert!(parse_result(&serde_json::json!({ "status": "ok" })).is_none());
    }
}
