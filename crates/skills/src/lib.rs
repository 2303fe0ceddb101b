#![deny(unused_must_use)]
//! Structured-data lookup tool ("tool 3"): a webhook call not on
//! the hot path of `handle_turn`'s DOMAIN_QUERY branch, which is
//! retrieval-only, but exposed here as a capability the controller crate
//! can invoke when a future tool-calling branch needs it.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct LookupRequest<'a> {
    lookup_type: &'a str,
    identifier: &'a str,
}

pub struct StructuredDataLookup {
    http_client: reqwest::Client,
}

impl Default for StructuredDataLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredDataLookup {
    pub fn new() -> Self {
        Self { http_client: reqwest::Client::new() }
    }

    /// Returns the model-facing string contract verbatim: `LOOKUP_RESULT:
    /// <json>` on success, `LOOKUP_FAILED: <detail>` on any request or
    /// parse failure, `LOOKUP_UNAVAILABLE: ...` when no webhook is
    /// configured for the tenant.
    pub async fn lookup(&self, webhook_url: Option<&str>, lookup_type: &str, identifier: &str) -> String {
        let Some(url) = webhook_url else {
            return "LOOKUP_UNAVAILABLE: no structured-data webhook configured for this tenant".to_string();
        };

        let body = LookupRequest { lookup_type, identifier };
        match self.http_client.post(url).timeout(LOOKUP_TIMEOUT).json(&body).send().await {
            Ok(response) if response.status().is_success() => match response.json::<Value>().await {
                Ok(value) => format_result(&value),
                Err(err) => format!("LOOKUP_FAILED: response was not valid json: {err}"),
            },
            Ok(response) => format!("LOOKUP_FAILED: webhook returned status {}", response.status()),
            Err(err) => format!("LOOKUP_FAILED: {err}"),
        }
    }
}

fn format_result(value: &Value) -> String {
    format!("LOOKUP_RESULT: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_result_wraps_value_verbatim() {
        let value = serde_json::json!({"balance": 42});
        assert_eq!(format_result(&value), "LOOKUP_RESULT: {\"balance\":42}");
    }

    #[tokio::test]
    async fn missing_webhook_is_unavailable_not_failed() {
        let tool = StructuredDataLookup::new();
        let result = tool.lookup(None, "account", "acct_123").await;
        assert!(result.starts_with("LOOKUP_UNAVAILABLE:"));
    }
}
