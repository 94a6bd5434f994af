//! weather.com aggregated-feed client.
//!
//! Fetches the current observation and location point for the configured
//! geocodes in one request, with per-attempt timeouts and exponential backoff.

pub mod retry;
pub mod select;

pub use retry::{fetch_with_retry, RetryPolicy};
pub use select::select_entry;

use common::{CompositeEntry, Error, LoggerConfig, Result};
use serde_json::Value;
use tracing::{debug, warn};

const AGG_PATH: &str = "/v3/aggcommon/v3-location-point;v3-wx-observations-current";

/// Feed client with connection pooling and User-Agent header.
#[derive(Debug, Clone)]
pub struct WuClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    geocodes: String,
    language: String,
    policy: RetryPolicy,
}

impl WuClient {
    pub fn new(cfg: &LoggerConfig, policy: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("wx-logger/0.1")
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            geocodes: cfg.geocodes.join(";"),
            language: cfg.language.clone(),
            policy,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, AGG_PATH)
    }

    /// One GET against the aggregated endpoint. Non-2xx is an error.
    pub async fn fetch_once(&self) -> Result<Value> {
        let url = self.url();
        debug!("Fetching aggregated feed: {} geocodes={}", url, self.geocodes);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("geocodes", self.geocodes.as_str()),
                ("units", "m"),
                ("format", "json"),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| Error::Http(format!("invalid JSON body: {}", e)))
    }

    /// Fetch with retry and decode the entry array.
    pub async fn fetch_entries(&self) -> Result<Vec<CompositeEntry>> {
        let body = fetch_with_retry(&self.policy, "Feed fetch", |_| self.fetch_once()).await?;
        parse_entries(body)
    }
}

/// Decode a response body into entries. The body must be an array; array
/// elements that do not decode are dropped with a warning. An element may
/// spell each sub-record one way only (`v3-location-point` or `location`,
/// `v3-wx-observations-current` or `observation`); carrying both is a
/// duplicate field.
pub fn parse_entries(body: Value) -> Result<Vec<CompositeEntry>> {
    let Value::Array(items) = body else {
        return Err(Error::ResponseShape(format!(
            "expected a JSON array, got {}",
            json_kind(&body)
        )));
    };

    let total = items.len();
    let entries: Vec<CompositeEntry> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<CompositeEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping undecodable feed entry #{}: {}", i, e);
                None
            }
        })
        .collect();

    debug!("Decoded {}/{} feed entries", entries.len(), total);
    Ok(entries)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses` in order, one per connection, and return the base URL.
    async fn serve(responses: Vec<(u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String, max_attempts: u32) -> WuClient {
        let cfg = LoggerConfig {
            api_key: "k".into(),
            base_url,
            ..LoggerConfig::default()
        };
        let mut policy = RetryPolicy::new(max_attempts, Duration::from_secs(5));
        policy.base_delay = Duration::from_millis(10);
        WuClient::new(&cfg, policy).unwrap()
    }

    #[test]
    fn test_parse_entries_rejects_non_array() {
        let err = parse_entries(json!({"errors": []})).unwrap_err();
        assert!(matches!(err, Error::ResponseShape(_)));
    }

    #[test]
    fn test_parse_entries_skips_bad_elements() {
        let body = json!([
            {"id": "a", "observation": {"temperature": 12.0}},
            {"id": "b", "observation": {"temperature": "warm"}},
            "junk",
            {"id": "c"}
        ]);
        let entries = parse_entries(body).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("a"), Some("c")]);
    }

    #[test]
    fn test_parse_entries_drops_element_with_both_spellings() {
        let body = json!([
            {
                "id": "51.50999832,-0.13",
                "location": {"city": "London", "countryCode": "GB"},
                "v3-location-point": {"location": {"city": "London", "countryCode": "GB"}}
            },
            {"id": "48.85,2.35", "observation": {"temperature": 20.0}}
        ]);
        let entries = parse_entries(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("48.85,2.35"));
    }

    #[tokio::test]
    async fn test_fetch_entries_retries_past_server_error() {
        let ok_body = json!([{"id": "51.50999832,-0.13"}]).to_string();
        let base = serve(vec![
            (500, "{\"error\":\"boom\"}".into()),
            (200, ok_body),
        ])
        .await;

        let entries = client_for(base, 3).fetch_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("51.50999832,-0.13"));
    }

    #[tokio::test]
    async fn test_fetch_entries_exhausts_on_persistent_status() {
        let base = serve(vec![
            (401, "denied".into()),
            (401, "denied".into()),
        ])
        .await;

        match client_for(base, 2).fetch_entries().await {
            Err(Error::FetchExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, Error::HttpStatus { status: 401, .. }));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_entries_object_body_is_shape_error() {
        let base = serve(vec![(200, "{\"metadata\":{}}".into())]).await;
        let err = client_for(base, 1).fetch_entries().await.unwrap_err();
        assert!(matches!(err, Error::ResponseShape(_)));
    }
}
