//! HTTP retrieval for sources and the list-of-records response contract.

use crate::error::{SourceError, TransportError};
use crate::record::RawRecord;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Sent as `X-API-Key`; header names are case-insensitive and stored lowercase.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Characters of body kept in fetch diagnostics.
const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Something that can issue `GET <url>` and hand back status and body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone)]
pub struct TransportSettings {
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for TransportSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            api_key: None,
            timeout: Duration::from_secs(10),
            user_agent: format!("inventory/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = settings.api_key.as_deref() {
            let mut v = HeaderValue::from_str(key)
                .map_err(|_| TransportError("API key is not a valid header value".into()))?;
            v.set_sensitive(true);
            headers.insert(API_KEY_HEADER, v);
        }
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .gzip(true)
            .build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Answers every request with the same response. Handy for tests and offline fixtures.
#[derive(Debug, Clone)]
pub struct CannedTransport {
    response: Result<HttpResponse, String>,
}

impl CannedTransport {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        CannedTransport { response: Ok(HttpResponse { status, body: body.into() }) }
    }

    /// Fail every request without a response, like a refused connection.
    pub fn unreachable(message: impl Into<String>) -> Self {
        CannedTransport { response: Err(message.into()) }
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        self.response.clone().map_err(TransportError)
    }
}

/// Check a response against the list-of-objects contract and split it into records.
pub fn parse_records(source_name: &str, response: HttpResponse) -> Result<Vec<RawRecord>, SourceError> {
    if response.status != 200 {
        return Err(SourceError::Fetch {
            source_name: source_name.to_string(),
            status: response.status,
            excerpt: response.body.chars().take(EXCERPT_CHARS).collect(),
        });
    }
    let schema = |detail: String| SourceError::Schema { source_name: source_name.to_string(), detail };
    let data: Value = serde_json::from_str(&response.body).map_err(|e| schema(format!("invalid JSON: {e}")))?;
    let items = match data {
        Value::Array(items) => items,
        other => return Err(schema(format!("expected a list, got {}", type_name(&other)))),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(schema(format!("record {i} is {}, not an object", type_name(&other)))),
        })
        .collect()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
