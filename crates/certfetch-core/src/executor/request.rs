//! One logical call: URL, method and optional JSON body.

use serde::Serialize;
use serde_json::Value;

use super::Failure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// Immutable description of one request in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    url: String,
    method: Method,
    body: Option<Value>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Serialized request body; empty when there is none.
    pub(crate) fn body_bytes(&self) -> Vec<u8> {
        self.body
            .as_ref()
            .map(|b| b.to_string().into_bytes())
            .unwrap_or_default()
    }

    /// Reject URLs that cannot be dispatched at all (unparsable or not HTTP/HTTPS).
    pub(crate) fn validate(&self) -> Result<(), Failure> {
        let parsed = url::Url::parse(&self.url).map_err(|e| Failure::InvalidUrl {
            message: format!("{}: {}", self.url, e),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Failure::InvalidUrl {
                message: format!("{}: unsupported scheme {:?}", self.url, other),
            }),
        }
    }
}
