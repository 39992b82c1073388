//! Per-attempt request error, classified before it is turned into a slot failure.

use std::fmt;

/// Error from one attempt of one request.
#[derive(Debug)]
pub enum RequestError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// 2xx response whose body is not JSON.
    Decode(serde_json::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Curl(e) => write!(f, "{}", e),
            RequestError::Http(code) => write!(f, "HTTP {}", code),
            RequestError::Decode(e) => write!(f, "invalid JSON body: {}", e),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Curl(e) => Some(e),
            RequestError::Decode(e) => Some(e),
            RequestError::Http(_) => None,
        }
    }
}

impl From<curl::Error> for RequestError {
    fn from(e: curl::Error) -> Self {
        RequestError::Curl(e)
    }
}
