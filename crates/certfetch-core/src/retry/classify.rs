//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::RequestError;
use super::policy::ErrorKind;

/// Classify an HTTP status code. Anything outside 2xx is a server response error.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        200..=299 => ErrorKind::Other,
        _ => ErrorKind::ServerResponse(u16::try_from(code).unwrap_or(u16::MAX)),
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
        || e.is_ssl_connect_error()
    {
        return ErrorKind::Connection;
    }
    // Certificate verification failures and bad options are final.
    ErrorKind::Other
}

/// Classify a request error into an ErrorKind.
pub fn classify(e: &RequestError) -> ErrorKind {
    match e {
        RequestError::Curl(ce) => classify_curl_error(ce),
        RequestError::Http(code) => classify_http_status(*code),
        RequestError::Decode(_) => ErrorKind::Decode,
    }
}
