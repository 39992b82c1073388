//! Sequential blocking GETs, one request at a time.
//!
//! For environments where the concurrent path is unavailable. There is no
//! retry policy and no error accounting: the first failing request surfaces
//! its error directly.

use serde_json::Value;

use crate::executor::{self, RequestSpec};
use crate::retry::RequestError;
use crate::session::Session;

/// GET every URL in order and decode each body as JSON.
pub fn get_all_blocking(session: &Session, urls: &[String]) -> Result<Vec<Value>, RequestError> {
    urls.iter().map(|url| get_one(session, url)).collect()
}

fn get_one(session: &Session, url: &str) -> Result<Value, RequestError> {
    let spec = RequestSpec::get(url);
    let easy = executor::prepare(session, &spec)?;
    let perform = easy.perform();
    let code = easy.response_code().unwrap_or(0);
    let out = executor::complete(perform, code, easy.get_ref());
    if let Err(e) = &out {
        tracing::debug!(url, error = %e, "blocking GET failed");
    }
    out
}
