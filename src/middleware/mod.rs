use http::{header::WWW_AUTHENTICATE, HeaderMap, HeaderValue};
use tracing::info;
use warp::log::{Info, Log};

use crate::config::AUTH_REALM;


/// Adds the Basic challenge so clients know how to retry.
pub fn add_challenge_header(headers: &mut HeaderMap) {
    if let Ok(value) = HeaderValue::from_str(&format!(r#"Basic realm="{}""#, AUTH_REALM)) {
        headers.insert(WWW_AUTHENTICATE, value);
    }
}

/// One access-log line per request. Only the path is logged, never the query
/// or headers.
pub fn request_log() -> Log<impl Fn(Info<'_>) + Copy> {
    warp::log::custom(|info: Info<'_>| {
        info!(
            method = %info.method(),
            path = info.path(),
            status = info.status().as_u16(),
            elapsed_ms = info.elapsed().as_millis() as u64,
            "request"
        );
    })
}
