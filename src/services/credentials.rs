use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::{header::AUTHORIZATION, HeaderMap};
use tracing::warn;

use crate::config::Credentials;
use crate::errors::GatewayError;

/// Checks the `Authorization: Basic` header against the expected pair.
/// Every kind of failure collapses into `GatewayError::Unauthorized`.
pub fn authenticate(headers: &HeaderMap, expected: &Credentials) -> Result<(), GatewayError> {
    match submitted_credentials(headers) {
        Ok(submitted) if submitted == *expected => Ok(()),
        Ok(submitted) => {
            warn!(username = %submitted.username, "rejected caller credentials");
            Err(GatewayError::Unauthorized)
        }
        Err(reason) => {
            warn!(reason, "rejected caller credentials");
            Err(GatewayError::Unauthorized)
        }
    }
}

fn submitted_credentials(headers: &HeaderMap) -> Result<Credentials, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("missing authorization header")?
        .to_str()
        .map_err(|_| "unreadable authorization header")?;

    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or("malformed authorization header")?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err("unsupported authorization scheme");
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| "invalid base64 credentials")?;
    let decoded = String::from_utf8(decoded).map_err(|_| "credentials are not utf-8")?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or("credentials missing separator")?;

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
