use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::config::{Config, Credentials};
use crate::models::AppState;



pub(crate) const CALLER_USER: &str = "staff";
pub(crate) const CALLER_PASS: &str = "s3cret:with-colon";
pub(crate) const CLIENT_ID: &str = "reporting-client";

pub(crate) fn test_config(upstream_base: &str) -> Config {
    Config {
        upstream_base: upstream_base.to_string(),
        upstream_account: Credentials {
            username: "svc-account".into(),
            password: "svc-password".into(),
        },
        client_id: CLIENT_ID.into(),
        caller: Credentials {
            username: CALLER_USER.into(),
            password: CALLER_PASS.into(),
        },
    }
}

pub(crate) fn test_state(upstream_base: &str) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(upstream_base)).unwrap())
}

pub(crate) fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

pub(crate) fn caller_auth() -> String {
    basic(CALLER_USER, CALLER_PASS)
}
