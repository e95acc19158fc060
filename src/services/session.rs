use std::sync::atomic::Ordering;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::{CLIENT_ID_HEADER, UPSTREAM_LOGIN_PATH};
use crate::errors::GatewayError;
use crate::models::{AppState, CachedToken, SessionCache, UpstreamLoginRequest};

/// Returns a usable upstream token, logging in upstream only when the cached
/// one is missing or has reached the TTL.
///
/// Refreshes are single-flight. Callers that miss the cache queue on the
/// refresh guard; if a refresh completed while they waited they take its
/// outcome, error included, instead of logging in again. Only callers that
/// arrive after a failed refresh finished start a new attempt.
pub async fn ensure_token(state: &AppState) -> Result<CachedToken, GatewayError> {
    let session = &state.session;
    if let Some(token) = fresh_token(session).await {
        return Ok(token);
    }

    let seen = session.refreshes.load(Ordering::Acquire);
    let mut last = session.refresh.lock().await;
    if session.refreshes.load(Ordering::Acquire) != seen {
        if let Some(outcome) = last.as_ref() {
            return outcome.clone();
        }
    }
    if let Some(token) = fresh_token(session).await {
        return Ok(token);
    }

    let outcome = request_upstream_token(state).await.map(CachedToken::new);
    if let Ok(token) = &outcome {
        *session.slot.write().await = Some(token.clone());
        info!("upstream session token refreshed");
    }
    *last = Some(outcome.clone());
    session.refreshes.fetch_add(1, Ordering::Release);
    outcome
}

async fn fresh_token(session: &SessionCache) -> Option<CachedToken> {
    let slot = session.slot.read().await;
    slot.as_ref()
        .filter(|cached| cached.is_fresh(session.ttl, Instant::now()))
        .cloned()
}

async fn request_upstream_token(state: &AppState) -> Result<String, GatewayError> {
    let config = &state.config;
    let url = format!("{}{}", config.upstream_base, UPSTREAM_LOGIN_PATH);

    let response = state
        .client
        .post(&url)
        .header(CLIENT_ID_HEADER, &config.client_id)
        .json(&UpstreamLoginRequest {
            p1: &config.upstream_account.username,
            p2: &config.upstream_account.password,
        })
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "upstream login unreachable");
            GatewayError::from(e)
        })?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "upstream login rejected");
        return Err(GatewayError::upstream(status.as_u16(), body));
    }

    extract_token(&body).ok_or_else(|| {
        warn!("upstream login response carried no token");
        GatewayError::UpstreamAuthFailed { body }
    })
}

/// Pulls `data.patient.currentToken` out of an upstream login reply.
pub(crate) fn extract_token(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/data/patient/currentToken")?
        .as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
