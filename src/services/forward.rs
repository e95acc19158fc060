use bytes::Bytes;
use http::{Method, StatusCode};
use reqwest::header::CONTENT_TYPE;
use tracing::warn;

use crate::config::{CLIENT_ID_HEADER, DEFAULT_CONTENT_TYPE};
use crate::errors::GatewayError;
use crate::models::{AppState, ForwardedResponse, InboundRequest, UpstreamRoute};
use crate::services::ensure_token;

/// Relays `inbound` to the upstream path of `route`.
///
/// Only the method, raw query and body cross over; inbound headers are
/// replaced by the bearer token, client id and JSON content type. A success
/// reply comes back untouched, anything else becomes `GatewayError::Upstream`.
pub async fn forward(
    state: &AppState,
    route: UpstreamRoute,
    inbound: &InboundRequest,
) -> Result<ForwardedResponse, GatewayError> {
    let session = ensure_token(state).await?;

    let mut url = format!("{}{}", state.config.upstream_base, route.path());
    if !inbound.query.is_empty() {
        url.push('?');
        url.push_str(&inbound.query);
    }

    let method = reqwest::Method::from_bytes(inbound.method.as_str().as_bytes())
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    let mut request = state
        .client
        .request(method, &url)
        .bearer_auth(&session.token)
        .header(CLIENT_ID_HEADER, &state.config.client_id)
        .header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
    if let Some(body) = outbound_body(inbound) {
        request = request.body(body);
    }

    let response = request.send().await.map_err(|e| {
        warn!(error = %e, ?route, "upstream unreachable");
        GatewayError::from(e)
    })?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let body = response.bytes().await?;

    let status = StatusCode::from_u16(status).map_err(|e| GatewayError::Internal(e.to_string()))?;
    if !status.is_success() {
        warn!(status = status.as_u16(), ?route, "upstream returned an error");
        return Err(GatewayError::Upstream {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(ForwardedResponse {
        status,
        content_type,
        body,
    })
}

fn outbound_body(inbound: &InboundRequest) -> Option<Bytes> {
    if inbound.method == Method::GET || inbound.method == Method::HEAD || inbound.body.is_empty() {
        return None;
    }
    Some(inbound.body.clone())
}
