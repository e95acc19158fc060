use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap, Method, Response};
use hyper::Body;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, warn};
use warp::{Filter, Rejection, Reply};

use crate::errors::GatewayError;
use crate::middleware::{add_challenge_header, request_log};
use crate::models::{AppState, ForwardedResponse, InboundRequest, UpstreamRoute};
use crate::services::{authenticate, ensure_token, forward};


const UNHANDLED_REJECTION: &str = "request could not be processed";

/// The full inbound surface: the two guarded routes, the central error
/// translator and the access log. Any other path ends in a 404 envelope.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let login_route = warp::path!("api" / "auth" / "login")
        .and(warp::header::headers_cloned())
        .and(with_state(state.clone()))
        .and_then(login);

    let history_route = warp::path!("api" / "report" / "download-history")
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(warp::query::raw().or_else(|_| async { Ok::<(String,), Infallible>((String::new(),)) }))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(download_history);

    login_route
        .or(history_route)
        .recover(handle_rejection)
        .with(request_log())
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn login(headers: HeaderMap, state: Arc<AppState>) -> Result<Response<Body>, Rejection> {
    authenticate(&headers, &state.config.caller).map_err(warp::reject::custom)?;
    let session = ensure_token(&state).await.map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&session).into_response())
}

async fn download_history(
    method: Method,
    headers: HeaderMap,
    query: String,
    body: Bytes,
    state: Arc<AppState>,
) -> Result<Response<Body>, Rejection> {
    authenticate(&headers, &state.config.caller).map_err(warp::reject::custom)?;

    let inbound = InboundRequest {
        method,
        query,
        body,
    };
    let forwarded = forward(&state, UpstreamRoute::DownloadHistory, &inbound)
        .await
        .map_err(warp::reject::custom)?;
    relay(forwarded).map_err(warp::reject::custom)
}

fn relay(forwarded: ForwardedResponse) -> Result<Response<Body>, GatewayError> {
    Response::builder()
        .status(forwarded.status)
        .header(CONTENT_TYPE, forwarded.content_type)
        .body(Body::from(forwarded.body))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

/// Central translator from failures to the `{error, details}` envelope.
pub async fn handle_rejection(err: Rejection) -> Result<Response<Body>, Infallible> {
    let response = if let Some(e) = err.find::<GatewayError>() {
        error_reply(e)
    } else if err.is_not_found() {
        error_reply(&GatewayError::NotFound)
    } else {
        warn!(rejection = ?err, "unhandled rejection");
        error_reply(&GatewayError::Internal(UNHANDLED_REJECTION.to_string()))
    };
    Ok(response)
}

pub fn error_reply(error: &GatewayError) -> Response<Body> {
    let status = error.status();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %error, "request failed");
    }

    let mut response = warp::reply::with_status(warp::reply::json(&error.envelope()), status)
        .into_response();
    if matches!(error, GatewayError::Unauthorized) {
        add_challenge_header(response.headers_mut());
    }
    response
}
