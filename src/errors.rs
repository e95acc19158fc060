use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure a request can end in. Each kind carries the status it is
/// reported with; `handlers::handle_rejection` is the only place that turns
/// one into a response.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Upstream Authentication Failed")]
    UpstreamAuthFailed { body: String },
    #[error("Upstream Error")]
    Upstream { status: StatusCode, body: String },
    #[error("Internal Server Error")]
    Internal(String),
    #[error("Not Found")]
    NotFound,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UpstreamAuthFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::Upstream { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            Self::UpstreamAuthFailed { body } | Self::Upstream { body, .. } => Some(body),
            Self::Internal(detail) => Some(detail),
            Self::Unauthorized | Self::NotFound => None,
        }
    }

    pub fn envelope(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            details: self.details().map(str::to_string),
        }
    }

    /// Builds the error for a non-success upstream reply.
    pub fn upstream(status: u16, body: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        Self::Upstream { status, body }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl warp::reject::Reject for GatewayError {}

/// JSON envelope written for every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
