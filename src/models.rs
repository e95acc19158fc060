use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::config::{self, Config, REQUEST_TIMEOUT_SECS};
use crate::errors::GatewayError;

/// Upstream session token together with the moment it was obtained.
/// `fetched_at` is wall-clock time for callers; age is measured on the
/// monotonic `obtained` instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    pub token: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    #[serde(skip, default = "Instant::now")]
    pub obtained: Instant,
}

impl CachedToken {
    pub fn new(token: String) -> Self {
        Self {
            token,
            fetched_at: Utc::now(),
            obtained: Instant::now(),
        }
    }

    /// Fresh while strictly younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.obtained) < ttl
    }
}

/// Result of the most recent upstream refresh, kept so callers that queued
/// behind it get the same answer instead of logging in again.
pub type RefreshOutcome = Result<CachedToken, GatewayError>;

/// Single-slot upstream token cache. Starts empty, is populated by the first
/// successful upstream login and overwritten on every refresh afterwards.
/// Each process owns its own cache.
#[derive(Debug)]
pub struct SessionCache {
    pub slot: RwLock<Option<CachedToken>>,
    /// Refresh guard holding the last outcome.
    pub refresh: Mutex<Option<RefreshOutcome>>,
    /// Completed refreshes; bumped while `refresh` is held.
    pub refreshes: AtomicU64,
    pub ttl: Duration,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            refresh: Mutex::new(None),
            refreshes: AtomicU64::new(0),
            ttl,
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(config::token_ttl())
    }
}

pub struct AppState {
    pub config: Config,
    pub session: SessionCache,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            config,
            session: SessionCache::default(),
            client,
        })
    }
}

/// Logical routes that are relayed to upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamRoute {
    DownloadHistory,
}

impl UpstreamRoute {
    pub fn path(self) -> &'static str {
        match self {
            Self::DownloadHistory => config::UPSTREAM_DOWNLOAD_HISTORY_PATH,
        }
    }
}

/// The parts of an inbound request the forwarder is allowed to see.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: http::Method,
    pub query: String,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, Serialize)]
pub struct UpstreamLoginRequest<'a> {
    pub p1: &'a str,
    pub p2: &'a str,
}

/// Envelope the upstream wraps download history in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadHistoryEnvelope {
    pub code: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<Vec<DownloadHistoryRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadHistoryRecord {
    pub report_name: Option<String>,
    pub downloaded_by: Option<String>,
    pub downloaded_at: Option<String>,
    pub file_path: Option<String>,
}

impl DownloadHistoryRecord {
    /// Display cells in column order: report, downloaded by, downloaded at,
    /// file path.
    pub fn display_row(&self) -> [String; 4] {
        let cell = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        let downloaded_at = match self.downloaded_at.as_deref() {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|at| at.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| raw.to_string()),
            None => "-".to_string(),
        };
        [
            cell(&self.report_name),
            cell(&self.downloaded_by),
            downloaded_at,
            cell(&self.file_path),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_boundary() {
        let ttl = Duration::from_secs(60);
        let token = CachedToken::new("t".into());

        assert!(token.is_fresh(ttl, token.obtained + Duration::from_secs(59)));
        assert!(!token.is_fresh(ttl, token.obtained + Duration::from_secs(60)));
    }

    #[test]
    fn test_freshness_ignores_wall_clock() {
        let ttl = Duration::from_secs(60);
        let mut token = CachedToken::new("t".into());
        // wall clock stepped backwards after the fetch
        token.fetched_at = Utc::now() + chrono::Duration::hours(2);

        assert!(!token.is_fresh(ttl, token.obtained + ttl));
        assert!(token.is_fresh(ttl, token.obtained));
    }

    #[test]
    fn test_cached_token_serializes_fetched_at_as_millis() {
        let token = CachedToken {
            token: "abc".into(),
            fetched_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            obtained: Instant::now(),
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["fetchedAt"], 1_700_000_000_123i64);
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_display_row_formats_timestamp_and_blanks() {
        let record = DownloadHistoryRecord {
            report_name: Some("R1".into()),
            downloaded_by: None,
            downloaded_at: Some("2024-01-01T09:30:00+02:00".into()),
            file_path: Some("/r1.pdf".into()),
        };
        assert_eq!(
            record.display_row(),
            ["R1", "-", "2024-01-01 07:30", "/r1.pdf"].map(String::from)
        );

        let odd = DownloadHistoryRecord {
            downloaded_at: Some("yesterday".into()),
            ..record
        };
        assert_eq!(odd.display_row()[2], "yesterday");
    }
}
