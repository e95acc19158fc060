use clap::Parser;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UPSTREAM_BASE: &str = "https://api.clinicaldata.example";
pub const UPSTREAM_LOGIN_PATH: &str = "/api/patient/login";
pub const UPSTREAM_DOWNLOAD_HISTORY_PATH: &str = "/api/report/download-history";
pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const TOKEN_TTL_SECS: u64 = 25 * 60;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const AUTH_REALM: &str = "Reporting";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

pub fn token_ttl() -> Duration {
    Duration::from_secs(TOKEN_TTL_SECS)
}

/// Command line and environment options for the gateway.
#[derive(Parser, Debug)]
#[command(name = "reporting-gateway", version, about = "Reporting dashboard backend")]
pub struct Args {
    #[arg(
        short = 'b',
        long,
        env = "REPORTING_BIND",
        default_value = "127.0.0.1",
        help = "Bind address"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "REPORTING_PORT",
        default_value_t = 3030,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "UPSTREAM_BASE_URL",
        default_value = DEFAULT_UPSTREAM_BASE,
        help = "Base URL of the upstream clinical-data API"
    )]
    pub upstream_base_url: String,
    #[arg(long, env = "UPSTREAM_USERNAME", hide_env_values = true)]
    pub upstream_username: Option<String>,
    #[arg(long, env = "UPSTREAM_PASSWORD", hide_env_values = true)]
    pub upstream_password: Option<String>,
    #[arg(long, env = "UPSTREAM_CLIENT_ID", hide_env_values = true)]
    pub upstream_client_id: Option<String>,
    #[arg(long, env = "REPORTING_USERNAME", hide_env_values = true)]
    pub reporting_username: Option<String>,
    #[arg(long, env = "REPORTING_PASSWORD", hide_env_values = true)]
    pub reporting_password: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid bind address {0}")]
    InvalidBind(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated, immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_base: String,
    pub upstream_account: Credentials,
    pub client_id: String,
    pub caller: Credentials,
}

impl Config {
    /// Checks that every required value is present and non-empty, reporting
    /// all missing names at once.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |value: &Option<String>, name: &'static str| -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v.clone(),
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let upstream_username = require(&args.upstream_username, "UPSTREAM_USERNAME");
        let upstream_password = require(&args.upstream_password, "UPSTREAM_PASSWORD");
        let client_id = require(&args.upstream_client_id, "UPSTREAM_CLIENT_ID");
        let caller_username = require(&args.reporting_username, "REPORTING_USERNAME");
        let caller_password = require(&args.reporting_password, "REPORTING_PASSWORD");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            upstream_base: args.upstream_base_url.trim_end_matches('/').to_string(),
            upstream_account: Credentials {
                username: upstream_username,
                password: upstream_password,
            },
            client_id,
            caller: Credentials {
                username: caller_username,
                password: caller_password,
            },
        })
    }
}
