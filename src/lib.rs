pub mod config;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;

#[cfg(test)]
mod tests;

pub use errors::{ErrorBody, GatewayError};
pub use models::{AppState, CachedToken, SessionCache};
