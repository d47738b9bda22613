//! Configuration module for environment variable parsing.
//!
//! Everything the edge endpoints need is read once at startup and shared
//! through `AppState`.

use std::env;
use std::time::Duration;
use tracing::warn;

/// Official BCV euro rate.
pub const DEFAULT_EUR_API_URL: &str = "https://bcvapi.tech/api/v1/euro/public";

/// Official BCV dollar rate.
pub const DEFAULT_USD_API_URL: &str = "https://bcvapi.tech/api/v1/dolar/public";

/// Parallel market dollar, used as the USDT P2P reference.
pub const DEFAULT_USDT_API_URL: &str = "https://ve.dolarapi.com/v1/dolares/paralelo";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_REPO: &str = "Cjj109/carlosjardim.com";
pub const DEFAULT_DISPATCH_EVENT_TYPE: &str = "hevy-workout";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    // =========================================================================
    // Rate Aggregator
    // =========================================================================

    /// Upstream endpoint for the EUR rate
    pub eur_api_url: String,

    /// Upstream endpoint for the USD rate
    pub usd_api_url: String,

    /// Upstream endpoint for the USDT (parallel) rate
    pub usdt_api_url: String,

    /// Optional timeout applied to every outbound request.
    /// `None` leaves requests unbounded.
    pub upstream_timeout: Option<Duration>,

    // =========================================================================
    // Webhook Relay
    // =========================================================================

    /// GitHub token with repository dispatch permission
    pub github_token: Option<String>,

    /// Repository receiving the dispatch, as `owner/name`
    pub github_repo: String,

    /// Base URL of the GitHub REST API
    pub github_api_url: String,

    /// `event_type` sent with every dispatch
    pub dispatch_event_type: String,

    /// Shared secret expected in the Hevy `Authorization` header
    pub webhook_secret: Option<String>,

    // =========================================================================
    // Admin Login
    // =========================================================================

    pub admin_user: Option<String>,
    pub admin_pass: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_number("PORT").unwrap_or(8080),

            eur_api_url: env::var("BCV_EUR_API_URL")
                .unwrap_or_else(|_| DEFAULT_EUR_API_URL.to_string()),

            usd_api_url: env::var("BCV_USD_API_URL")
                .unwrap_or_else(|_| DEFAULT_USD_API_URL.to_string()),

            usdt_api_url: env::var("BCV_USDT_API_URL")
                .unwrap_or_else(|_| DEFAULT_USDT_API_URL.to_string()),

            upstream_timeout: parse_number("UPSTREAM_TIMEOUT_MS").map(Duration::from_millis),

            github_token: non_empty_var("GITHUB_TOKEN"),

            github_repo: env::var("GITHUB_REPO")
                .unwrap_or_else(|_| DEFAULT_GITHUB_REPO.to_string()),

            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),

            dispatch_event_type: env::var("DISPATCH_EVENT_TYPE")
                .unwrap_or_else(|_| DEFAULT_DISPATCH_EVENT_TYPE.to_string()),

            webhook_secret: non_empty_var("WEBHOOK_SECRET"),

            admin_user: non_empty_var("ADMIN_USER"),

            admin_pass: non_empty_var("ADMIN_PASS"),
        }
    }
}

/// Parse a numeric variable, warning when it is set but malformed.
fn parse_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;

    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            None
        }
    }
}

/// Read a variable, treating an empty value the same as an unset one.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_valid() {
        env::set_var("TEST_EDGE_NUMBER", " 2500 ");
        let result: Option<u64> = parse_number("TEST_EDGE_NUMBER");
        assert_eq!(result, Some(2500));
        env::remove_var("TEST_EDGE_NUMBER");
    }

    #[test]
    fn test_parse_number_malformed() {
        env::set_var("TEST_EDGE_BAD_NUMBER", "soon");
        let result: Option<u16> = parse_number("TEST_EDGE_BAD_NUMBER");
        assert_eq!(result, None);
        env::remove_var("TEST_EDGE_BAD_NUMBER");
    }

    #[test]
    fn test_parse_number_missing() {
        let result: Option<u16> = parse_number("NONEXISTENT_EDGE_VAR");
        assert_eq!(result, None);
    }

    #[test]
    fn test_non_empty_var() {
        env::set_var("TEST_EDGE_EMPTY", "");
        assert_eq!(non_empty_var("TEST_EDGE_EMPTY"), None);
        env::remove_var("TEST_EDGE_EMPTY");

        env::set_var("TEST_EDGE_SECRET", "hunter2");
        assert_eq!(non_empty_var("TEST_EDGE_SECRET"), Some("hunter2".to_string()));
        env::remove_var("TEST_EDGE_SECRET");
    }
}
