//! Shared outbound HTTP client.

use std::time::Duration;

use reqwest::Client;

/// User agent for upstream rate requests.
pub const DEFAULT_USER_AGENT: &str = concat!("edge-worker/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by the aggregator and the relay.
///
/// `timeout` of `None` leaves requests unbounded.
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .pool_max_idle_per_host(16);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}
