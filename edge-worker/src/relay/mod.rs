//! Hevy webhook relay.
//!
//! A workout logged in Hevy triggers the site's GitHub Actions workflow via
//! repository dispatch. The `Dispatcher` trait is the seam between the
//! webhook handler and the outbound call.

pub mod github;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use github::GitHubDispatcher;

/// Failure of a single dispatch attempt.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("GitHub API error {status_code}: {body}")]
    Status { status_code: u16, body: String },
}

/// Sends one trigger to the downstream automation API.
///
/// Implementations make exactly one attempt per call and never retry.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self) -> Result<(), DispatchError>;
}

pub type SharedDispatcher = Arc<dyn Dispatcher>;
