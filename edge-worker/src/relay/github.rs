//! GitHub repository dispatch client.
//!
//! Reference: https://docs.github.com/en/rest/repos/repos#create-a-repository-dispatch-event

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    Client,
};
use serde::Serialize;
use tracing::info;

use crate::relay::{DispatchError, Dispatcher};
use crate::Config;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const RELAY_USER_AGENT: &str = "hevy-webhook-worker";

#[derive(Debug, Serialize)]
struct DispatchPayload<'a> {
    event_type: &'a str,
}

/// Triggers `repository_dispatch` on a single repository.
#[derive(Debug, Clone)]
pub struct GitHubDispatcher {
    client: Client,
    endpoint: String,
    token: Option<String>,
    event_type: String,
}

impl GitHubDispatcher {
    pub fn new(
        client: Client,
        api_base: &str,
        repo: &str,
        token: Option<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/repos/{}/dispatches", api_base.trim_end_matches('/'), repo),
            token,
            event_type: event_type.into(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            &config.github_api_url,
            &config.github_repo,
            config.github_token.clone(),
            config.dispatch_event_type.clone(),
        )
    }

    #[cfg(test)]
    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Dispatcher for GitHubDispatcher {
    async fn dispatch(&self) -> Result<(), DispatchError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, RELAY_USER_AGENT)
            .json(&DispatchPayload {
                event_type: &self.event_type,
            });

        // Without a token the request still goes out; GitHub rejects it and
        // the caller logs the failure.
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| DispatchError::Network {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status {
                status_code: status.as_u16(),
                body,
            });
        }

        info!(
            endpoint = %self.endpoint,
            event_type = %self.event_type,
            status_code = status.as_u16(),
            "github_dispatch_sent"
        );

        Ok(())
    }
}
