//! HTTP endpoint handlers.
//!
//! - `/api/bcv`: aggregated exchange rates, cacheable for 5 minutes
//! - `/webhooks/hevy`: Hevy webhook relayed to GitHub repository dispatch
//! - `/api/admin/login`: credential check for the admin panel

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::rates::{cache_control_header, get_aggregated_rates, RateSources};
use crate::relay::{GitHubDispatcher, SharedDispatcher};
use crate::web::auth::{constant_time_eq, credentials_match, is_secret_configured};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: Client,
    pub dispatcher: SharedDispatcher,
}

impl AppState {
    /// State wired to the real GitHub dispatcher.
    pub fn new(config: Config, http: Client) -> Self {
        let dispatcher = Arc::new(GitHubDispatcher::from_config(http.clone(), &config));
        Self::with_dispatcher(config, http, dispatcher)
    }

    pub fn with_dispatcher(config: Config, http: Client, dispatcher: SharedDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            http,
            dispatcher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// BCV Rates
// =============================================================================

/// Error body for handler-level failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

/// Aggregated rates endpoint.
///
/// Always 200 unless aggregation fails before reaching the upstreams.
pub async fn bcv_rates(State(state): State<AppState>) -> Response {
    let sources = RateSources::from_config(&state.config);

    match get_aggregated_rates(&state.http, &sources).await {
        Ok(rates) => {
            info!(
                has_eur = rates.eur.is_some(),
                has_usd = rates.usd.is_some(),
                has_usdt = rates.usdt.is_some(),
                "bcv_rates_served"
            );

            (
                StatusCode::OK,
                [(header::CACHE_CONTROL, cache_control_header())],
                Json(rates),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "bcv_rates_failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch rates",
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Hevy Webhook
// =============================================================================

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub ok: bool,
}

/// Hevy webhook endpoint.
///
/// This endpoint:
/// 1. Rejects anything but POST
/// 2. Checks the `Authorization` header against the shared secret (if configured)
/// 3. Triggers the GitHub workflow and waits for the attempt to settle
/// 4. Returns 200 whether or not the dispatch succeeded
///
/// Hevy expects an answer within 5 seconds. The dispatch is awaited inline,
/// so a slow GitHub API can push the response past that budget.
pub async fn hevy_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if method != Method::POST {
        warn!(method = %method, "hevy_method_not_allowed");
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    let auth_header = headers.get(header::AUTHORIZATION).map(|v| v.as_bytes());

    if is_secret_configured(&state.config.webhook_secret) {
        let expected = state.config.webhook_secret.as_deref().unwrap_or_default();
        let provided = auth_header.unwrap_or_default();

        if !constant_time_eq(provided, expected.as_bytes()) {
            warn!(has_auth_header = auth_header.is_some(), "hevy_auth_invalid");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    }

    info!("hevy_webhook_received");

    // Failures are absorbed so Hevy does not disable the webhook.
    match state.dispatcher.dispatch().await {
        Ok(()) => info!("hevy_dispatch_complete"),
        Err(e) => error!(error = %e, "hevy_dispatch_failed"),
    }

    (StatusCode::OK, Json(RelayResponse { ok: true })).into_response()
}

// =============================================================================
// Admin Login
// =============================================================================

/// Login result.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl LoginResponse {
    fn failure(status: StatusCode, error: &'static str) -> Response {
        (
            status,
            Json(LoginResponse {
                ok: false,
                error: Some(error),
            }),
        )
            .into_response()
    }
}

/// Admin login endpoint.
///
/// Expects a JSON body `{"user": ..., "pass": ...}`. No session is issued;
/// the panel only needs a yes/no answer.
pub async fn admin_login(State(state): State<AppState>, body: Bytes) -> Response {
    let (expected_user, expected_pass) = match (
        state.config.admin_user.as_deref().filter(|u| !u.is_empty()),
        state.config.admin_pass.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(user), Some(pass)) => (user, pass),
        _ => {
            error!("admin_login_not_configured");
            return LoginResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Admin not configured",
            );
        }
    };

    let request: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "admin_login_invalid_body");
            return LoginResponse::failure(StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    let user = request.get("user").and_then(Value::as_str);
    let pass = request.get("pass").and_then(Value::as_str);

    if credentials_match(expected_user, expected_pass, user, pass) {
        info!("admin_login_succeeded");
        return (
            StatusCode::OK,
            Json(LoginResponse {
                ok: true,
                error: None,
            }),
        )
            .into_response();
    }

    warn!(has_user = user.is_some(), "admin_login_rejected");
    LoginResponse::failure(StatusCode::UNAUTHORIZED, "Credenciales incorrectas")
}
