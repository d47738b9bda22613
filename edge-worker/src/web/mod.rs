//! Web server module for the edge endpoints.
//!
//! This module provides:
//! - The rates endpoint consumed by the calculator widget
//! - The Hevy webhook relay
//! - The admin login check

pub mod auth;
pub mod handlers;

use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use auth::{constant_time_eq, credentials_match, is_secret_configured};
pub use handlers::{
    admin_login, bcv_rates, health, hevy_webhook, AppState, ErrorResponse, HealthResponse,
    LoginResponse, RelayResponse,
};

/// Build the router with all routes.
///
/// The webhook route accepts any method so the handler can answer non-POST
/// requests with its own 405 body.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/bcv", get(bcv_rates))
        .route("/webhooks/hevy", any(hevy_webhook))
        .route("/api/admin/login", post(admin_login))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use reqwest::Client;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::relay::{DispatchError, Dispatcher};
    use crate::Config;

    /// Dispatcher that records calls instead of reaching GitHub.
    struct CountingDispatcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingDispatcher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Dispatcher for CountingDispatcher {
        async fn dispatch(&self) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DispatchError::Status {
                    status_code: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    fn test_config(upstream: &str) -> Config {
        Config {
            port: 0,
            eur_api_url: format!("{}/euro", upstream),
            usd_api_url: format!("{}/dolar", upstream),
            usdt_api_url: format!("{}/paralelo", upstream),
            upstream_timeout: None,
            github_token: Some("ghp_test".to_string()),
            github_repo: "owner/site".to_string(),
            github_api_url: upstream.to_string(),
            dispatch_event_type: "hevy-workout".to_string(),
            webhook_secret: None,
            admin_user: Some("carlos".to_string()),
            admin_pass: Some("pw".to_string()),
        }
    }

    fn app_with(config: Config, dispatcher: Arc<CountingDispatcher>) -> Router {
        router(AppState::with_dispatcher(config, Client::new(), dispatcher))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn webhook_request(method: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/webhooks/hevy");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(r#"{"workoutId":"abc"}"#)).unwrap()
    }

    fn login_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    // =========================================================================
    // Health
    // =========================================================================

    #[tokio::test]
    async fn test_health() {
        let app = app_with(test_config("http://127.0.0.1:9"), CountingDispatcher::new(false));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    // =========================================================================
    // Hevy Webhook
    // =========================================================================

    #[tokio::test]
    async fn test_webhook_rejects_get_without_dispatching() {
        let dispatcher = CountingDispatcher::new(false);
        let app = app_with(test_config("http://127.0.0.1:9"), dispatcher.clone());

        let response = app.oneshot(webhook_request("GET", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "Method not allowed");
        assert_eq!(dispatcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_secret_without_dispatching() {
        let dispatcher = CountingDispatcher::new(false);
        let mut config = test_config("http://127.0.0.1:9");
        config.webhook_secret = Some("s3cret".to_string());
        let app = app_with(config, dispatcher.clone());

        let response = app
            .clone()
            .oneshot(webhook_request("POST", Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "Unauthorized");

        let response = app.oneshot(webhook_request("POST", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(dispatcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_webhook_accepts_matching_secret() {
        let dispatcher = CountingDispatcher::new(false);
        let mut config = test_config("http://127.0.0.1:9");
        config.webhook_secret = Some("s3cret".to_string());
        let app = app_with(config, dispatcher.clone());

        let response = app
            .oneshot(webhook_request("POST", Some("s3cret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
        assert_eq!(dispatcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_webhook_without_secret_always_forwards() {
        let dispatcher = CountingDispatcher::new(false);
        let app = app_with(test_config("http://127.0.0.1:9"), dispatcher.clone());

        for auth in [None, Some(""), Some("anything")] {
            let response = app
                .clone()
                .oneshot(webhook_request("POST", auth))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(dispatcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_webhook_absorbs_dispatch_failure() {
        let dispatcher = CountingDispatcher::new(true);
        let app = app_with(test_config("http://127.0.0.1:9"), dispatcher.clone());

        let response = app.oneshot(webhook_request("POST", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
        assert_eq!(dispatcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_webhook_relays_to_github() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/site/dispatches"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Unprocessable"))
            .expect(1)
            .mount(&server)
            .await;

        let app = router(AppState::new(test_config(&server.uri()), Client::new()));

        let response = app.oneshot(webhook_request("POST", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    // =========================================================================
    // BCV Rates
    // =========================================================================

    #[tokio::test]
    async fn test_bcv_rates_all_sources_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/euro"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"tasa": "108.5", "fecha": "2025-01-10"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dolar"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"tasa": "abc", "fecha": "2025-01-10"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/paralelo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promedio": 215.3,
                "fechaActualizacion": "2025-01-10T14:00:00Z"
            })))
            .mount(&server)
            .await;

        let app = app_with(test_config(&server.uri()), CountingDispatcher::new(false));

        let response = app
            .oneshot(Request::get("/api/bcv").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=300, s-maxage=300, stale-while-revalidate=60"
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = body_json(response).await;
        assert!(body["last_updated"].is_string());
        assert_eq!(
            body["eur"],
            json!({"rate": 108.5, "date": "2025-01-10", "symbol": "€"})
        );
        assert_eq!(body["usd"]["rate"], json!(0.0));
        assert_eq!(
            body["usdt"],
            json!({"rate": 215.3, "date": "2025-01-10", "symbol": "₮", "live": true})
        );
    }

    #[tokio::test]
    async fn test_bcv_rates_all_sources_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let app = app_with(test_config(&server.uri()), CountingDispatcher::new(false));

        let response = app
            .oneshot(Request::get("/api/bcv").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["eur"].is_null());
        assert!(body["usd"].is_null());
        assert!(body["usdt"].is_null());
    }

    #[tokio::test]
    async fn test_bcv_rates_invalid_source_is_500() {
        let mut config = test_config("http://127.0.0.1:9");
        config.usdt_api_url = "::not-a-url::".to_string();
        let app = app_with(config, CountingDispatcher::new(false));

        let response = app
            .oneshot(Request::get("/api/bcv").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("Failed to fetch rates"));
        assert!(body["message"].as_str().unwrap().contains("usdt"));
    }

    // =========================================================================
    // Admin Login
    // =========================================================================

    #[tokio::test]
    async fn test_admin_login_success() {
        let app = app_with(test_config("http://127.0.0.1:9"), CountingDispatcher::new(false));

        let response = app
            .oneshot(login_request(r#"{"user":"carlos","pass":"pw"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_admin_login_wrong_credentials() {
        let app = app_with(test_config("http://127.0.0.1:9"), CountingDispatcher::new(false));

        for body in [r#"{"user":"carlos","pass":"nope"}"#, "{}", "null", "5"] {
            let response = app.clone().oneshot(login_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body {body}");
            assert_eq!(
                body_json(response).await,
                json!({"ok": false, "error": "Credenciales incorrectas"})
            );
        }
    }

    #[tokio::test]
    async fn test_admin_login_invalid_body() {
        let app = app_with(test_config("http://127.0.0.1:9"), CountingDispatcher::new(false));

        let response = app.oneshot(login_request("user=carlos")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "error": "Invalid request"})
        );
    }

    #[tokio::test]
    async fn test_admin_login_not_configured() {
        let mut config = test_config("http://127.0.0.1:9");
        config.admin_pass = None;
        let app = app_with(config, CountingDispatcher::new(false));

        let response = app
            .oneshot(login_request(r#"{"user":"carlos","pass":"pw"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "error": "Admin not configured"})
        );
    }
}
