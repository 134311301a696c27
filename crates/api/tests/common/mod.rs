//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use raidsim_api::auth::jwt::{generate_access_token, JwtConfig};
use raidsim_api::config::ServerConfig;
use raidsim_api::router::build_app_router;
use raidsim_api::state::AppState;
use raidsim_core::roles::{ROLE_ADMIN, ROLE_MEMBER};
use raidsim_db::models::roster::CreateRosterMember;
use raidsim_db::repositories::RosterRepo;
use raidsim_simbot::extractor::{Extraction, ResultExtractor};
use raidsim_simbot::report::ExtractedResult;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub const REPORT_URL: &str = "https://www.raidbots.com/simbot/report/abc123";
pub const TRUSTED_ORIGIN: &str = "https://www.raidbots.com";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        trusted_message_domain: "raidbots.com".to_string(),
        simbot_base_url: "https://www.raidbots.com".to_string(),
        privileged_usernames: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Fake extractor
// ---------------------------------------------------------------------------

/// Returns a canned extraction and counts how often it was asked.
pub struct FakeExtractor {
    pub extraction: Extraction,
    pub calls: AtomicU32,
}

impl FakeExtractor {
    pub fn found(dps: f64, item_level: f64) -> Arc<Self> {
        Arc::new(Self {
            extraction: Extraction {
                result: Some(ExtractedResult {
                    mean_throughput: dps,
                    gear_score: Some(item_level),
                }),
                attempts: 1,
                diagnostic: format!("DPS Found: {}", dps.round()),
            },
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultExtractor for FakeExtractor {
    async fn extract(&self, _result_url: &str) -> Extraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.extraction.clone()
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, FakeExtractor::found(1_250_000.4, 489.5))
}

pub fn build_test_app_with(pool: PgPool, extractor: Arc<dyn ResultExtractor>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        policy: config.access_policy(),
        extractor,
    };
    build_app_router(state, &config)
}

pub fn admin_token() -> String {
    generate_access_token(1, "thrall", ROLE_ADMIN, &test_config().jwt).unwrap()
}

pub fn member_token() -> String {
    generate_access_token(2, "jaina", ROLE_MEMBER, &test_config().jwt).unwrap()
}

pub async fn new_member(pool: &PgPool, name: &str) -> i64 {
    let input = CreateRosterMember {
        name: name.to_string(),
        realm: "Mal'Ganis".to_string(),
        region: None,
    };
    RosterRepo::create(pool, &input).await.unwrap().id
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    origin: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
