#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sha2::Sha256;

use quizito_backend::adaptive::PerformanceProfile;
use quizito_backend::config::Config;
use quizito_backend::db::{MemoryPerformanceStore, PerformanceStore, StoreError};
use quizito_backend::services::adaptive_difficulty::AdaptiveDifficultyService;
use quizito_backend::state::AppState;

pub const TEST_SECRET: &str = "quizito-test-secret";

pub fn test_config(jwt_secret: Option<&str>) -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log_level: "warn".to_string(),
        jwt_secret: jwt_secret.map(str::to_string),
    }
}

pub fn create_test_app() -> Router {
    create_test_app_with(Some(TEST_SECRET))
}

pub fn create_test_app_with(jwt_secret: Option<&str>) -> Router {
    create_test_app_with_store(jwt_secret, Arc::new(MemoryPerformanceStore::new()))
}

pub fn create_test_app_with_store(
    jwt_secret: Option<&str>,
    store: Arc<dyn PerformanceStore>,
) -> Router {
    let service = Arc::new(AdaptiveDifficultyService::new(store));
    let state = AppState::new(test_config(jwt_secret), None, service);
    quizito_backend::build_app(state)
}

/// Reads fine, but every write loses the version race.
pub struct ConflictingStore {
    inner: MemoryPerformanceStore,
}

impl ConflictingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryPerformanceStore::new(),
        }
    }
}

#[async_trait]
impl PerformanceStore for ConflictingStore {
    async fn load(&self, user_id: &str) -> Result<Option<PerformanceProfile>, StoreError> {
        self.inner.load(user_id).await
    }

    async fn create(&self, profile: &PerformanceProfile) -> Result<PerformanceProfile, StoreError> {
        self.inner.create(profile).await
    }

    async fn save(&self, profile: &mut PerformanceProfile) -> Result<(), StoreError> {
        Err(StoreError::Conflict {
            user_id: profile.user_id.clone(),
        })
    }

    fn backend(&self) -> &'static str {
        "conflicting"
    }
}

/// Fails every operation, as a database that went away would.
pub struct UnavailableStore;

#[async_trait]
impl PerformanceStore for UnavailableStore {
    async fn load(&self, _user_id: &str) -> Result<Option<PerformanceProfile>, StoreError> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn create(
        &self,
        _profile: &PerformanceProfile,
    ) -> Result<PerformanceProfile, StoreError> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    async fn save(&self, _profile: &mut PerformanceProfile) -> Result<(), StoreError> {
        Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}

/// HS256 token carrying `userId`, valid for an hour.
pub fn sign_token(user_id: &str, secret: &str) -> String {
    let payload = serde_json::json!({
        "userId": user_id,
        "iat": chrono::Utc::now().timestamp(),
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let header_b64 = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{header_b64}.{payload_b64}.{sig_b64}")
}

pub fn token_for(user_id: &str) -> String {
    sign_token(user_id, TEST_SECRET)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
