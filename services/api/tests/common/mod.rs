//! Shared fixtures for the API integration tests: an app over the in-memory
//! store, a fake payment processor and locally minted identity tokens.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tracing::Level;

use api_lib::adapters::{JwtIdentityVerifier, MemoryStore};
use api_lib::config::{Config, MEMORY_DATABASE_URL};
use api_lib::web::{build_router, state::AppState};
use tutoring_core::domain::{
    NewTutorApplication, NewUser, PaymentIntent, TutorStatus, TutoringSession, User,
};
use tutoring_core::ports::{DatabaseService, PaymentProcessor, PortResult};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Records every intent it is asked to open.
#[derive(Default)]
pub struct FakePayments {
    pub calls: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl PaymentProcessor for FakePayments {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> PortResult<PaymentIntent> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((amount_minor, currency.to_string()));
        }
        Ok(PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: "pi_test_secret_123".to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub payments: Arc<FakePayments>,
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: MEMORY_DATABASE_URL.to_string(),
        log_level: Level::DEBUG,
        identity_jwt_secret: String::from_utf8_lossy(TEST_SECRET).to_string(),
        identity_issuer: None,
        identity_audience: None,
        stripe_secret_key: None,
        payment_currency: "usd".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        cookie_secure: false,
        session_cookie_days: 7,
    }
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let payments = Arc::new(FakePayments::default());

    let state = Arc::new(AppState {
        db: store.clone(),
        config: Arc::new(test_config()),
        identity: Arc::new(JwtIdentityVerifier::new(TEST_SECRET, None, None)),
        payments: payments.clone(),
    });

    TestApp {
        router: build_router(state),
        store,
        payments,
    }
}

//=========================================================================================
// Tokens and Requests
//=========================================================================================

pub fn token_for(email: &str) -> String {
    let claims = json!({
        "email": email,
        "sub": format!("uid-{}", email),
        "name": email.split('@').next().unwrap_or_default(),
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET)).unwrap()
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

//=========================================================================================
// Seeding
//=========================================================================================

pub async fn seed_user(store: &MemoryStore, email: &str) -> User {
    let (user, _) = store
        .upsert_user(NewUser {
            uid: None,
            email: email.to_string(),
            name: email.split('@').next().unwrap_or_default().to_string(),
            photo_url: None,
        })
        .await
        .unwrap();
    user
}

pub async fn seed_admin(store: &MemoryStore, email: &str) -> User {
    let user = seed_user(store, email).await;
    store.add_admin(email).await.unwrap();
    user
}

pub async fn seed_tutor(store: &MemoryStore, email: &str) -> User {
    let user = seed_user(store, email).await;
    store
        .create_tutor_application(NewTutorApplication {
            email: email.to_string(),
            name: user.name.clone(),
            photo_url: None,
            status: TutorStatus::Approved,
        })
        .await
        .unwrap();
    user
}

pub async fn seed_session(store: &MemoryStore, tutor_email: &str) -> TutoringSession {
    let mut details = Map::new();
    details.insert("title".to_string(), json!("Algebra I"));
    store.create_session(tutor_email, details).await.unwrap()
}
