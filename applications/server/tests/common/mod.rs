//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bloodbridge_checkout::{
    CheckoutError, CheckoutGateway, CheckoutSession, NewCheckoutSession, Result as CheckoutResult,
};
use bloodbridge_core::{fields, Collection, DocumentStore};
use bloodbridge_server::{
    create_router,
    services::{IdentityVerifier, SharedSecretVerifier},
    state::{AppState, CheckoutOptions},
};
use bloodbridge_storage::SqliteDocumentStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "test-shared-secret";

/// Create a test store backed by a real SQLite file
pub async fn create_test_store() -> (Arc<SqliteDocumentStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
    let store = SqliteDocumentStore::open(&url).await.unwrap();
    (Arc::new(store), temp_dir)
}

// =============================================================================
// Fake payment processor
// =============================================================================

/// In-process checkout gateway with scripted sessions
#[derive(Default)]
pub struct FakeCheckout {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    created: Mutex<Vec<NewCheckoutSession>>,
    unreachable: AtomicBool,
    retrievals: AtomicUsize,
}

impl FakeCheckout {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make a session retrievable
    pub fn put_session(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    /// Simulate the processor being down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<NewCheckoutSession> {
        self.created.lock().unwrap().clone()
    }

    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckoutGateway for FakeCheckout {
    async fn create_session(&self, request: &NewCheckoutSession) -> CheckoutResult<CheckoutSession> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(CheckoutError::Unreachable("connection refused".into()));
        }

        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        let id = format!("cs_test_{}", created.len());

        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.test/pay/{}", id)),
            payment_intent: None,
            payment_status: "unpaid".into(),
            amount_total: Some(request.amount_minor),
            currency: Some(request.currency.clone()),
            customer_email: Some(request.customer_email.clone()),
            customer_details: None,
            metadata: HashMap::new(),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(id, session.clone());
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> CheckoutResult<CheckoutSession> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(CheckoutError::Unreachable("connection refused".into()));
        }

        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| CheckoutError::SessionNotFound(session_id.to_string()))
    }
}

/// A checkout session as the processor reports it after payment
pub fn paid_session(id: &str, payment_intent: &str, amount_total: i64, email: &str) -> CheckoutSession {
    CheckoutSession {
        id: id.to_string(),
        url: None,
        payment_intent: Some(payment_intent.to_string()),
        payment_status: "paid".to_string(),
        amount_total: Some(amount_total),
        currency: Some("usd".to_string()),
        customer_email: Some(email.to_string()),
        customer_details: None,
        metadata: HashMap::new(),
    }
}

// =============================================================================
// Test application
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteDocumentStore>,
    pub checkout: Arc<FakeCheckout>,
    pub tokens: SharedSecretVerifier,
    _temp_dir: TempDir,
}

impl TestApp {
    /// App using shared-secret tokens
    pub async fn new() -> Self {
        let tokens = SharedSecretVerifier::new(TEST_SECRET);
        Self::with_verifier(Arc::new(tokens)).await
    }

    /// App using a custom identity verifier
    pub async fn with_verifier(verifier: Arc<dyn IdentityVerifier>) -> Self {
        let (store, temp_dir) = create_test_store().await;
        let checkout = FakeCheckout::new();

        let app_state = AppState::new(
            store.clone(),
            verifier,
            checkout.clone(),
            CheckoutOptions {
                site_domain: "https://bloodbridge.test".to_string(),
                currency: "usd".to_string(),
                product_name: "BloodBridge donation".to_string(),
            },
        );

        Self {
            router: create_router(app_state),
            store,
            checkout,
            tokens: SharedSecretVerifier::new(TEST_SECRET),
            _temp_dir: temp_dir,
        }
    }

    /// Bearer token for `email`
    pub fn token(&self, email: &str) -> String {
        self.tokens
            .issue(email, chrono::Duration::hours(1))
            .unwrap()
    }

    /// Insert a user document directly
    pub async fn seed_user(&self, email: &str, role: &str, status: &str) -> String {
        let user = json!({
            "email": email,
            "name": format!("User {}", email.split('@').next().unwrap()),
            "role": role,
            "status": status,
            "bloodGroup": "A+",
            "district": "Dhaka",
            "upazila": "Mirpur",
        });
        self.store
            .insert_one(Collection::Users, into_doc(user))
            .await
            .unwrap()
            .inserted_id
    }

    /// Insert a donation request directly
    pub async fn seed_request(&self, requester: &str, status: &str, extra: Value) -> String {
        let mut request = into_doc(extra);
        request.insert(fields::REQUESTER_EMAIL.into(), json!(requester));
        request.insert(fields::DONATION_STATUS.into(), json!(status));
        self.store
            .insert_one(Collection::Requests, request)
            .await
            .unwrap()
            .inserted_id
    }

    /// Send a request and decode the JSON response body
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }
}

pub fn into_doc(value: Value) -> bloodbridge_core::Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
