//! Shared test harness: an in-process router over a memory store.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use sthana_config::CollectionsConfig;
use sthana_server::{
    api,
    auth::{Claims, TokenVerifier},
    AppState, Collections,
};
use sthana_store::{DocumentStore, MemoryStore};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";
pub const FALLBACK_ADMIN: &str = "owner@example.org";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    verifier: TokenVerifier,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let verifier = TokenVerifier::new(SECRET).with_admin_email(FALLBACK_ADMIN);
        let collections = Collections::from_config(&CollectionsConfig::default()).unwrap();
        let state = AppState::new(Arc::clone(&store), verifier.clone(), collections);
        Self {
            router: api::router(state),
            store,
            verifier,
        }
    }

    pub fn token(&self, uid: &str, email: Option<&str>, admin: bool) -> String {
        self.verifier
            .encode(&Claims::new(uid, email, admin, 3600))
            .unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token("admin-uid", Some("admin@example.org"), true)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let authorization = token.map(|token| format!("Bearer {token}"));
        let body = body.map(|body| serde_json::to_vec(&body).unwrap());
        self.send(
            method,
            uri,
            authorization.as_deref(),
            body.as_ref().map(|_| "application/json"),
            body.unwrap_or_default(),
        )
        .await
    }

    /// Send raw headers and body bytes. Non-JSON responses come back as `Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        content_type: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            req = req.header(header::AUTHORIZATION, authorization);
        }
        if let Some(content_type) = content_type {
            req = req.header(header::CONTENT_TYPE, content_type);
        }

        let response = self
            .router
            .clone()
            .oneshot(req.body(body.into()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.admin_token();
        self.request(method, uri, Some(&token), body).await
    }
}
