//! Shared test utilities for integration tests.
//!
//! This module provides a `TestClient` that drives the real router over an
//! in-memory database. Methods are intentionally broad to support various test
//! scenarios across different test files.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use envelope::config::{Config, SpentConvention};
use envelope::db::{create_in_memory_pool, migrations};
use envelope::server::build_router;
use envelope::state::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tower::ServiceExt;

/// A test client holding application state, allowing sequential requests
/// against the application.
pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// Create a new test client with a fresh in-memory database.
    pub fn new() -> Self {
        Self::with_convention(SpentConvention::Signed)
    }

    /// Create a new test client with a specific spent convention.
    pub fn with_convention(spent_convention: SpentConvention) -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            spent_convention,
            ..Config::default()
        };

        Self {
            state: AppState::new(pool, config),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Send a request and return status and body parsed as JSON (or `Value::Null`
    /// for an empty or non-JSON body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Send a raw string body, for malformed-JSON cases.
    pub async fn post_raw(&self, uri: &str, token: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router().oneshot(request).await.unwrap().status()
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    // =========================================================================
    // Helper methods for creating entities through the API
    // =========================================================================

    /// Sign up a user and return its access token.
    pub async fn signup(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn create_category(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/categories",
                token,
                json!({ "name": name, "group": "Essentials" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create category failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_account(&self, token: &str, name: &str, balance: i64) -> i64 {
        let (status, body) = self
            .post(
                "/accounts",
                token,
                json!({ "name": name, "accountType": "Checking", "balance": balance }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create account failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn assign(&self, token: &str, month: &str, category_id: i64, amount: i64) -> Value {
        let (status, body) = self
            .post(
                &format!("/budget/{}/categories/{}", month, category_id),
                token,
                json!({ "amount": amount }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "assign failed: {body}");
        body
    }

    /// Post a transaction and return its id.
    pub async fn post_transaction(
        &self,
        token: &str,
        account_id: i64,
        category_id: Option<i64>,
        amount: i64,
        date: &str,
    ) -> i64 {
        let (status, body) = self
            .post(
                "/transactions",
                token,
                json!({
                    "amount": amount,
                    "accountId": account_id,
                    "description": "Test transaction",
                    "categoryId": category_id,
                    "date": date,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "post transaction failed: {body}");
        body["transactionId"].as_i64().unwrap()
    }

    /// Budget entry for `category_id` in `month`, if the month has one.
    pub async fn budget_entry(&self, token: &str, month: &str, category_id: i64) -> Option<Value> {
        let (status, body) = self.get(&format!("/budget/{}", month), token).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array()
            .unwrap()
            .iter()
            .find(|e| e["categoryId"].as_i64() == Some(category_id))
            .cloned()
    }

    pub async fn account_balance(&self, token: &str, account_id: i64) -> i64 {
        let (status, body) = self.get(&format!("/accounts/{}", account_id), token).await;
        assert_eq!(status, StatusCode::OK);
        body["balance"].as_i64().unwrap()
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
