#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use profile_api::auth::{Authenticator, IdentityOracle, OracleError, OracleVerdict, Role};
use profile_api::config::{AppConfig, Environment};
use profile_api::database::InMemoryProfileStore;
use profile_api::{app, AppState};

pub const IDENTITY_HEADER: &str = "x-username";

/// Oracle answering from a fixed table; unknown usernames are rejected.
pub struct ScriptedOracle {
    answers: HashMap<String, Result<OracleVerdict, OracleError>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityOracle for ScriptedOracle {
    async fn verify(&self, username: &str) -> Result<OracleVerdict, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(username)
            .cloned()
            .unwrap_or_else(|| Ok(OracleVerdict::rejected()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryProfileStore>,
    pub oracle: Arc<ScriptedOracle>,
}

/// Known callers:
/// - `root` admin, `sam` staff, `alice` / `bob` user (oracle-supplied roles)
/// - `erin` verified without a role (derives to admin)
/// - `mallory` rejected, `slowpoke` oracle timeout, `flaky` oracle 502
pub fn test_app() -> TestApp {
    let mut answers = HashMap::new();
    answers.insert("root".to_string(), Ok(OracleVerdict::verified(Some(Role::Admin))));
    answers.insert("sam".to_string(), Ok(OracleVerdict::verified(Some(Role::Staff))));
    answers.insert("alice".to_string(), Ok(OracleVerdict::verified(Some(Role::User))));
    answers.insert("bob".to_string(), Ok(OracleVerdict::verified(Some(Role::User))));
    answers.insert("erin".to_string(), Ok(OracleVerdict::verified(None)));
    answers.insert("mallory".to_string(), Ok(OracleVerdict::rejected()));
    answers.insert("slowpoke".to_string(), Err(OracleError::Timeout));
    answers.insert("flaky".to_string(), Err(OracleError::Status(502)));

    let oracle = Arc::new(ScriptedOracle {
        answers,
        calls: AtomicUsize::new(0),
    });
    let store = Arc::new(InMemoryProfileStore::new());

    let mut config = AppConfig::preset(Environment::Development);
    config.api.enable_request_logging = false;

    let state = AppState::new(config, Authenticator::new(oracle.clone()), store.clone());

    TestApp {
        router: app(state),
        store,
        oracle,
    }
}

impl TestApp {
    /// Send a request as `user` (no identity header when `None`) and decode the JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(IDENTITY_HEADER, user);
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send_raw(request).await
    }

    pub async fn send_raw(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, json))
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, Some(user), None).await
    }

    /// Create a username-only profile as admin and return its id.
    pub async fn seed(&self, username: &str) -> Result<i64> {
        let (status, body) = self
            .post("/profiles/username", "root", serde_json::json!({ "Username": username }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "seed failed: {} {}", status, body);
        body["data"]["ProfileID"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing ProfileID in {}", body))
    }
}

pub fn code(body: &Value) -> &str {
    body["code"].as_str().unwrap_or("")
}
