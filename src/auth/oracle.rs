use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::Role;
use crate::config::OracleConfig;

/// Literal the oracle places first in its response for a verified user.
pub const VERIFIED_MARKER: &str = "Verified";

/// What the identity oracle said about a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleVerdict {
    pub verified: bool,
    /// Role asserted by the oracle, when it sends a recognised one.
    pub role: Option<Role>,
}

impl OracleVerdict {
    pub fn verified(role: Option<Role>) -> Self {
        Self { verified: true, role }
    }

    pub fn rejected() -> Self {
        Self { verified: false, role: None }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("Invalid oracle configuration: {0}")]
    Config(String),

    #[error("Oracle request timed out")]
    Timeout,

    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle returned status {0}")]
    Status(u16),

    #[error("Oracle returned a malformed body: {0}")]
    MalformedBody(String),
}

/// External system of record for whether a username is a verified user.
#[async_trait]
pub trait IdentityOracle: Send + Sync {
    async fn verify(&self, username: &str) -> Result<OracleVerdict, OracleError>;
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    username: &'a str,
}

/// Oracle client speaking JSON over HTTP.
///
/// Sends `POST <base_url>` with `{"username": ...}` and expects a JSON array
/// whose first element is `"Verified"` for a verified user. An optional
/// second element names the user's role.
#[derive(Debug, Clone)]
pub struct HttpIdentityOracle {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpIdentityOracle {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OracleError> {
        let endpoint = url::Url::parse(base_url)
            .map_err(|e| OracleError::Config(format!("{}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Config(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityOracle for HttpIdentityOracle {
    async fn verify(&self, username: &str) -> Result<OracleVerdict, OracleError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyRequest { username })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout
            } else {
                OracleError::MalformedBody(e.to_string())
            }
        })?;

        parse_verdict(&body)
    }
}

fn transport_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(e.to_string())
    }
}

/// Interpret an oracle response body.
///
/// Only an array starting with the exact `"Verified"` string counts as
/// verified. Any other array is a rejection; any non-array is malformed.
pub fn parse_verdict(body: &Value) -> Result<OracleVerdict, OracleError> {
    let items = body
        .as_array()
        .ok_or_else(|| OracleError::MalformedBody(format!("expected array, got {}", body)))?;

    match items.first().and_then(Value::as_str) {
        Some(VERIFIED_MARKER) => {
            let role = items.get(1).and_then(Value::as_str).and_then(Role::parse);
            Ok(OracleVerdict::verified(role))
        }
        _ => Ok(OracleVerdict::rejected()),
    }
}
