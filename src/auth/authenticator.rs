use std::sync::Arc;

use super::oracle::IdentityOracle;
use super::role::derive_role;
use super::{AuthError, Principal};

/// Turns a caller-supplied identity string into a [`Principal`].
///
/// Every call consults the oracle exactly once; nothing is cached.
#[derive(Clone)]
pub struct Authenticator {
    oracle: Arc<dyn IdentityOracle>,
}

impl Authenticator {
    pub fn new(oracle: Arc<dyn IdentityOracle>) -> Self {
        Self { oracle }
    }

    pub async fn authenticate(&self, raw_identity: Option<&str>) -> Result<Principal, AuthError> {
        let username = raw_identity
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingIdentity)?;

        let verdict = match self.oracle.verify(username).await {
            Ok(verdict) => verdict,
            Err(e) => {
                // Unreachable or confused oracle means not verified.
                tracing::warn!("Identity oracle failed for '{}': {}", username, e);
                return Err(AuthError::UnauthorizedUser(username.to_string()));
            }
        };

        if !verdict.verified {
            tracing::warn!("Identity oracle rejected '{}'", username);
            return Err(AuthError::UnauthorizedUser(username.to_string()));
        }

        let role = match verdict.role {
            Some(role) => role,
            None => {
                let role = derive_role(username);
                tracing::debug!("Oracle sent no role for '{}', derived '{}'", username, role);
                role
            }
        };

        Principal::new(username, role).ok_or(AuthError::MissingIdentity)
    }
}
