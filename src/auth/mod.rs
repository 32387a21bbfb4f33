// Authentication and authorization core.
//
// Request flow: identity header -> Authenticator (oracle + role fallback)
// -> Principal -> Policy decision -> store operation.

pub mod authenticator;
pub mod oracle;
pub mod policy;
pub mod role;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use authenticator::Authenticator;
pub use oracle::{HttpIdentityOracle, IdentityOracle, OracleError, OracleVerdict};
pub use policy::{authorize, Action, Decision};
pub use role::derive_role;

/// Caller role. Ordering of `ALL` is fixed and used by the role deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Staff, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::User => "user",
        }
    }

    /// Parse a role name, case-insensitive. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Admin and staff act on any record.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    username: String,
    role: Role,
}

impl Principal {
    /// Returns `None` for an empty username.
    pub fn new(username: impl Into<String>, role: Role) -> Option<Self> {
        let username = username.into();
        if username.is_empty() {
            return None;
        }
        Some(Self { username, role })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// True when `owner` names this principal.
    pub fn owns(&self, owner: &str) -> bool {
        self.username == owner
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Missing identity header")]
    MissingIdentity,

    #[error("User '{0}' could not be verified")]
    UnauthorizedUser(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}
