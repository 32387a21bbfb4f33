//! Per-action authorization rules.
//!
//! Rules are evaluated in a fixed order and the first matching rule decides:
//!
//! 1. bulk reads (`ListAllProfiles`, `ReadAllProfilesBulk`): admin, staff
//! 2. `CreateFullProfile`: admin, staff
//! 3. `CreateUsernameOnlyProfile`: anyone, but a `user` only for itself
//! 4. `ReadOneProfile`, `UpdateProfile`: admin, staff, or the owning `user`
//! 5. `DeleteProfile`: admin, or the owning `user`; staff never
//!
//! Record-scoped actions expect the owner to be resolved by the caller first,
//! so a missing record surfaces as not-found rather than as a denial.

use serde::Serialize;

use super::{AuthError, Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ListAllProfiles,
    ReadAllProfilesBulk,
    CreateFullProfile,
    CreateUsernameOnlyProfile,
    ReadOneProfile,
    UpdateProfile,
    DeleteProfile,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ListAllProfiles => "list-all-profiles",
            Action::ReadAllProfilesBulk => "read-all-profiles-bulk",
            Action::CreateFullProfile => "create-full-profile",
            Action::CreateUsernameOnlyProfile => "create-username-only-profile",
            Action::ReadOneProfile => "read-one-profile",
            Action::UpdateProfile => "update-profile",
            Action::DeleteProfile => "delete-profile",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy evaluation. Advisory: callers must stop on denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allow: bool,
    pub reason: Option<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self { allow: true, reason: None }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { allow: false, reason: Some(reason.into()) }
    }

    /// Convert into a `Result`, mapping a denial to `AuthError::Forbidden`.
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.allow {
            Ok(())
        } else {
            Err(AuthError::Forbidden(
                self.reason.unwrap_or_else(|| "Access denied".to_string()),
            ))
        }
    }
}

/// Decide whether `principal` may perform `action`.
///
/// `owner` is the username owning the target record for record-scoped
/// actions, and the target username for `CreateUsernameOnlyProfile`.
/// It is ignored by the bulk and full-create actions.
pub fn authorize(principal: &Principal, action: Action, owner: Option<&str>) -> Decision {
    let role = principal.role();

    match action {
        Action::ListAllProfiles | Action::ReadAllProfilesBulk => {
            if role.is_privileged() {
                Decision::allow()
            } else {
                Decision::deny(format!("Role '{}' may not {}", role, action))
            }
        }

        Action::CreateFullProfile => {
            if role.is_privileged() {
                Decision::allow()
            } else {
                Decision::deny("Users must create their profile with a username only")
            }
        }

        Action::CreateUsernameOnlyProfile => match (role, owner) {
            (Role::User, Some(target)) if principal.owns(target) => Decision::allow(),
            (Role::User, _) => Decision::deny("Users may only create their own profile"),
            _ => Decision::allow(),
        },

        Action::ReadOneProfile | Action::UpdateProfile => {
            let Some(owner) = owner else {
                return Decision::deny("Record owner not resolved");
            };
            if role.is_privileged() || principal.owns(owner) {
                Decision::allow()
            } else {
                let verb = if action == Action::UpdateProfile { "update" } else { "read" };
                Decision::deny(format!("Users may only {} their own profile", verb))
            }
        }

        Action::DeleteProfile => {
            let Some(owner) = owner else {
                return Decision::deny("Record owner not resolved");
            };
            match role {
                Role::Admin => Decision::allow(),
                Role::Staff => Decision::deny("Staff may not delete profiles"),
                Role::User if principal.owns(owner) => Decision::allow(),
                Role::User => Decision::deny("Users may only delete their own profile"),
            }
        }
    }
}
