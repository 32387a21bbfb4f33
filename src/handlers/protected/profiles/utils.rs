use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::{authorize, Action, Principal};
use crate::database::{NewProfile, ProfileUpdate};
use crate::error::ApiError;

pub const MAX_USERNAME_LEN: usize = 50;
const DATE_FORMAT: &str = "%Y-%m-%d";
const REQUIRED: &str = "This field is required";

/// Evaluate the policy and turn a denial into `403 Forbidden`.
pub fn require(principal: &Principal, action: Action, owner: Option<&str>) -> Result<(), ApiError> {
    let decision = authorize(principal, action, owner);
    if !decision.allow {
        tracing::warn!(
            "Denied {} for '{}' ({}): {}",
            action,
            principal.username(),
            principal.role(),
            decision.reason.as_deref().unwrap_or("no reason")
        );
    }
    decision.into_result().map_err(ApiError::from)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// Body of `POST /profiles`. Every field is required; they are optional
/// here so all missing fields can be reported at once.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub preferred_activity: Option<String>,
    pub date_of_birth: Option<String>,
}

/// Body of `POST /profiles/username`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsernameOnlyRequest {
    pub username: Option<String>,
}

/// Body of `PUT /profiles/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateProfileRequest {
    pub location: Option<String>,
    pub preferred_activity: Option<String>,
}

impl CreateProfileRequest {
    pub fn validate(self, today: NaiveDate) -> Result<NewProfile, ApiError> {
        let mut errors = HashMap::new();

        let username = match self.username.as_deref().map(validate_username) {
            Some(Ok(name)) => Some(name),
            Some(Err(problem)) => {
                errors.insert("Username".to_string(), problem);
                None
            }
            None => {
                errors.insert("Username".to_string(), REQUIRED.to_string());
                None
            }
        };

        let email = required_text(&mut errors, "Email", self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                errors.insert("Email".to_string(), "Email must contain '@'".to_string());
            }
        }

        let location = required_text(&mut errors, "Location", self.location);
        let preferred_activity = required_text(&mut errors, "PreferredActivity", self.preferred_activity);

        let date_of_birth = match required_text(&mut errors, "DateOfBirth", self.date_of_birth) {
            Some(raw) => match parse_date_of_birth(&raw, today) {
                Ok(date) => Some(date),
                Err(problem) => {
                    errors.insert("DateOfBirth".to_string(), problem);
                    None
                }
            },
            None => None,
        };

        match (username, email, location, preferred_activity, date_of_birth) {
            (Some(username), Some(email), Some(location), Some(preferred_activity), Some(date_of_birth))
                if errors.is_empty() =>
            {
                Ok(NewProfile {
                    username,
                    email,
                    location,
                    preferred_activity,
                    date_of_birth,
                })
            }
            _ => Err(ApiError::validation_error("Invalid profile", Some(errors))),
        }
    }
}

impl UsernameOnlyRequest {
    pub fn validate(self) -> Result<String, ApiError> {
        match self.username.as_deref() {
            Some(raw) => validate_username(raw).map_err(|problem| ApiError::invalid_field("Username", problem)),
            None => Err(ApiError::invalid_field("Username", REQUIRED)),
        }
    }
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileUpdate, ApiError> {
        let requested = ProfileUpdate {
            location: self.location,
            preferred_activity: self.preferred_activity,
        };
        if requested.is_empty() {
            return Err(ApiError::validation_error(
                "Location or PreferredActivity is required",
                None,
            ));
        }

        let mut errors = HashMap::new();
        let location = optional_text(&mut errors, "Location", requested.location);
        let preferred_activity = optional_text(&mut errors, "PreferredActivity", requested.preferred_activity);

        if !errors.is_empty() {
            return Err(ApiError::validation_error("Invalid profile update", Some(errors)));
        }

        Ok(ProfileUpdate { location, preferred_activity })
    }
}

/// Usernames are compared byte-for-byte with the caller identity, so no
/// normalisation happens here: surrounding whitespace is an error.
pub fn validate_username(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err(REQUIRED.to_string());
    }
    if raw.chars().count() > MAX_USERNAME_LEN {
        return Err(format!("Username must be at most {} characters", MAX_USERNAME_LEN));
    }
    if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("Username must not contain whitespace".to_string());
    }
    Ok(raw.to_string())
}

pub fn parse_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?;
    if date > today {
        return Err("Date of birth cannot be in the future".to_string());
    }
    Ok(date)
}

fn required_text(errors: &mut HashMap<String, String>, field: &str, value: Option<String>) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.insert(field.to_string(), REQUIRED.to_string());
            None
        }
    }
}

fn optional_text(errors: &mut HashMap<String, String>, field: &str, value: Option<String>) -> Option<String> {
    let value = value?.trim().to_string();
    if value.is_empty() {
        errors.insert(field.to_string(), "Must not be empty".to_string());
        return None;
    }
    Some(value)
}
