use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored profile. Serialized with the field names API clients already use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Profile {
    #[serde(rename = "ProfileID")]
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub preferred_activity: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Profile {
    pub fn username_only(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            location: None,
            preferred_activity: None,
            date_of_birth: None,
        }
    }
}

/// Validated input for a full-field insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub username: String,
    pub email: String,
    pub location: String,
    pub preferred_activity: String,
    pub date_of_birth: NaiveDate,
}

impl NewProfile {
    pub fn into_profile(self, id: i64) -> Profile {
        Profile {
            id,
            username: self.username,
            email: Some(self.email),
            location: Some(self.location),
            preferred_activity: Some(self.preferred_activity),
            date_of_birth: Some(self.date_of_birth),
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub location: Option<String>,
    pub preferred_activity: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.preferred_activity.is_none()
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(location) = &self.location {
            profile.location = Some(location.clone());
        }
        if let Some(activity) = &self.preferred_activity {
            profile.preferred_activity = Some(activity.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_names() {
        let profile = NewProfile {
            username: "dave".into(),
            email: "dave@example.com".into(),
            location: "Leeds".into(),
            preferred_activity: "Cycling".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
        }
        .into_profile(7);

        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({
                "ProfileID": 7,
                "Username": "dave",
                "Email": "dave@example.com",
                "Location": "Leeds",
                "PreferredActivity": "Cycling",
                "DateOfBirth": "1990-04-01"
            })
        );
    }

    #[test]
    fn update_only_touches_present_fields() {
        let mut profile = Profile::username_only(1, "alice");
        profile.location = Some("York".into());

        ProfileUpdate { location: None, preferred_activity: Some("Running".into()) }.apply(&mut profile);

        assert_eq!(profile.location.as_deref(), Some("York"));
        assert_eq!(profile.preferred_activity.as_deref(), Some("Running"));
        assert!(ProfileUpdate::default().is_empty());
    }
}
