use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::profile::{NewProfile, Profile, ProfileUpdate};

/// Persistence operations the HTTP layer relies on.
///
/// Missing rows surface as `DatabaseError::NotFound`, duplicate usernames as
/// `DatabaseError::Conflict`. Inserts are all-or-nothing: on any error the
/// store is left unchanged.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Username owning profile `id`.
    async fn get_owner(&self, id: i64) -> Result<String, DatabaseError>;

    async fn get_by_id(&self, id: i64) -> Result<Profile, DatabaseError>;

    /// Newest profiles first, at most `limit`.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Profile>, DatabaseError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, DatabaseError>;

    async fn insert_full(&self, profile: &NewProfile) -> Result<i64, DatabaseError>;

    async fn insert_username_only(&self, username: &str) -> Result<i64, DatabaseError>;

    /// Returns the number of rows updated (0 when `id` does not exist).
    async fn update_partial(&self, id: i64, update: &ProfileUpdate) -> Result<u64, DatabaseError>;

    /// Returns the number of rows deleted (0 when `id` does not exist).
    async fn delete_by_id(&self, id: i64) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub(crate) fn profile_not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound(format!("Profile {} not found", id))
}

pub(crate) fn username_taken(username: &str) -> DatabaseError {
    DatabaseError::Conflict(format!("A profile for '{}' already exists", username))
}
