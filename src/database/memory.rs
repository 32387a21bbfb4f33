use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::profile::{NewProfile, Profile, ProfileUpdate};
use super::store::{profile_not_found, username_taken, ProfileStore};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rows: BTreeMap<i64, Profile>,
}

/// Process-local profile store for tests and `--memory-store` runs.
///
/// Each write holds the lock across its duplicate check and mutation, so
/// inserts are atomic just like the Postgres transaction.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent call, health check included, fail as if the
    /// database could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_reachable(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError("simulated outage".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), DatabaseError> {
        self.check_reachable()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("simulated write failure".to_string()));
        }
        Ok(())
    }
}

impl State {
    fn username_exists(&self, username: &str) -> bool {
        self.rows.values().any(|p| p.username == username)
    }

    fn insert(&mut self, build: impl FnOnce(i64) -> Profile) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        self.rows.insert(id, build(id));
        id
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_owner(&self, id: i64) -> Result<String, DatabaseError> {
        self.check_reachable()?;
        let state = self.state.read().await;
        state
            .rows
            .get(&id)
            .map(|p| p.username.clone())
            .ok_or_else(|| profile_not_found(id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Profile, DatabaseError> {
        self.check_reachable()?;
        let state = self.state.read().await;
        state.rows.get(&id).cloned().ok_or_else(|| profile_not_found(id))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Profile>, DatabaseError> {
        self.check_reachable()?;
        let state = self.state.read().await;
        Ok(state.rows.values().rev().take(limit as usize).cloned().collect())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DatabaseError> {
        self.check_reachable()?;
        Ok(self.state.read().await.username_exists(username))
    }

    async fn insert_full(&self, profile: &NewProfile) -> Result<i64, DatabaseError> {
        self.check_reachable()?;
        let mut state = self.state.write().await;
        if state.username_exists(&profile.username) {
            return Err(username_taken(&profile.username));
        }
        self.check_writable()?;

        let profile = profile.clone();
        Ok(state.insert(|id| profile.into_profile(id)))
    }

    async fn insert_username_only(&self, username: &str) -> Result<i64, DatabaseError> {
        self.check_reachable()?;
        let mut state = self.state.write().await;
        if state.username_exists(username) {
            return Err(username_taken(username));
        }
        self.check_writable()?;

        Ok(state.insert(|id| Profile::username_only(id, username)))
    }

    async fn update_partial(&self, id: i64, update: &ProfileUpdate) -> Result<u64, DatabaseError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        match state.rows.get_mut(&id) {
            Some(profile) => {
                update.apply(profile);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, DatabaseError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        Ok(state.rows.remove(&id).map_or(0, |_| 1))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.check_reachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dave() -> NewProfile {
        NewProfile {
            username: "dave".into(),
            email: "dave@example.com".into(),
            location: "Leeds".into(),
            preferred_activity: "Cycling".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_and_fetch() {
        let store = InMemoryProfileStore::new();
        let id = store.insert_full(&dave()).await.unwrap();

        assert_eq!(store.get_owner(id).await.unwrap(), "dave");
        let profile = store.get_by_id(id).await.unwrap();
        assert_eq!(profile.email.as_deref(), Some("dave@example.com"));
        assert!(store.exists_by_username("dave").await.unwrap());
        assert!(!store.exists_by_username("erin").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_leaves_store_unchanged() {
        let store = InMemoryProfileStore::new();
        store.insert_full(&dave()).await.unwrap();

        assert!(matches!(store.insert_full(&dave()).await, Err(DatabaseError::Conflict(_))));
        assert!(matches!(
            store.insert_username_only("dave").await,
            Err(DatabaseError::Conflict(_))
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let store = InMemoryProfileStore::new();
        store.set_fail_writes(true);

        assert!(matches!(store.insert_full(&dave()).await, Err(DatabaseError::QueryError(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn outage_fails_reads_writes_and_health() {
        let store = InMemoryProfileStore::new();
        let id = store.insert_username_only("alice").await.unwrap();
        store.set_unavailable(true);

        assert!(matches!(store.health_check().await, Err(DatabaseError::ConnectionError(_))));
        assert!(matches!(store.get_by_id(id).await, Err(DatabaseError::ConnectionError(_))));
        assert!(matches!(
            store.insert_username_only("bob").await,
            Err(DatabaseError::ConnectionError(_))
        ));

        store.set_unavailable(false);
        assert!(store.health_check().await.is_ok());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_limited() {
        let store = InMemoryProfileStore::new();
        for name in ["a", "b", "c"] {
            store.insert_username_only(name).await.unwrap();
        }

        let names: Vec<_> = store
            .list_recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.username)
            .collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn update_and_delete_report_counts() {
        let store = InMemoryProfileStore::new();
        let id = store.insert_username_only("alice").await.unwrap();

        let update = ProfileUpdate { location: Some("York".into()), preferred_activity: None };
        assert_eq!(store.update_partial(id, &update).await.unwrap(), 1);
        assert_eq!(store.update_partial(999, &update).await.unwrap(), 0);
        assert_eq!(store.get_by_id(id).await.unwrap().location.as_deref(), Some("York"));

        assert_eq!(store.delete_by_id(id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(id).await.unwrap(), 0);
        assert!(matches!(store.get_owner(id).await, Err(DatabaseError::NotFound(_))));
    }
}
