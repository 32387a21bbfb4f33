use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use tracing::info;

use super::manager::{self, DatabaseError};
use super::models::profile::{NewProfile, Profile, ProfileUpdate};
use super::store::{profile_not_found, username_taken, ProfileStore};

const PROFILE_COLUMNS: &str = "id, username, email, location, preferred_activity, date_of_birth";

/// Postgres-backed profile store.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the profiles table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id                 BIGSERIAL PRIMARY KEY,
                username           TEXT NOT NULL UNIQUE,
                email              TEXT,
                location           TEXT,
                preferred_activity TEXT,
                date_of_birth      DATE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Profiles schema ready");
        Ok(())
    }
}

async fn username_exists<'e>(executor: impl PgExecutor<'e>, username: &str) -> Result<bool, DatabaseError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM profiles WHERE username = $1)")
        .bind(username)
        .fetch_one(executor)
        .await?;
    Ok(exists)
}

/// Map a unique-constraint violation onto `Conflict`; everything else stays a storage error.
fn map_insert_error(err: sqlx::Error, username: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => username_taken(username),
        _ => DatabaseError::Sqlx(err),
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_owner(&self, id: i64) -> Result<String, DatabaseError> {
        sqlx::query_scalar::<_, String>("SELECT username FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| profile_not_found(id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Profile, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| profile_not_found(id))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Profile>, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles ORDER BY id DESC LIMIT $1", PROFILE_COLUMNS);
        let rows = sqlx::query_as::<_, Profile>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DatabaseError> {
        username_exists(&self.pool, username).await
    }

    async fn insert_full(&self, profile: &NewProfile) -> Result<i64, DatabaseError> {
        // Duplicate check and insert share one transaction; dropping `tx` on
        // any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        if username_exists(&mut *tx, &profile.username).await? {
            return Err(username_taken(&profile.username));
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO profiles (username, email, location, preferred_activity, date_of_birth)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&profile.username)
        .bind(&profile.email)
        .bind(&profile.location)
        .bind(&profile.preferred_activity)
        .bind(profile.date_of_birth)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &profile.username))?;

        tx.commit().await?;
        Ok(id)
    }

    async fn insert_username_only(&self, username: &str) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if username_exists(&mut *tx, username).await? {
            return Err(username_taken(username));
        }

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO profiles (username) VALUES ($1) RETURNING id",
        )
        .bind(username)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, username))?;

        tx.commit().await?;
        Ok(id)
    }

    async fn update_partial(&self, id: i64, update: &ProfileUpdate) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET location = COALESCE($2, location),
                preferred_activity = COALESCE($3, preferred_activity)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.location.as_deref())
        .bind(update.preferred_activity.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        manager::health_check(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn store() -> PgProfileStore {
        let config = DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").ok(),
            max_connections: 2,
            connection_timeout: 5,
        };
        let pool = manager::connect(&config).await.unwrap();
        let store = PgProfileStore::new(pool);
        store.ensure_schema().await.unwrap();
        sqlx::query("TRUNCATE profiles RESTART IDENTITY").execute(&store.pool).await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore = "needs TEST_DATABASE_URL pointing at a scratch Postgres"]
    async fn duplicate_check_runs_inside_insert() {
        let store = store().await;

        let id = store.insert_username_only("alice").await.unwrap();
        assert!(store.exists_by_username("alice").await.unwrap());
        assert!(!store.exists_by_username("bob").await.unwrap());

        assert!(matches!(
            store.insert_username_only("alice").await,
            Err(DatabaseError::Conflict(_))
        ));
        assert_eq!(store.list_recent(10).await.unwrap().len(), 1);
        assert_eq!(store.get_owner(id).await.unwrap(), "alice");
    }
}
