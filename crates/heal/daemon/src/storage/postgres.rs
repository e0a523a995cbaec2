//! PostgreSQL storage implementation

use super::traits::*;
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heal_types::{PrincipalId, UserProfile};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;

/// PostgreSQL-backed profile store
#[derive(Debug, Clone)]
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                identity_id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }

    fn profile_from_row(row: &sqlx::postgres::PgRow) -> StorageResult<UserProfile> {
        let get_err = |e: sqlx::Error| StorageError::InvalidData(e.to_string());
        let identity_id: String = row.try_get("identity_id").map_err(get_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(get_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(get_err)?;
        Ok(UserProfile {
            identity_id: PrincipalId::new(identity_id),
            email: row.try_get("email").map_err(get_err)?,
            full_name: row.try_get("full_name").map_err(get_err)?,
            role: row.try_get("role").map_err(get_err)?,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn get_profile(&self, id: &PrincipalId) -> StorageResult<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT identity_id, email, full_name, role, created_at, updated_at \
             FROM user_profiles WHERE identity_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        row.as_ref().map(Self::profile_from_row).transpose()
    }

    async fn upsert_profile(&self, profile: UserProfile) -> StorageResult<UserProfile> {
        // created_at is only written on insert
        let row = sqlx::query(
            r#"
            INSERT INTO user_profiles (identity_id, email, full_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (identity_id)
            DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                updated_at = EXCLUDED.updated_at
            RETURNING identity_id, email, full_name, role, created_at, updated_at
            "#,
        )
        .bind(profile.identity_id.as_str())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.role)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Self::profile_from_row(&row)
    }

    async fn count_profiles(&self) -> StorageResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(count.max(0) as usize)
    }
}
