use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use sqlx::PgPool;

use super::store::{
    OwnerScope, OwnerSummary, ProfileRecord, StoreError, VersionStore, VersionSummary,
};
use crate::types::{OwnerId, ProfileVersion};

// Postgres error code for CREATE TABLE on an existing relation
const DUPLICATE_TABLE: &str = "42P07";

const CREATE_TABLE: &str = r#"
    CREATE TABLE profile_history (
        id              BIGSERIAL PRIMARY KEY,
        author          VARCHAR(255) NOT NULL,
        profile         VARCHAR(255) NOT NULL,
        profile_version TIMESTAMPTZ  NOT NULL DEFAULT clock_timestamp(),
        profile_content TEXT         NOT NULL
    )
"#;

const CREATE_INDEX: &str = r#"
    CREATE INDEX profile_history_profile_version_idx
        ON profile_history (profile, profile_version)
"#;

#[derive(sqlx::FromRow)]
struct VersionRow {
    profile_version: DateTime<Utc>,
    author: String,
}

impl From<VersionRow> for VersionSummary {
    fn from(row: VersionRow) -> Self {
        Self {
            profile_version: row.profile_version.into(),
            author: row.author,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContentRow {
    author: String,
    profile_version: DateTime<Utc>,
    profile_content: String,
}

impl TryFrom<ContentRow> for ProfileRecord {
    type Error = StoreError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let profile_content = RawValue::from_string(row.profile_content)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Self {
            author: row.author,
            profile_version: row.profile_version.into(),
            profile_content,
        })
    }
}

/// Profile versions in the `profile_history` Postgres table
#[derive(Clone)]
pub struct PgVersionStore {
    pool: PgPool,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_duplicate_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(DUPLICATE_TABLE),
        _ => false,
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn install(&self) -> Result<(), StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass('profile_history') IS NOT NULL")
            .fetch_one(&self.pool)
            .await?;
        if exists {
            return Err(StoreError::AlreadyInstalled);
        }

        let mut tx = self.pool.begin().await?;
        // A concurrent install can still win the race between the check and the CREATE
        sqlx::query(CREATE_TABLE)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_duplicate_table(&e) {
                    StoreError::AlreadyInstalled
                } else {
                    StoreError::Database(e)
                }
            })?;
        sqlx::query(CREATE_INDEX).execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!("Created profile_history table");
        Ok(())
    }

    async fn list_owners(&self, scope: OwnerScope<'_>) -> Result<Vec<OwnerSummary>, StoreError> {
        let owners = match scope {
            OwnerScope::All => {
                sqlx::query_as::<_, OwnerSummary>(
                    "SELECT DISTINCT profile FROM profile_history ORDER BY profile",
                )
                .fetch_all(&self.pool)
                .await?
            }
            OwnerScope::Only(subject) => {
                sqlx::query_as::<_, OwnerSummary>(
                    "SELECT DISTINCT profile FROM profile_history WHERE profile = $1 ORDER BY profile",
                )
                .bind(subject)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(owners)
    }

    async fn list_versions(&self, owner: &OwnerId) -> Result<Vec<VersionSummary>, StoreError> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT profile_version, author
            FROM profile_history
            WHERE profile = $1
            ORDER BY profile_version, id
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VersionSummary::from).collect())
    }

    async fn add_version(
        &self,
        owner: &OwnerId,
        author: &str,
        content: &RawValue,
    ) -> Result<VersionSummary, StoreError> {
        let row = sqlx::query_as::<_, VersionRow>(
            r#"
            INSERT INTO profile_history (author, profile, profile_version, profile_content)
            SELECT $1, $2,
                   GREATEST(clock_timestamp(), MAX(profile_version) + INTERVAL '1 microsecond'),
                   $3
            FROM profile_history
            WHERE profile = $2
            RETURNING profile_version, author
            "#,
        )
        .bind(author)
        .bind(owner.as_str())
        .bind(content.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_owner(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM profile_history WHERE profile = $1")
            .bind(owner.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_latest(&self, owner: &OwnerId) -> Result<Option<ProfileRecord>, StoreError> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT author, profile_version, profile_content
            FROM profile_history
            WHERE profile = $1
            ORDER BY profile_version DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProfileRecord::try_from).transpose()
    }

    async fn get_version(
        &self,
        owner: &OwnerId,
        version: ProfileVersion,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT author, profile_version, profile_content
            FROM profile_history
            WHERE profile = $1 AND profile_version = $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(owner.as_str())
        .bind(version.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProfileRecord::try_from).transpose()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
