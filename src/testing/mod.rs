//! In-memory stand-ins for the store and the identity provider, plus app builders for tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::Router;
use chrono::Duration;
use serde_json::value::RawValue;

use crate::auth::{Identity, IdentityError, IdentityVerifier};
use crate::config::ServerConfig;
use crate::database::{
    OwnerScope, OwnerSummary, ProfileRecord, StoreError, VersionStore, VersionSummary,
};
use crate::middleware::CorsPolicy;
use crate::routes;
use crate::state::AppState;
use crate::types::{OwnerId, ProfileVersion};

/// Origin the test apps allow
pub const TEST_ORIGIN: &str = "https://profiles.example";

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const ADMIN_TOKEN: &str = "admin-token";

struct StoredVersion {
    id: u64,
    owner: String,
    author: String,
    version: ProfileVersion,
    content: String,
}

#[derive(Default)]
struct MemoryState {
    installed: bool,
    next_id: u64,
    rows: Vec<StoredVersion>,
}

/// Version store backed by a mutex-guarded vector, with the same ordering rules as Postgres
#[derive(Default)]
pub struct MemoryVersionStore {
    state: Mutex<MemoryState>,
    broken: AtomicBool,
}

impl MemoryVersionStore {
    /// A store whose table already exists
    pub fn new() -> Self {
        let store = Self::default();
        store.lock().installed = true;
        store
    }

    /// A store that still needs `install`
    pub fn uninstalled() -> Self {
        Self::default()
    }

    /// Make every following call fail the way an unreachable database does
    pub fn break_connection(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn version_count(&self) -> usize {
        self.lock().rows.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ready(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let state = self.lock();
        if !state.installed {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "relation \"profile_history\" does not exist".to_string(),
            )));
        }
        Ok(state)
    }
}

fn record(row: &StoredVersion) -> Result<ProfileRecord, StoreError> {
    let profile_content =
        RawValue::from_string(row.content.clone()).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(ProfileRecord {
        author: row.author.clone(),
        profile_version: row.version,
        profile_content,
    })
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn install(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut state = self.lock();
        if state.installed {
            return Err(StoreError::AlreadyInstalled);
        }
        state.installed = true;
        Ok(())
    }

    async fn list_owners(&self, scope: OwnerScope<'_>) -> Result<Vec<OwnerSummary>, StoreError> {
        let state = self.ready()?;
        let owners: BTreeSet<&str> = state
            .rows
            .iter()
            .map(|row| row.owner.as_str())
            .filter(|owner| scope.includes(owner))
            .collect();
        Ok(owners
            .into_iter()
            .map(|profile| OwnerSummary {
                profile: profile.to_string(),
            })
            .collect())
    }

    async fn list_versions(&self, owner: &OwnerId) -> Result<Vec<VersionSummary>, StoreError> {
        let state = self.ready()?;
        let mut rows: Vec<&StoredVersion> = state
            .rows
            .iter()
            .filter(|row| row.owner == owner.as_str())
            .collect();
        rows.sort_by_key(|row| (row.version, row.id));
        Ok(rows
            .into_iter()
            .map(|row| VersionSummary {
                profile_version: row.version,
                author: row.author.clone(),
            })
            .collect())
    }

    async fn add_version(
        &self,
        owner: &OwnerId,
        author: &str,
        content: &RawValue,
    ) -> Result<VersionSummary, StoreError> {
        let mut state = self.ready()?;

        // Same rule as the Postgres insert: an owner's versions strictly increase
        let mut version = ProfileVersion::now();
        let last = state
            .rows
            .iter()
            .filter(|row| row.owner == owner.as_str())
            .map(|row| row.version)
            .max();
        if let Some(last) = last {
            if version <= last {
                version = ProfileVersion::new(last.timestamp() + Duration::microseconds(1));
            }
        }

        state.next_id += 1;
        let id = state.next_id;
        state.rows.push(StoredVersion {
            id,
            owner: owner.as_str().to_string(),
            author: author.to_string(),
            version,
            content: content.get().to_string(),
        });

        Ok(VersionSummary {
            profile_version: version,
            author: author.to_string(),
        })
    }

    async fn delete_owner(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        let mut state = self.ready()?;
        let before = state.rows.len();
        state.rows.retain(|row| row.owner != owner.as_str());
        Ok((before - state.rows.len()) as u64)
    }

    async fn get_latest(&self, owner: &OwnerId) -> Result<Option<ProfileRecord>, StoreError> {
        let state = self.ready()?;
        state
            .rows
            .iter()
            .filter(|row| row.owner == owner.as_str())
            .max_by_key(|row| (row.version, row.id))
            .map(record)
            .transpose()
    }

    async fn get_version(
        &self,
        owner: &OwnerId,
        version: ProfileVersion,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        let state = self.ready()?;
        state
            .rows
            .iter()
            .filter(|row| row.owner == owner.as_str() && row.version == version)
            .max_by_key(|row| row.id)
            .map(record)
            .transpose()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Identity provider with a fixed token table
#[derive(Debug, Default)]
pub struct StaticVerifier {
    identities: HashMap<String, Identity>,
    unavailable: bool,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `alice` and `bob` as plain users, `root` as admin
    pub fn standard() -> Self {
        Self::new()
            .with_user(ALICE_TOKEN, "alice")
            .with_user(BOB_TOKEN, "bob")
            .with_admin(ADMIN_TOKEN, "root")
    }

    /// A provider that cannot be reached
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_user(self, token: &str, subject: &str) -> Self {
        self.with_identity(token, subject, false)
    }

    pub fn with_admin(self, token: &str, subject: &str) -> Self {
        self.with_identity(token, subject, true)
    }

    fn with_identity(mut self, token: &str, subject: &str, is_admin: bool) -> Self {
        self.identities.insert(
            token.to_string(),
            Identity {
                subject: subject.to_string(),
                is_admin,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        if self.unavailable {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("unknown token".to_string()))
    }
}

/// Server settings used by test apps: default prefix, 1 MiB body limit
pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        api_prefix: "/api/v1".to_string(),
        max_request_size_bytes: 1024 * 1024,
    }
}

pub fn test_state(store: Arc<dyn VersionStore>, verifier: StaticVerifier) -> AppState {
    AppState::new(store, Arc::new(verifier), CorsPolicy::new([TEST_ORIGIN]))
}

/// Full application router over the given store and verifier
pub fn test_app(store: Arc<dyn VersionStore>, verifier: StaticVerifier) -> Router {
    routes::app(test_state(store, verifier), &test_server_config())
}
