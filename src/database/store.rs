use async_trait::async_trait;
use serde::Serialize;
use serde_json::value::RawValue;
use thiserror::Error;

use crate::types::{OwnerId, ProfileVersion};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("The profile_history table already exists")]
    AlreadyInstalled,

    #[error("Stored profile content is not valid JSON: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Which owners a listing may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope<'a> {
    All,
    Only(&'a str),
}

impl OwnerScope<'_> {
    pub fn includes(&self, owner: &str) -> bool {
        match self {
            OwnerScope::All => true,
            OwnerScope::Only(subject) => *subject == owner,
        }
    }
}

/// One entry of the owner listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OwnerSummary {
    pub profile: String,
}

/// One entry of an owner's version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSummary {
    pub profile_version: ProfileVersion,
    pub author: String,
}

/// A full version, content included. `profile_content` is emitted as the stored document itself.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    pub author: String,
    pub profile_version: ProfileVersion,
    pub profile_content: Box<RawValue>,
}

/// Append-only storage of profile versions.
///
/// Versions of one owner are ordered by `(profile_version, id)`; rows are
/// never updated, and deletion always covers every version of an owner.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Create the backing table. Fails with `AlreadyInstalled` the second time.
    async fn install(&self) -> Result<(), StoreError>;

    async fn list_owners(&self, scope: OwnerScope<'_>) -> Result<Vec<OwnerSummary>, StoreError>;

    /// Oldest first. Empty when the owner has no versions.
    async fn list_versions(&self, owner: &OwnerId) -> Result<Vec<VersionSummary>, StoreError>;

    /// `content` must already be valid JSON; it is stored byte for byte
    async fn add_version(
        &self,
        owner: &OwnerId,
        author: &str,
        content: &RawValue,
    ) -> Result<VersionSummary, StoreError>;

    /// Returns how many versions were removed; zero is not an error
    async fn delete_owner(&self, owner: &OwnerId) -> Result<u64, StoreError>;

    async fn get_latest(&self, owner: &OwnerId) -> Result<Option<ProfileRecord>, StoreError>;

    /// Newest insert wins if several versions share the timestamp
    async fn get_version(
        &self,
        owner: &OwnerId,
        version: ProfileVersion,
    ) -> Result<Option<ProfileRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
