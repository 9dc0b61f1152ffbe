pub mod manager;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use postgres::PgVersionStore;
pub use store::{OwnerScope, OwnerSummary, ProfileRecord, StoreError, VersionStore, VersionSummary};
