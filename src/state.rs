use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::database::VersionStore;
use crate::middleware::CorsPolicy;

/// Shared, read-only handles every request works with
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VersionStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn VersionStore>,
        verifier: Arc<dyn IdentityVerifier>,
        cors: CorsPolicy,
    ) -> Self {
        Self {
            store,
            verifier,
            cors: Arc::new(cors),
        }
    }
}
