//! Admin-vs-self access control for owner-scoped operations.

use crate::auth::Identity;
use crate::database::OwnerScope;
use crate::types::OwnerId;

/// Caller may not act on the requested owner. Carries nothing about the owner itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDenied;

/// Admins may act on any owner; everyone else only on the owner equal to their subject
pub fn authorize(identity: &Identity, owner: &OwnerId) -> Result<(), AccessDenied> {
    if identity.is_admin || owner.as_str() == identity.subject {
        Ok(())
    } else {
        tracing::warn!(
            subject = %identity.subject,
            owner = %owner,
            "Denied access to another user's profile"
        );
        Err(AccessDenied)
    }
}

/// Owners visible to the caller when listing
pub fn owner_scope(identity: &Identity) -> OwnerScope<'_> {
    if identity.is_admin {
        OwnerScope::All
    } else {
        OwnerScope::Only(&identity.subject)
    }
}
