use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::{IdentityConfig, IdentityMode};

pub mod access;
pub mod jwt;
pub mod oidc;

pub use jwt::JwtVerifier;
pub use oidc::OidcVerifier;

/// Caller identity as asserted by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub is_admin: bool,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider answered, and the token is not acceptable
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached or answered nonsense
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity verifier misconfigured: {0}")]
    Misconfigured(String),
}

/// Exchanges a bearer token for the identity it belongs to
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Which claim grants the admin capability, and the value that grants it
#[derive(Debug, Clone)]
pub struct AdminRule {
    pub claim: String,
    pub value: String,
}

impl AdminRule {
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self {
            claim: config.admin_claim.clone(),
            value: config.admin_value.clone(),
        }
    }

    /// `true` claim, a string equal to the admin value, or an array containing it
    pub fn is_admin(&self, claims: &Value) -> bool {
        match claims.get(&self.claim) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s == &self.value,
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| item.as_str() == Some(self.value.as_str())),
            _ => false,
        }
    }
}

/// Map a verified claim set to an identity
pub fn identity_from_claims(claims: &Value, rule: &AdminRule) -> Result<Identity, IdentityError> {
    let subject = claims
        .get("sub")
        .and_then(|v| v.as_str())
        // Kept as sent: owners are compared to it byte for byte
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| IdentityError::Rejected("required claim `sub` is missing or not a string".to_string()))?;

    Ok(Identity {
        subject: subject.to_string(),
        is_admin: rule.is_admin(claims),
    })
}

/// Build the verifier selected by `IDENTITY_MODE`
pub fn verifier_from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityVerifier>, IdentityError> {
    let verifier: Arc<dyn IdentityVerifier> = match config.mode {
        IdentityMode::Oidc => Arc::new(OidcVerifier::from_config(config)?),
        IdentityMode::Jwt => Arc::new(JwtVerifier::from_config(config)?),
    };
    Ok(verifier)
}
