use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use super::{identity_from_claims, AdminRule, Identity, IdentityError, IdentityVerifier};
use crate::config::IdentityConfig;

/// Validates HS256 access tokens against a shared secret
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    admin: AdminRule,
}

impl JwtVerifier {
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        if config.jwt_secret.is_empty() {
            return Err(IdentityError::Misconfigured("JWT secret not configured".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = config.jwt_issuer.as_ref() {
            validation.set_issuer(std::slice::from_ref(issuer));
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            admin: AdminRule::from_config(config),
        })
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let token_data = decode::<Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| IdentityError::Rejected(format!("Invalid JWT token: {}", e)))?;

        identity_from_claims(&token_data.claims, &self.admin)
    }
}
