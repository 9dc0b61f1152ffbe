use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use super::{identity_from_claims, AdminRule, Identity, IdentityError, IdentityVerifier};
use crate::config::IdentityConfig;

/// Verifies access tokens by calling the provider's OpenID Connect userinfo endpoint.
///
/// The endpoint is either configured directly or discovered once from
/// `{provider}/.well-known/openid-configuration` and cached for the life of
/// the process.
pub struct OidcVerifier {
    http: reqwest::Client,
    provider: Option<Url>,
    userinfo: RwLock<Option<Url>>,
    admin: AdminRule,
}

#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    userinfo_endpoint: String,
}

impl OidcVerifier {
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let provider = config.oidc_provider.as_deref().map(parse_url).transpose()?;
        let userinfo = config.oidc_userinfo_url.as_deref().map(parse_url).transpose()?;

        if provider.is_none() && userinfo.is_none() {
            return Err(IdentityError::Misconfigured(
                "oidc requires OIDC_PROVIDER or OIDC_USERINFO_URL".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Misconfigured(format!("failed to initialize oidc http client: {}", e)))?;

        Ok(Self {
            http,
            provider,
            userinfo: RwLock::new(userinfo),
            admin: AdminRule::from_config(config),
        })
    }

    async fn userinfo_endpoint(&self) -> Result<Url, IdentityError> {
        {
            let cached = self.userinfo.read().await;
            if let Some(url) = cached.as_ref() {
                return Ok(url.clone());
            }
        }

        let mut cached = self.userinfo.write().await;
        if let Some(url) = cached.as_ref() {
            return Ok(url.clone());
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            IdentityError::Misconfigured("no oidc provider to discover from".to_string())
        })?;
        let discovery = discovery_url(provider);

        let metadata = self
            .http
            .get(discovery.clone())
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("failed to fetch {}: {}", discovery, e)))?
            .error_for_status()
            .map_err(|e| IdentityError::Unavailable(format!("discovery returned non-success status: {}", e)))?
            .json::<ProviderMetadata>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("failed to parse provider metadata: {}", e)))?;

        let url = Url::parse(&metadata.userinfo_endpoint).map_err(|_| {
            IdentityError::Unavailable(format!(
                "provider advertised an invalid userinfo_endpoint {:?}",
                metadata.userinfo_endpoint
            ))
        })?;

        tracing::info!("Discovered OIDC userinfo endpoint: {}", url);
        *cached = Some(url.clone());
        Ok(url)
    }
}

#[async_trait]
impl IdentityVerifier for OidcVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let endpoint = self.userinfo_endpoint().await?;

        let response = self
            .http
            .get(endpoint)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("userinfo request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(IdentityError::Rejected(format!("userinfo endpoint returned {}", status)));
        }
        if !status.is_success() {
            return Err(IdentityError::Unavailable(format!("userinfo endpoint returned {}", status)));
        }

        let claims = response
            .json::<Value>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("failed to parse userinfo response: {}", e)))?;

        let identity = identity_from_claims(&claims, &self.admin)?;
        tracing::debug!(subject = %identity.subject, is_admin = identity.is_admin, "Verified access token");
        Ok(identity)
    }
}

fn parse_url(raw: &str) -> Result<Url, IdentityError> {
    Url::parse(raw).map_err(|_| IdentityError::Misconfigured(format!("invalid url {:?}", raw)))
}

fn discovery_url(provider: &Url) -> Url {
    let mut url = provider.clone();
    let path = format!(
        "{}/.well-known/openid-configuration",
        provider.path().trim_end_matches('/')
    );
    url.set_path(&path);
    url
}
