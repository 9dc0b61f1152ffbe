use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub api_prefix: String,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    /// Pool acquire timeout, seconds
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMode {
    /// Exchange the token at the provider's userinfo endpoint
    Oidc,
    /// Validate an HS256 JWT locally
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    pub oidc_provider: Option<String>,
    pub oidc_userinfo_url: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub admin_claim: String,
    pub admin_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("PROFILE_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_PREFIX") {
            self.server.api_prefix = v;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Identity overrides
        match env::var("IDENTITY_MODE").as_deref() {
            Ok("jwt") => self.identity.mode = IdentityMode::Jwt,
            Ok("oidc") => self.identity.mode = IdentityMode::Oidc,
            _ => {}
        }
        if let Ok(v) = env::var("OIDC_PROVIDER") {
            self.identity.oidc_provider = Some(v);
        }
        if let Ok(v) = env::var("OIDC_USERINFO_URL") {
            self.identity.oidc_userinfo_url = Some(v);
        }
        if let Ok(v) = env::var("IDENTITY_TIMEOUT_SECS") {
            self.identity.timeout_secs = v.parse().unwrap_or(self.identity.timeout_secs);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.identity.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.identity.jwt_issuer = Some(v);
        }
        if let Ok(v) = env::var("IDENTITY_ADMIN_CLAIM") {
            self.identity.admin_claim = v;
        }
        if let Ok(v) = env::var("IDENTITY_ADMIN_VALUE") {
            self.identity.admin_value = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = parse_origins(&v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                api_prefix: "/api/v1".to_string(),
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            identity: IdentityConfig::default(),
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                api_prefix: "/api/v1".to_string(),
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            identity: IdentityConfig::default(),
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                api_prefix: "/api/v1".to_string(),
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            identity: IdentityConfig::default(),
            security: SecurityConfig {
                cors_origins: Vec::new(),
            },
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Oidc,
            oidc_provider: None,
            oidc_userinfo_url: None,
            timeout_secs: 10,
            jwt_secret: String::new(),
            jwt_issuer: None,
            admin_claim: "groups".to_string(),
            admin_value: "admin".to_string(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
