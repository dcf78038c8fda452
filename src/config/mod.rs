use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::auth::parse_algorithm;

/// Placeholder secret shipped in sample `.env` files
pub const PLACEHOLDER_SECRET: &str = "changethis";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub proxmox: ProxmoxConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

impl Environment {
    /// Unset means `local`; anything set must name a known environment
    pub fn from_var(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw {
            None => Ok(Environment::Local),
            Some(value) => value.parse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub project_name: String,
    pub prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub email_reset_token_expire_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxmoxConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub token_name: String,
    #[serde(skip_serializing)]
    pub token_value: String,
    pub verify_ssl: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub first_superuser: Option<String>,
    #[serde(skip_serializing)]
    pub first_superuser_password: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY is still 'changethis'; set a real secret outside local environments")]
    PlaceholderSecret,

    #[error("SECRET_KEY must not be empty")]
    EmptySecret,

    #[error("Unknown ENVIRONMENT '{0}' (expected local, staging or production)")]
    UnknownEnvironment(String),

    #[error("Unsupported JWT algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var("ENVIRONMENT").ok();
        let environment = Environment::from_var(raw.as_deref())?;

        // Set defaults based on environment, then override with specific env vars
        Ok(Self::preset(environment).with_env_overrides())
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Local => Self::local(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("PROJECT_NAME") {
            self.api.project_name = v;
        }
        if let Ok(v) = env::var("API_V1_STR") {
            self.api.prefix = v;
        }
        if let Ok(v) = env::var("API_HOST") {
            self.api.host = v;
        }
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("BACKEND_CORS_ORIGINS") {
            self.api.cors_origins = v
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect();
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

        // Security overrides
        if let Ok(v) = env::var("SECRET_KEY") {
            self.security.secret_key = v;
        }
        if let Ok(v) = env::var("JWT_ALGORITHM") {
            self.security.algorithm = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.access_token_expire_minutes =
                v.parse().unwrap_or(self.security.access_token_expire_minutes);
        }
        if let Ok(v) = env::var("EMAIL_RESET_TOKEN_EXPIRE_HOURS") {
            self.security.email_reset_token_expire_hours =
                v.parse().unwrap_or(self.security.email_reset_token_expire_hours);
        }

        // Proxmox overrides
        if let Ok(v) = env::var("PROXMOX_HOST") {
            self.proxmox.host = v;
        }
        if let Ok(v) = env::var("PROXMOX_PORT") {
            self.proxmox.port = v.parse().unwrap_or(self.proxmox.port);
        }
        if let Ok(v) = env::var("PROXMOX_USER") {
            self.proxmox.user = v;
        }
        if let Ok(v) = env::var("PROXMOX_TOKEN_NAME") {
            self.proxmox.token_name = v;
        }
        if let Ok(v) = env::var("PROXMOX_TOKEN_VALUE") {
            self.proxmox.token_value = v;
        }
        if let Ok(v) = env::var("PROXMOX_VERIFY_SSL") {
            self.proxmox.verify_ssl = v.parse().unwrap_or(self.proxmox.verify_ssl);
        }
        if let Ok(v) = env::var("PROXMOX_TIMEOUT_SECS") {
            self.proxmox.timeout_secs = v.parse().unwrap_or(self.proxmox.timeout_secs);
        }

        // First superuser
        if let Ok(v) = env::var("FIRST_SUPERUSER") {
            self.bootstrap.first_superuser = Some(v);
        }
        if let Ok(v) = env::var("FIRST_SUPERUSER_PASSWORD") {
            self.bootstrap.first_superuser_password = Some(v);
        }

        self
    }

    /// Reject settings the server must not start with.
    ///
    /// The placeholder secret is tolerated in `local` with a warning so a
    /// fresh checkout still boots.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.secret_key.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.security.secret_key == PLACEHOLDER_SECRET {
            if self.environment == Environment::Local {
                tracing::warn!(
                    "SECRET_KEY is '{}'; change it before deploying",
                    PLACEHOLDER_SECRET
                );
            } else {
                return Err(ConfigError::PlaceholderSecret);
            }
        }
        parse_algorithm(&self.security.algorithm)?;
        Ok(())
    }

    pub fn is_local(&self) -> bool {
        self.environment == Environment::Local
    }

    pub fn local() -> Self {
        Self {
            environment: Environment::Local,
            api: ApiConfig {
                project_name: "PVE Portal".to_string(),
                prefix: "/api/v1".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8000,
                cors_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                ],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                secret_key: PLACEHOLDER_SECRET.to_string(),
                algorithm: "HS256".to_string(),
                access_token_expire_minutes: 60 * 24 * 8, // 8 days
                email_reset_token_expire_hours: 48,
            },
            proxmox: ProxmoxConfig {
                host: "localhost".to_string(),
                port: 8006,
                user: "root@pam".to_string(),
                token_name: String::new(),
                token_value: String::new(),
                verify_ssl: false,
                timeout_secs: 30,
            },
            bootstrap: BootstrapConfig {
                first_superuser: None,
                first_superuser_password: None,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::local();
        config.environment = Environment::Staging;
        config.api.cors_origins = vec![];
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.proxmox.verify_ssl = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::local();
        config.environment = Environment::Production;
        config.api.cors_origins = vec![];
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.proxmox.verify_ssl = true;
        config.proxmox.timeout_secs = 15;
        config
    }
}

// Global singleton config - initialized once at startup
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

// Convenience function for accessing config; fails on an unusable environment
pub fn config() -> Result<&'static AppConfig, ConfigError> {
    CONFIG.get_or_try_init(AppConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_local_config() {
        let config = AppConfig::local();
        assert!(config.is_local());
        assert_eq!(config.api.prefix, "/api/v1");
        assert_eq!(config.security.algorithm, "HS256");
        assert_eq!(config.security.access_token_expire_minutes, 11520);
        assert!(!config.proxmox.verify_ssl);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.is_local());
        assert!(config.proxmox.verify_ssl);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn environment_names_are_case_insensitive() {
        assert_eq!(Environment::from_var(None).unwrap(), Environment::Local);
        assert_eq!(
            Environment::from_var(Some("Production")).unwrap(),
            Environment::Production
        );
        assert_eq!(
            Environment::from_var(Some("STAGING")).unwrap(),
            Environment::Staging
        );
        assert_eq!(Environment::from_var(Some("local")).unwrap(), Environment::Local);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        for raw in ["prd", "PROD", "", "dev"] {
            assert!(
                matches!(
                    Environment::from_var(Some(raw)),
                    Err(ConfigError::UnknownEnvironment(ref v)) if v == raw
                ),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn production_preset_refuses_placeholder_and_private_routes() {
        let config = AppConfig::preset(Environment::from_var(Some("Production")).unwrap());
        assert!(!config.is_local());
        assert!(matches!(config.validate(), Err(ConfigError::PlaceholderSecret)));
    }

    #[test]
    fn placeholder_secret_only_allowed_locally() {
        let config = AppConfig::local();
        assert!(config.validate().is_ok());

        let config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::PlaceholderSecret)));

        let mut config = AppConfig::production();
        config.security.secret_key = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_asymmetric_algorithms() {
        let mut config = AppConfig::local();
        config.security.algorithm = "RS256".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedAlgorithm(alg)) if alg == "RS256"
        ));

        config.security.secret_key = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::EmptySecret)));
    }
}
