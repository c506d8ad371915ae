use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::bootstrap::{FailurePolicy, ReadinessPolicy};

/// Boot-time configuration failures. Fatal in every environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    /// Only development gets fail-closed boot and automatic provisioning by
    /// default. Staging is treated like production.
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.is_development() {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Tolerant
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub auto_apply: bool,
    pub create_if_absent: bool,
}

impl DatabaseConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub token: TokenSettings,
}

/// Signing secret. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([redacted])")
    }
}

/// Everything the token service needs, fixed at boot.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: SigningSecret,
    pub issuer: String,
    pub audience: String,
    pub validity_secs: u64,
    pub clock_skew_secs: u64,
}

impl TokenSettings {
    pub const DEFAULT_VALIDITY_SECS: u64 = 3600;
    /// One year.
    pub const MAX_VALIDITY_SECS: u64 = 365 * 24 * 3600;
    pub const MAX_CLOCK_SKEW_SECS: u64 = 3600;

    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: SigningSecret::new(secret),
            issuer: issuer.into(),
            audience: audience.into(),
            validity_secs: Self::DEFAULT_VALIDITY_SECS,
            clock_skew_secs: 0,
        }
    }

    pub fn with_validity_secs(mut self, secs: u64) -> Self {
        self.validity_secs = secs;
        self
    }

    pub fn with_clock_skew_secs(mut self, secs: u64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    /// Reject lifetimes that cannot produce a usable expiry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validity_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_VALIDITY_SECS",
                reason: "token validity must be greater than zero".to_string(),
            });
        }
        if self.validity_secs > Self::MAX_VALIDITY_SECS {
            return Err(ConfigError::Invalid {
                key: "JWT_VALIDITY_SECS",
                reason: format!("token validity must not exceed {} seconds", Self::MAX_VALIDITY_SECS),
            });
        }
        if self.clock_skew_secs > Self::MAX_CLOCK_SKEW_SECS {
            return Err(ConfigError::Invalid {
                key: "JWT_CLOCK_SKEW_SECS",
                reason: format!("clock skew must not exceed {} seconds", Self::MAX_CLOCK_SKEW_SECS),
            });
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Environment defaults
    /// are applied first, then individual overrides.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_name(lookup("APP_ENV").as_deref());
        let token = Self::token_settings(&lookup)?;

        let base = match environment {
            Environment::Production => Self::production(token),
            Environment::Staging => Self::staging(token),
            Environment::Development => Self::development(token),
        };

        Ok(base.with_overrides(&lookup))
    }

    fn token_settings<F>(lookup: &F) -> Result<TokenSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ConfigError::Missing(key)),
            }
        };

        let mut settings = TokenSettings::new(
            required("JWT_SECRET")?,
            required("JWT_ISSUER")?,
            required("JWT_AUDIENCE")?,
        );

        if let Some(v) = lookup("JWT_VALIDITY_SECS") {
            settings.validity_secs = v.parse().unwrap_or(settings.validity_secs);
        }
        if let Some(v) = lookup("JWT_CLOCK_SKEW_SECS") {
            settings.clock_skew_secs = v.parse().unwrap_or(settings.clock_skew_secs);
        }

        settings.validate()?;
        Ok(settings)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_AUTO_APPLY") {
            self.database.auto_apply = v.parse().unwrap_or(self.database.auto_apply);
        }
        if let Some(v) = lookup("DATABASE_CREATE_IF_ABSENT") {
            self.database.create_if_absent = v.parse().unwrap_or(self.database.create_if_absent);
        }

        // API overrides
        if let Some(v) = lookup("HUB_API_PORT").or_else(|| lookup("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// Readiness policy for the boot orchestrator.
    pub fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            auto_apply: self.database.auto_apply,
            create_if_absent: self.database.create_if_absent,
            failure: self.environment.failure_policy(),
        }
    }

    fn development(token: TokenSettings) -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                auto_apply: true,
                create_if_absent: true,
            },
            api: ApiConfig { port: 3000 },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string()],
                token,
            },
        }
    }

    fn staging(token: TokenSettings) -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                auto_apply: false,
                create_if_absent: false,
            },
            api: ApiConfig { port: 3000 },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                token,
            },
        }
    }

    fn production(token: TokenSettings) -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                auto_apply: false,
                create_if_absent: false,
            },
            api: ApiConfig { port: 3000 },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                token,
            },
        }
    }
}
