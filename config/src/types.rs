use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SthanaConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub collections: CollectionsConfig,
    pub logging: LoggingConfig,
}

impl SthanaConfig {
    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.jwt_secret is required (set it in the config file or STHANA_JWT_SECRET)"
                    .into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("server.port must be non-zero".into()));
        }
        for (key, name) in [
            ("collections.temples", &self.collections.temples),
            ("collections.users", &self.collections.users),
            ("collections.media", &self.collections.media),
        ] {
            if name.trim().is_empty() || name.contains('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "{key} must be a single non-empty path segment"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret used to verify identity tokens (HS256).
    pub jwt_secret: String,
    /// Expected `iss` claim. Empty disables the check.
    pub issuer: String,
    /// Expected `aud` claim. Empty disables the check.
    pub audience: String,
    /// Account granted admin access even without the admin claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or a SQLite DSN such as `sqlite:sthana.db`.
    pub dsn: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dsn: "memory".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub temples: String,
    pub users: String,
    /// Subcollection holding media asset records under each temple.
    pub media: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            temples: "temples".to_string(),
            users: "users".to_string(),
            media: "media".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            filter: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}
