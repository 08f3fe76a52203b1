//! Sthana configuration.
//!
//! # Loading priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/sthana/sthana.yaml` (system-wide)
//! 3. `~/.config/sthana/sthana.yaml` (user)
//! 4. `./sthana.yaml` (project-local)
//! 5. `STHANA_CONFIG=/path/to/config.yaml` or `--config` (explicit, replaces 2-4)
//! 6. Environment variables (highest priority)
//!
//! # Example
//!
//! ```yaml
//! server:
//!   host: "0.0.0.0"
//!   port: 8080
//! auth:
//!   jwt_secret: "${STHANA_JWT_SECRET}"
//!   admin_email: "owner@example.org"
//! storage:
//!   dsn: "sqlite:sthana.db"
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
pub fn load() -> Result<SthanaConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<SthanaConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}
