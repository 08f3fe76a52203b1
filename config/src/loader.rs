use crate::{ConfigError, LogLevel, SthanaConfig};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        #[cfg(unix)]
        search_paths.push(PathBuf::from("/etc/sthana/sthana.yaml"));

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/sthana/sthana.yaml"));
        }
        search_paths.push(PathBuf::from("./sthana.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Load one explicit file (`with_file`, else `STHANA_CONFIG`) or merge the
    /// search paths, then apply `STHANA_*` environment overrides.
    pub fn load(&self) -> Result<SthanaConfig, ConfigError> {
        let from_env = std::env::var("STHANA_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let mut config = match self.explicit_file.clone().or(from_env) {
            Some(path) => self.load_file(&path)?,
            None => self.load_search_paths()?,
        };

        self.apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(&self, path: &Path) -> Result<SthanaConfig, ConfigError> {
        let config = self.parse_yaml(&read_file(path)?)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn load_search_paths(&self) -> Result<SthanaConfig, ConfigError> {
        let mut config = SthanaConfig::default();
        for path in &self.search_paths {
            if path.exists() {
                config = self.merge_yaml(&config, &read_file(path)?)?;
                tracing::debug!(path = %path.display(), "Merged config file");
            }
        }
        Ok(config)
    }

    fn parse_yaml(&self, content: &str) -> Result<SthanaConfig, ConfigError> {
        let expanded = self.expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(&self, base: &SthanaConfig, content: &str) -> Result<SthanaConfig, ConfigError> {
        let overlay = self.parse_yaml(content)?;
        Ok(Self::merge_configs(base, &overlay))
    }

    /// Later files win for every value they set away from the default.
    fn merge_configs(base: &SthanaConfig, overlay: &SthanaConfig) -> SthanaConfig {
        let defaults = SthanaConfig::default();
        let mut result = base.clone();

        if overlay.server.host != defaults.server.host {
            result.server.host.clone_from(&overlay.server.host);
        }
        if overlay.server.port != defaults.server.port {
            result.server.port = overlay.server.port;
        }
        if !overlay.server.cors_origins.is_empty() {
            result.server.cors_origins.clone_from(&overlay.server.cors_origins);
        }
        if overlay.server.request_timeout_secs != defaults.server.request_timeout_secs {
            result.server.request_timeout_secs = overlay.server.request_timeout_secs;
        }
        if !overlay.auth.jwt_secret.is_empty() {
            result.auth.jwt_secret.clone_from(&overlay.auth.jwt_secret);
        }
        if !overlay.auth.issuer.is_empty() {
            result.auth.issuer.clone_from(&overlay.auth.issuer);
        }
        if !overlay.auth.audience.is_empty() {
            result.auth.audience.clone_from(&overlay.auth.audience);
        }
        if overlay.auth.admin_email.is_some() {
            result.auth.admin_email.clone_from(&overlay.auth.admin_email);
        }
        if overlay.storage.dsn != defaults.storage.dsn {
            result.storage.dsn.clone_from(&overlay.storage.dsn);
        }
        if overlay.collections.temples != defaults.collections.temples {
            result.collections.temples.clone_from(&overlay.collections.temples);
        }
        if overlay.collections.users != defaults.collections.users {
            result.collections.users.clone_from(&overlay.collections.users);
        }
        if overlay.collections.media != defaults.collections.media {
            result.collections.media.clone_from(&overlay.collections.media);
        }
        if overlay.logging.level != defaults.logging.level
            || overlay.logging.format != defaults.logging.format
            || !overlay.logging.filter.is_empty()
        {
            result.logging = overlay.logging.clone();
        }

        result
    }

    fn expand_env_vars(&self, content: &str) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));
        re.replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
    }

    fn apply_env_overrides<F>(&self, config: &mut SthanaConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("STHANA_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("STHANA_PORT") {
            match port.parse() {
                Ok(p) => config.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid STHANA_PORT"),
            }
        }
        if let Some(secret) = lookup("STHANA_JWT_SECRET") {
            if !secret.is_empty() {
                config.auth.jwt_secret = secret;
            }
        }
        if let Some(email) = lookup("STHANA_ADMIN_EMAIL") {
            if !email.is_empty() {
                config.auth.admin_email = Some(email);
            }
        }
        if let Some(dsn) = lookup("STHANA_DSN") {
            if !dsn.is_empty() {
                config.storage.dsn = dsn;
            }
        }
        if let Some(level) = lookup("STHANA_LOG_LEVEL") {
            if let Ok(l) = serde_yaml::from_str::<LogLevel>(&level) {
                config.logging.level = l;
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}
