//! Configuration management
//!
//! Defaults, TOML file loading and `SESSCGI_*` environment overrides.

use crate::error::{ErrorContext, SessionError, SessionResult};
use crate::logging::LoggingConfig;
use crate::types::{SessionConfig, SesscgiConfig, SiteConfig, StoreBackend};

use std::path::{Path, PathBuf};

/// Names a TOML file to load instead of the built-in defaults
pub const CONFIG_PATH_ENV: &str = "SESSCGI_CONFIG";
pub const SESSION_DIR_ENV: &str = "SESSCGI_SESSION_DIR";
pub const COOKIE_NAME_ENV: &str = "SESSCGI_COOKIE_NAME";
pub const COOKIE_PATH_ENV: &str = "SESSCGI_COOKIE_PATH";
pub const LOG_LEVEL_ENV: &str = "SESSCGI_LOG_LEVEL";

impl Default for SesscgiConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            site: SiteConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let session_dir = dirs::data_local_dir()
            .map(|dir| dir.join("sesscgi").join("sessions"))
            .unwrap_or_else(|| std::env::temp_dir().join("sesscgi-sessions"));

        Self {
            cookie_name: "sesscgi_sess".to_string(),
            cookie_path: "/".to_string(),
            session_dir: session_dir.to_string_lossy().into_owned(),
            backend: StoreBackend::File,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            team: "sesscgi".to_string(),
            language: "Rust (Compiled)".to_string(),
        }
    }
}

impl SessionConfig {
    /// Session directory with a leading `~/` expanded
    pub fn session_dir_path(&self) -> PathBuf {
        match self.session_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.session_dir)),
            None => PathBuf::from(&self.session_dir),
        }
    }
}

/// Cookie names are RFC 7230 tokens
fn is_cookie_name(name: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={}";
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !SEPARATORS.contains(&b))
}

impl SesscgiConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SessionError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: SesscgiConfig = toml::from_str(&content).map_err(|e| SessionError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SessionResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SessionError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| SessionError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Resolve the effective configuration for this process:
    /// file named by `SESSCGI_CONFIG` (or defaults), then env overrides, then validation.
    pub fn load() -> SessionResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `SESSCGI_*` overrides; empty values are ignored
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(SESSION_DIR_ENV) {
            self.session.session_dir = dir;
        }
        if let Some(name) = get(COOKIE_NAME_ENV) {
            self.session.cookie_name = name.trim().to_string();
        }
        if let Some(path) = get(COOKIE_PATH_ENV) {
            self.session.cookie_path = path.trim().to_string();
        }
        if let Some(level) = get(LOG_LEVEL_ENV) {
            self.logging.level = level.trim().to_string();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SessionResult<()> {
        if !is_cookie_name(&self.session.cookie_name) {
            return Err(SessionError::Config {
                message: format!(
                    "Invalid cookie name {:?}: must be a non-empty token without separators",
                    self.session.cookie_name
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use letters, digits, '_' or '-' for session.cookie_name"),
            });
        }

        let path = &self.session.cookie_path;
        if !path.starts_with('/') || path.bytes().any(|b| b == b';' || b.is_ascii_control()) {
            return Err(SessionError::Config {
                message: format!("Invalid cookie path {:?}: must start with '/'", path),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.cookie_path to the application root, e.g. \"/\""),
            });
        }

        if self.session.backend == StoreBackend::File && self.session.session_dir.trim().is_empty()
        {
            return Err(SessionError::Config {
                message: "session_dir must be set for the file backend".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.session_dir or SESSCGI_SESSION_DIR"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = SesscgiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.cookie_path, "/");
        assert_eq!(config.session.backend, StoreBackend::File);
    }

    #[test]
    fn test_cookie_name_validation() {
        let mut config = SesscgiConfig::default();

        for bad in ["", "a;b", "a=b", "with space", "quo\"te"] {
            config.session.cookie_name = bad.to_string();
            match config.validate() {
                Err(SessionError::Config { message, .. }) => {
                    assert!(message.contains("cookie name"))
                }
                other => panic!("expected config error for {bad:?}, got {other:?}"),
            }
        }

        config.session.cookie_name = "go_sess_id".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cookie_path_validation() {
        let mut config = SesscgiConfig::default();
        config.session.cookie_path = "app".to_string();
        assert!(config.validate().is_err());

        config.session.cookie_path = "/app; Secure".to_string();
        assert!(config.validate().is_err());

        config.session.cookie_path = "/hw2".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (SESSION_DIR_ENV, "/srv/sessions"),
            (COOKIE_NAME_ENV, " rust_sess "),
            (COOKIE_PATH_ENV, ""),
            (LOG_LEVEL_ENV, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = SesscgiConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.session.session_dir, "/srv/sessions");
        assert_eq!(config.session.cookie_name, "rust_sess");
        assert_eq!(config.session.cookie_path, "/");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_session_dir_tilde_expansion() {
        let mut session = SessionConfig::default();
        session.session_dir = "/var/lib/sesscgi".to_string();
        assert_eq!(session.session_dir_path(), PathBuf::from("/var/lib/sesscgi"));

        session.session_dir = "~/sessions".to_string();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(session.session_dir_path(), home.join("sessions"));
        }
    }
}
