//! Configuration management.
//!
//! Configuration is read from a TOML file and then overridden by
//! `GROUPGATE_*` environment variables.
//!
//! ```toml
//! database_path = "/var/lib/groupgate/groups.db"
//! default_realm = "zulip"
//!
//! [logging]
//! format = "json"
//! filter = "groupgate=debug"
//!
//! [metrics]
//! enabled = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::RealmId;

/// Environment variable naming the group database.
pub const DATABASE_ENV: &str = "GROUPGATE_DATABASE";

/// Environment variable naming the default realm.
pub const REALM_ENV: &str = "GROUPGATE_REALM";

/// Main configuration for groupgate.
#[derive(Debug, Clone, Default)]
pub struct GroupGateConfig {
    /// Path to the `SQLite` group database.
    pub database_path: Option<PathBuf>,
    /// Realm used by the CLI when none is given.
    pub default_realm: Option<RealmId>,
    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

/// Logging and metrics settings as written in the config file.
#[derive(Debug, Clone, Default)]
pub struct ObservabilitySettings {
    /// Log output format: "pretty", "compact" or "json".
    pub log_format: Option<String>,
    /// `tracing-subscriber` filter directive.
    pub log_filter: Option<String>,
    /// Whether to install the Prometheus recorder.
    pub metrics_enabled: Option<bool>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub database_path: Option<String>,
    /// Default realm.
    pub default_realm: Option<String>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Output format.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMetrics {
    /// Whether metrics are enabled.
    pub enabled: Option<bool>,
}

impl GroupGateConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::parse_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn parse_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<config dir>/groupgate/config.toml`, then
    /// `~/.config/groupgate/config.toml`. Returns the defaults if neither
    /// exists or parses.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("groupgate").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("groupgate")
                .join("config.toml"),
        ];

        for path in &candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Applies `GROUPGATE_DATABASE` and `GROUPGATE_REALM` overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = non_empty_env(DATABASE_ENV) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(realm) = non_empty_env(REALM_ENV) {
            self.default_realm = Some(RealmId::new(realm));
        }
        self
    }

    /// Converts a `ConfigFile` to `GroupGateConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        config.database_path = file.database_path.map(PathBuf::from);
        config.default_realm = file.default_realm.map(RealmId::new);
        if let Some(logging) = file.logging {
            config.observability.log_format = logging.format;
            config.observability.log_filter = logging.filter;
        }
        if let Some(metrics) = file.metrics {
            config.observability.metrics_enabled = metrics.enabled;
        }

        config
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the default realm.
    #[must_use]
    pub fn with_default_realm(mut self, realm: impl Into<RealmId>) -> Self {
        self.default_realm = Some(realm.into());
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = GroupGateConfig::parse_toml(
            r#"
            database_path = "/tmp/groups.db"
            default_realm = "zulip"

            [logging]
            format = "json"
            filter = "groupgate=debug"

            [metrics]
            enabled = true
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/groups.db")));
        assert_eq!(config.default_realm, Some(RealmId::new("zulip")));
        assert_eq!(config.observability.log_format.as_deref(), Some("json"));
        assert_eq!(
            config.observability.log_filter.as_deref(),
            Some("groupgate=debug")
        );
        assert_eq!(config.observability.metrics_enabled, Some(true));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = GroupGateConfig::parse_toml("").expect("Failed to parse config");
        assert!(config.database_path.is_none());
        assert!(config.observability.metrics_enabled.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = GroupGateConfig::parse_toml("databse_path = \"typo\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_realm = \"lear\"\n").expect("Failed to write config");

        let config = GroupGateConfig::load_from_file(&path).expect("Failed to load config");
        assert_eq!(config.default_realm, Some(RealmId::new("lear")));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = GroupGateConfig::load_from_file(Path::new("/nonexistent/groupgate.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_builders() {
        let config = GroupGateConfig::new()
            .with_database_path("/data/groups.db")
            .with_default_realm("zulip");
        assert_eq!(config.database_path, Some(PathBuf::from("/data/groups.db")));
        assert_eq!(config.default_realm, Some(RealmId::new("zulip")));
    }
}
