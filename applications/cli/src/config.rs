/// Host configuration
use crate::device::SimulatedDeviceConfig;
use anyhow::{Context, Result};
use cadence_client::ClientConfig;
use cadence_core::StaticIdentity;
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

/// Prefix of environment overrides, e.g. `CADENCE_STORAGE__PERSIST=false`
pub const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: ClientConfig,
    pub storage: StorageSettings,
    pub user: UserSettings,
    pub playback: PlaybackConfig,
    pub device: SimulatedDeviceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    pub database_url: String,

    /// Keep the snapshot and resume points across runs
    pub persist: bool,
}

/// Signed-in user, if any
///
/// Plays are only reported to the history when an email is set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserSettings {
    pub email: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/cadence.db".to_string(),
            persist: true,
        }
    }
}

impl StorageSettings {
    /// Filesystem path of the database, if the URL names one
    pub fn database_path(&self) -> Option<PathBuf> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);

        if path.is_empty() || path == ":memory:" {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path).required(true)),
            None => settings.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // Override with environment variables (CADENCE_SECTION__KEY)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn identity(&self) -> StaticIdentity {
        match self.user.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => StaticIdentity::user(email),
            _ => StaticIdentity::anonymous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{IdentityProvider, Quality};
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.catalog.base_url, "http://localhost:4000");
        assert!(config.storage.persist);
        assert_eq!(config.playback.volume, 0.8);
        assert!(config.identity().current_user().is_none());
    }

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[catalog]
base_url = "http://music.local:4000"

[user]
email = "listener@example.com"

[playback]
shuffle = true
quality = "high"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.catalog.base_url, "http://music.local:4000");
        assert_eq!(config.catalog.timeout_secs, 30);
        assert!(config.playback.shuffle);
        assert_eq!(config.playback.quality, Quality::High);
        assert_eq!(config.playback.volume, 0.8);
        assert_eq!(
            config.identity().current_user().as_deref(),
            Some("listener@example.com")
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn blank_email_is_anonymous() {
        let mut config = AppConfig::default();
        config.user.email = Some("  ".to_string());
        assert!(config.identity().current_user().is_none());
    }

    #[test]
    fn database_path() {
        let mut storage = StorageSettings::default();
        assert_eq!(storage.database_path(), Some(PathBuf::from("./data/cadence.db")));

        storage.database_url = "sqlite::memory:".to_string();
        assert_eq!(storage.database_path(), None);

        storage.database_url = "sqlite:///tmp/c.db?mode=rwc".to_string();
        assert_eq!(storage.database_path(), Some(PathBuf::from("/tmp/c.db")));
    }
}
