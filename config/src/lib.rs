//! Settings that describe where we talk to and how often we look at the screen.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then the
//! environment. Later layers win.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use ow_integrations::Log;
use ow_screen::Resolution;

const DEFAULT_API_URL: &str = "https://api.spotify.com";
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_REDIRECT_URI: &str = "https://localhost/";
const DEFAULT_SCOPE: &str = "user-modify-playback-state";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Environment variable that overrides the Web API base URL.
pub const API_URL_VAR: &str = "SPOTIFY_API_URL";

/// Environment variable that overrides the accounts service base URL.
pub const ACCOUNTS_URL_VAR: &str = "SPOTIFY_ACCOUNTS_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read settings file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse settings file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Resolved settings for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSettings {
    pub api_url: String,
    pub accounts_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub poll_interval: Duration,
    pub resolution: Resolution,
}

/// One layer of settings. Every field is optional so that layers can be merged.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsLayer {
    api_url: Option<String>,
    accounts_url: Option<String>,
    redirect_uri: Option<String>,
    scopes: Option<Vec<String>>,
    poll_interval_ms: Option<u64>,
    resolution: Option<Resolution>,
}

impl SettingsLayer {
    /// Merges two layers. Values in `other` take precedence.
    fn merge(self, other: Self) -> Self {
        Self {
            api_url: other.api_url.or(self.api_url),
            accounts_url: other.accounts_url.or(self.accounts_url),
            redirect_uri: other.redirect_uri.or(self.redirect_uri),
            scopes: other.scopes.or(self.scopes),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            resolution: other.resolution.or(self.resolution),
        }
    }

    fn builtin() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.into()),
            accounts_url: Some(DEFAULT_ACCOUNTS_URL.into()),
            redirect_uri: Some(DEFAULT_REDIRECT_URI.into()),
            scopes: Some(vec![DEFAULT_SCOPE.into()]),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            resolution: Some(Resolution::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Only the endpoints can be set from the environment. Empty values are ignored.
    fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            api_url: var(API_URL_VAR),
            accounts_url: var(ACCOUNTS_URL_VAR),
            ..Default::default()
        }
    }

    fn resolve(self) -> Result<AppSettings, ConfigError> {
        let defaults = Self::builtin();
        let layer = defaults.merge(self);

        let scopes = layer.scopes.unwrap_or_default();
        if scopes.is_empty() {
            return Err(ConfigError::Invalid("at least one scope is required".into()));
        }

        let poll_interval_ms = layer.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be greater than zero".into()));
        }

        Ok(AppSettings {
            api_url: layer.api_url.unwrap_or_else(|| DEFAULT_API_URL.into()),
            accounts_url: layer.accounts_url.unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.into()),
            redirect_uri: layer.redirect_uri.unwrap_or_else(|| DEFAULT_REDIRECT_URI.into()),
            scopes,
            poll_interval: Duration::from_millis(poll_interval_ms),
            resolution: layer.resolution.unwrap_or_default(),
        })
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            accounts_url: DEFAULT_ACCOUNTS_URL.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            scopes: vec![DEFAULT_SCOPE.into()],
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            resolution: Resolution::default(),
        }
    }
}

impl AppSettings {
    /// Loads settings from the built-in defaults, `path` (if given) and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// As `load`, but with environment lookups going through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) => {
                tracing::info!(target: Log::App, ?path, "Loading settings file");
                SettingsLayer::from_file(path)?
            },

            None => SettingsLayer::default(),
        };

        let settings = file.merge(SettingsLayer::from_env(lookup)).resolve()?;
        tracing::debug!(target: Log::App, ?settings, "Resolved settings");

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_file_or_env() {
        let settings = AppSettings::load_with(None, no_env).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn file_overrides_defaults_and_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        fs::write(
            &path,
            r#"
api_url = "http://file.invalid"
accounts_url = "http://accounts-file.invalid"
poll_interval_ms = 250
resolution = "1080p"
"#,
        )
        .unwrap();

        let settings = AppSettings::load_with(Some(&path), |key| match key {
            API_URL_VAR => Some("http://env.invalid".into()),
            ACCOUNTS_URL_VAR => Some("  ".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(settings.api_url, "http://env.invalid");
        assert_eq!(settings.accounts_url, "http://accounts-file.invalid");
        assert_eq!(settings.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.resolution, Resolution::FullHd);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        assert!(matches!(
            AppSettings::load_with(Some(&path), no_env),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        fs::write(&path, "api_uri = \"typo\"\n").unwrap();
        assert!(matches!(AppSettings::load_with(Some(&path), no_env), Err(ConfigError::Parse { .. })));

        fs::write(&path, "poll_interval_ms = 0\n").unwrap();
        assert!(matches!(AppSettings::load_with(Some(&path), no_env), Err(ConfigError::Invalid(_))));

        fs::write(&path, "scopes = []\n").unwrap();
        assert!(matches!(AppSettings::load_with(Some(&path), no_env), Err(ConfigError::Invalid(_))));
    }
}
