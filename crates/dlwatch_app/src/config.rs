//! Startup configuration: command-line overrides, an optional TOML file and
//! environment fallbacks, resolved in that order of precedence.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dlwatch_client::ApiSettings;
use dlwatch_core::{FormDefaults, PollIntervals};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_SERVER: &str = "DLWATCH_SERVER";
pub const ENV_DOWNLOAD_DIR: &str = "DOWNLOAD_DIR";
pub const ENV_COOKIES_PATH: &str = "COOKIES_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("preset list is empty")]
    NoPresets,
    #[error("default preset {0:?} is not in the preset list")]
    UnknownDefaultPreset(String),
    #[error("{0} interval must be positive")]
    ZeroInterval(&'static str),
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub server: Option<String>,
    pub status_interval_ms: Option<u64>,
    pub tasks_interval_ms: Option<u64>,
}

/// Contents of the TOML file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub download_dir: Option<String>,
    pub cookies_path: Option<String>,
    pub presets: Option<Vec<String>>,
    pub default_preset: Option<String>,
    pub status_interval_ms: Option<u64>,
    pub tasks_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

/// The environment variables the watcher understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub server: Option<String>,
    pub download_dir: Option<String>,
    pub cookies_path: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            server: read(ENV_SERVER),
            download_dir: read(ENV_DOWNLOAD_DIR),
            cookies_path: read(ENV_COOKIES_PATH),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub defaults: FormDefaults,
    pub intervals: PollIntervals,
}

pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl AppConfig {
    pub fn resolve(
        overrides: &Overrides,
        file: FileConfig,
        env: EnvConfig,
    ) -> Result<Self, ConfigError> {
        let mut api = ApiSettings::default();
        if let Some(server) = overrides.server.clone().or(file.server).or(env.server) {
            api.base_url = server;
        }
        if let Some(secs) = file.request_timeout_secs {
            api.request_timeout = Duration::from_secs(secs);
        }

        let mut intervals = PollIntervals::default();
        if let Some(ms) = overrides.status_interval_ms.or(file.status_interval_ms) {
            intervals.status = positive_millis(ms, "status")?;
        }
        if let Some(ms) = overrides.tasks_interval_ms.or(file.tasks_interval_ms) {
            intervals.tasks = positive_millis(ms, "task list")?;
        }

        let mut defaults = FormDefaults::default();
        if let Some(presets) = file.presets {
            if presets.is_empty() {
                return Err(ConfigError::NoPresets);
            }
            defaults.default_preset = presets[0].clone();
            defaults.presets = presets;
        }
        if let Some(preset) = file.default_preset {
            if !defaults.has_preset(&preset) {
                return Err(ConfigError::UnknownDefaultPreset(preset));
            }
            defaults.default_preset = preset;
        }
        if let Some(dir) = file.download_dir.or(env.download_dir) {
            defaults.download_dir = dir;
        }
        defaults.cookies_path = file.cookies_path.or(env.cookies_path);
        defaults.cookies_available = defaults
            .cookies_path
            .as_deref()
            .is_some_and(|path| Path::new(path).is_file());

        Ok(Self {
            api,
            defaults,
            intervals,
        })
    }

    /// Loads the optional file, reads the environment and resolves.
    pub fn load(overrides: &Overrides, path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => load_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(overrides, file, EnvConfig::from_env())
    }
}

fn positive_millis(ms: u64, which: &'static str) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::ZeroInterval(which));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> EnvConfig {
        EnvConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn defaults_without_any_source() {
        let config =
            AppConfig::resolve(&Overrides::default(), FileConfig::default(), env(&[])).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.defaults, FormDefaults::default());
        assert_eq!(config.intervals, PollIntervals::default());
    }

    #[test]
    fn command_line_beats_file_beats_env() {
        let file = FileConfig {
            server: Some("http://file:1".into()),
            status_interval_ms: Some(500),
            download_dir: Some("/srv/media".into()),
            ..FileConfig::default()
        };
        let overrides = Overrides {
            server: Some("http://cli:2".into()),
            ..Overrides::default()
        };
        let env = env(&[
            (ENV_SERVER, "http://env:3"),
            (ENV_DOWNLOAD_DIR, "/env/media"),
        ]);

        let config = AppConfig::resolve(&overrides, file.clone(), env.clone()).unwrap();
        assert_eq!(config.api.base_url, "http://cli:2");
        assert_eq!(config.intervals.status, Duration::from_millis(500));
        assert_eq!(config.defaults.download_dir, "/srv/media");

        let config = AppConfig::resolve(&Overrides::default(), FileConfig::default(), env).unwrap();
        assert_eq!(config.api.base_url, "http://env:3");
        assert_eq!(config.defaults.download_dir, "/env/media");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let env = env(&[(ENV_SERVER, "  "), (ENV_COOKIES_PATH, "")]);
        assert_eq!(env, EnvConfig::default());
    }

    #[test]
    fn cookies_need_an_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let cookies = dir.path().join("cookies.txt");
        let path = cookies.to_string_lossy().into_owned();

        let missing = env(&[(ENV_COOKIES_PATH, path.as_str())]);
        let config =
            AppConfig::resolve(&Overrides::default(), FileConfig::default(), missing.clone())
                .unwrap();
        assert!(!config.defaults.cookies_available);
        assert_eq!(
            config.defaults.cookie_hint(),
            "cookies.txt not mounted. Set COOKIES_PATH to enable."
        );

        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        let config =
            AppConfig::resolve(&Overrides::default(), FileConfig::default(), missing).unwrap();
        assert!(config.defaults.cookies_available);
        assert_eq!(config.defaults.cookie_hint(), format!("Using cookies from {path}"));
    }

    #[test]
    fn custom_presets_and_default() {
        let file = FileConfig {
            presets: Some(vec!["Audio (MP3 Best)".into(), "Video (Best MP4)".into()]),
            ..FileConfig::default()
        };
        let config = AppConfig::resolve(&Overrides::default(), file, env(&[])).unwrap();
        assert_eq!(config.defaults.default_preset, "Audio (MP3 Best)");

        let file = FileConfig {
            default_preset: Some("Video (8K)".into()),
            ..FileConfig::default()
        };
        let err = AppConfig::resolve(&Overrides::default(), file, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDefaultPreset(ref p) if p == "Video (8K)"));

        let file = FileConfig {
            presets: Some(Vec::new()),
            ..FileConfig::default()
        };
        let err = AppConfig::resolve(&Overrides::default(), file, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::NoPresets));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let overrides = Overrides {
            tasks_interval_ms: Some(0),
            ..Overrides::default()
        };
        let err =
            AppConfig::resolve(&overrides, FileConfig::default(), env(&[])).unwrap_err();
        assert_eq!(err.to_string(), "task list interval must be positive");
    }

    #[test]
    fn file_round_trip_through_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server = \"http://nas:8080\"\ntasks_interval_ms = 3000\npresets = [\"Audio (MP3 Best)\"]"
        )
        .unwrap();

        let loaded = load_file(file.path()).unwrap();
        assert_eq!(loaded.server.as_deref(), Some("http://nas:8080"));
        assert_eq!(loaded.tasks_interval_ms, Some(3000));
        assert_eq!(loaded.presets, Some(vec!["Audio (MP3 Best)".to_string()]));
    }

    #[test]
    fn unknown_keys_and_missing_files_fail() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sever = \"typo\"").unwrap();
        assert!(matches!(
            load_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            load_file(Path::new("/nonexistent/dlwatch.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
