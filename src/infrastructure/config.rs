//! Configuration loaded from TOML with environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Largest document a store accepts, in bytes. Unlimited when absent.
    #[serde(default)]
    pub store_quota_bytes: Option<usize>,

    #[serde(default)]
    pub autosave: AutosaveConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scratch_dir: default_scratch_dir(),
            export_dir: default_export_dir(),
            store_quota_bytes: None,
            autosave: AutosaveConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// File name inside `data_dir`.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    home_dir()
        .map(|home| home.join(".fitlog"))
        .unwrap_or_else(|| PathBuf::from(".fitlog"))
}

fn default_scratch_dir() -> PathBuf {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string());
    std::env::temp_dir().join(format!("fitlog-{user}"))
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_debounce_ms() -> u64 {
    1200
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "fitlog.log".to_string()
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.trim().is_empty())
        .map(PathBuf::from)
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.logging.file)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&s)?)
    }

    /// Loads configuration from the first file found, in priority order:
    /// `$FITLOG_CONFIG`, `~/.fitlog/config.toml`, `./fitlog.toml`. Falls back
    /// to defaults, then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let candidates = [
            std::env::var("FITLOG_CONFIG").ok().map(PathBuf::from),
            home_dir().map(|h| h.join(".fitlog").join("config.toml")),
            Some(PathBuf::from("fitlog.toml")),
        ];

        let mut cfg = match candidates.into_iter().flatten().find(|p| p.exists()) {
            Some(path) => Self::from_file(&path)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?,
            None => Config::default(),
        };

        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FITLOG_DATA_DIR") {
            if !v.trim().is_empty() {
                self.data_dir = PathBuf::from(v);
            }
        }
        if let Some(v) = lookup("FITLOG_LOG") {
            if !v.trim().is_empty() {
                self.logging.level = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.autosave.debounce(), Duration::from_millis(1200));
        assert_eq!(cfg.autosave.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.store_quota_bytes.is_none());
        assert!(cfg.log_path().ends_with("fitlog.log"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fitlog.toml");
        std::fs::write(
            &path,
            "data_dir = \"/tmp/lifts\"\nstore_quota_bytes = 1024\n\n[autosave]\ndebounce_ms = 500\n",
        )
        .unwrap();

        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/lifts"));
        assert_eq!(cfg.store_quota_bytes, Some(1024));
        assert_eq!(cfg.autosave.debounce_ms, 500);
        assert_eq!(cfg.autosave.poll_interval_secs, 10);
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fitlog.toml");
        std::fs::write(&path, "[autosave]\ndebounce_ms = \"soon\"\n").unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(|name| match name {
            "FITLOG_DATA_DIR" => Some("/srv/fitlog".to_string()),
            "FITLOG_LOG" => Some("debug".to_string()),
            _ => None,
        });

        assert_eq!(cfg.data_dir, PathBuf::from("/srv/fitlog"));
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_blank_env_override_ignored() {
        let mut cfg = Config::default();
        let before = cfg.data_dir.clone();
        cfg.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(cfg.data_dir, before);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let autosave = AutosaveConfig {
            debounce_ms: 0,
            poll_interval_secs: 0,
        };
        assert_eq!(autosave.poll_interval(), Duration::from_secs(1));
    }
}
