use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub watcher: WatcherConfig,
    pub buffer: BufferConfig,
    pub cache: CacheConfig,
    pub worker: WorkerConfig,
    pub backend: BackendConfig,
}

/// Snapshot polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatcherConfig {
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Snapshots longer than this (in characters) are ignored
    pub max_snapshot_len: usize,
    /// Command (program + args) that prints the current snapshot to stdout
    pub source_command: Vec<String>,
}

/// Short-line accumulator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    /// Lines shorter than this (in characters) are buffered, not dispatched
    pub short_threshold_chars: usize,
    /// Buffered line count that triggers an implicit flush
    pub max_items: usize,
    /// Seconds after the last push before a timeout flush
    pub timeout_secs: f64,
}

/// Cache tier configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// RAM tier capacity (number of entries)
    pub ram_capacity: usize,
    /// SQLite database path; None picks a path under the user data dir
    pub db_path: Option<PathBuf>,
}

/// Translation worker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum queued jobs while a translation is in flight
    pub pending_max: usize,
}

/// Translation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Chat-completions endpoint URL
    pub api_url: String,
    /// API key; empty falls back to the CLIPGLOT_API_KEY environment variable
    pub api_key: String,
    /// Model name sent with each request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            max_snapshot_len: defaults::MAX_SNAPSHOT_LEN,
            source_command: defaults::SOURCE_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            short_threshold_chars: defaults::SHORT_THRESHOLD_CHARS,
            max_items: defaults::SHORT_MAX_ITEMS,
            timeout_secs: defaults::ACCUMULATOR_TIMEOUT_SECS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ram_capacity: defaults::RAM_CACHE_CAPACITY,
            db_path: None,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pending_max: defaults::PENDING_MAX,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::BACKEND_API_URL.to_string(),
            api_key: String::new(),
            model: defaults::BACKEND_MODEL.to_string(),
            temperature: defaults::BACKEND_TEMPERATURE,
            timeout_secs: defaults::BACKEND_TIMEOUT_SECS,
        }
    }
}

impl WatcherConfig {
    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl BufferConfig {
    /// Accumulator timeout as a `Duration`.
    ///
    /// A non-finite or non-positive value falls back to the default
    /// rather than panicking in `Duration::from_secs_f64`; `Config::load`
    /// rejects such values before they get here.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs.is_finite() && self.timeout_secs > 0.0 {
            Duration::from_secs_f64(self.timeout_secs)
        } else {
            Duration::from_secs_f64(defaults::ACCUMULATOR_TIMEOUT_SECS)
        }
    }
}

impl CacheConfig {
    /// Resolve the database path, falling back to the user data directory.
    pub fn resolved_db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipglot")
            .join("translations.db")
    }
}

impl BackendConfig {
    /// Resolve the API key: config value first, then environment.
    ///
    /// Returns None when neither is set; the backend constructor turns
    /// that into a fail-fast error.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var(defaults::API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse as TOML but cannot drive the daemon.
    fn validate(&self) -> crate::error::Result<()> {
        if !(self.buffer.timeout_secs.is_finite() && self.buffer.timeout_secs > 0.0) {
            return Err(crate::error::ClipglotError::ConfigInvalidValue {
                key: "buffer.timeout_secs".to_string(),
                message: format!(
                    "must be a positive number of seconds, got {}",
                    self.buffer.timeout_secs
                ),
            });
        }
        if self.buffer.max_items == 0 {
            return Err(crate::error::ClipglotError::ConfigInvalidValue {
                key: "buffer.max_items".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.watcher.source_command.is_empty() {
            return Err(crate::error::ClipglotError::ConfigInvalidValue {
                key: "watcher.source_command".to_string(),
                message: "must name a program".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/clipglot/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipglot")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.watcher.poll_interval_ms, 100);
        assert_eq!(config.watcher.max_snapshot_len, 500);
        assert_eq!(config.watcher.source_command[0], "wl-paste");

        assert_eq!(config.buffer.short_threshold_chars, 10);
        assert_eq!(config.buffer.max_items, 3);
        assert!((config.buffer.timeout_secs - 1.3).abs() < f64::EPSILON);

        assert_eq!(config.cache.ram_capacity, 500);
        assert_eq!(config.cache.db_path, None);

        assert_eq!(config.worker.pending_max, 20);

        assert_eq!(config.backend.model, "deepseek-chat");
        assert!((config.backend.temperature - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [watcher]
            poll_interval_ms = 250
            max_snapshot_len = 1000

            [buffer]
            short_threshold_chars = 12
            max_items = 4
            timeout_secs = 4.5

            [worker]
            pending_max = 5

            [backend]
            model = "other-model"
        "#;

        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(toml_content.as_bytes())
            .expect("write config");

        let config = Config::load(file.path()).expect("load config");
        assert_eq!(config.watcher.poll_interval_ms, 250);
        assert_eq!(config.watcher.max_snapshot_len, 1000);
        assert_eq!(config.buffer.short_threshold_chars, 12);
        assert_eq!(config.buffer.max_items, 4);
        assert!((config.buffer.timeout_secs - 4.5).abs() < f64::EPSILON);
        assert_eq!(config.worker.pending_max, 5);
        assert_eq!(config.backend.model, "other-model");
        // Untouched sections keep defaults
        assert_eq!(config.cache.ram_capacity, 500);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml_content = r#"
            [buffer]
            max_items = 6
        "#;

        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(toml_content.as_bytes())
            .expect("write config");

        let config = Config::load(file.path()).expect("load config");
        assert_eq!(config.buffer.max_items, 6);
        assert_eq!(config.buffer.short_threshold_chars, 10);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            Config::load_or_default(Path::new("/nonexistent/clipglot.toml")).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(b"not [valid toml").expect("write config");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_resolved_api_key_prefers_config_value() {
        let backend = BackendConfig {
            api_key: "sk-config".to_string(),
            ..BackendConfig::default()
        };
        assert_eq!(backend.resolved_api_key().as_deref(), Some("sk-config"));
    }

    #[test]
    fn test_timeout_duration_conversion() {
        let buffer = BufferConfig {
            timeout_secs: 2.5,
            ..BufferConfig::default()
        };
        assert_eq!(buffer.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_timeout_never_panics_on_bad_values() {
        let fallback = BufferConfig::default().timeout();
        for bad in [-1.0, 0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let buffer = BufferConfig {
                timeout_secs: bad,
                ..BufferConfig::default()
            };
            assert_eq!(buffer.timeout(), fallback, "for timeout_secs = {bad}");
        }
    }

    #[test]
    fn test_load_rejects_negative_timeout() {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(b"[buffer]\ntimeout_secs = -1.0\n")
            .expect("write config");

        let err = Config::load(file.path()).expect_err("negative timeout must fail");
        assert!(err.to_string().contains("buffer.timeout_secs"));
    }

    #[test]
    fn test_load_rejects_nan_timeout() {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(b"[buffer]\ntimeout_secs = nan\n")
            .expect("write config");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_zero_max_items() {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(b"[buffer]\nmax_items = 0\n")
            .expect("write config");

        let err = Config::load(file.path()).expect_err("zero max_items must fail");
        assert!(err.to_string().contains("buffer.max_items"));
    }

    #[test]
    fn test_load_rejects_empty_source_command() {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(b"[watcher]\nsource_command = []\n")
            .expect("write config");

        let err = Config::load(file.path()).expect_err("empty command must fail");
        assert!(err.to_string().contains("watcher.source_command"));
    }
}
