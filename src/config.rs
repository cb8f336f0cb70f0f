use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::reveal::RevealConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub genai: GenAiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Largest accepted JSON body; photos arrive as base64 data URLs
    #[serde(default = "default_json_limit")]
    pub json_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            json_limit_bytes: default_json_limit(),
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8787 }
fn default_json_limit() -> usize { 16 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct GenAiSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_genai_base_url")]
    pub base_url: String,
    #[serde(default = "default_genai_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Websocket endpoint of the live voice model
    #[serde(default = "default_live_url")]
    pub live_url: String,
}

impl Default for GenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_genai_base_url(),
            timeout_secs: default_genai_timeout(),
            poll_interval_secs: default_poll_interval(),
            live_url: default_live_url(),
        }
    }
}

fn default_genai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_genai_timeout() -> u64 { 60 }
fn default_poll_interval() -> u64 { 10 }
fn default_live_url() -> String {
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
    #[serde(default = "default_reveal_start")]
    pub reveal_start_secs: u32,
    #[serde(default = "default_initial_obscurity")]
    pub initial_obscurity: f64,
    #[serde(default = "default_match_delay_ms")]
    pub match_delay_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            reveal_start_secs: default_reveal_start(),
            initial_obscurity: default_initial_obscurity(),
            match_delay_ms: default_match_delay_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl SessionSettings {
    pub fn reveal(&self) -> RevealConfig {
        RevealConfig {
            duration_secs: self.duration_secs,
            reveal_start_secs: self.reveal_start_secs,
            initial_obscurity: self.initial_obscurity,
        }
    }

    pub fn match_delay(&self) -> Duration {
        Duration::from_millis(self.match_delay_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

fn default_duration() -> u32 { 180 }
fn default_reveal_start() -> u32 { 30 }
fn default_initial_obscurity() -> f64 { 45.0 }
fn default_match_delay_ms() -> u64 { 4000 }
fn default_tick_ms() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            default_user: default_user(),
        }
    }
}

fn default_match_threshold() -> f64 { 0.85 }
fn default_user() -> String { "u1".to_string() }

/// Simulated device capabilities for the bridge
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_true")]
    pub capture_granted: bool,
    #[serde(default = "default_true")]
    pub haptics: bool,
    #[serde(default = "default_identity_scan_ms")]
    pub identity_scan_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            capture_granted: true,
            haptics: true,
            identity_scan_ms: default_identity_scan_ms(),
        }
    }
}

fn default_true() -> bool { true }
fn default_identity_scan_ms() -> u64 { 2500 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_cache_entries(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_entries() -> u64 { 1000 }
fn default_cache_ttl() -> u64 { 300 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    /// Verified flag file; the platform data dir when unset
    pub flag_file: Option<PathBuf>,
    /// Keep flags in memory only
    #[serde(default)]
    pub in_memory_flags: bool,
    /// Catalog TOML replacing the embedded seed
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with SCISSHER_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., SCISSHER__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SCISSHER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SCISSHER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Pick up the Gemini key from the conventional variables when the
/// prefixed one is not set
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    if env::var("SCISSHER__GENAI__API_KEY").is_ok() {
        return Ok(settings);
    }

    let api_key = env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY")).ok();

    match api_key {
        Some(key) => Config::builder()
            .add_source(settings)
            .set_override("genai.api_key", key)?
            .build(),
        None => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session() {
        let session = SessionSettings::default();
        assert_eq!(session.reveal(), RevealConfig::default());
        assert_eq!(session.match_delay(), Duration::from_secs(4));
        assert_eq!(session.tick(), Duration::from_secs(1));
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scissher.toml");
        std::fs::write(
            &path,
            "[session]\nduration_secs = 60\n\n[discovery]\nmatch_threshold = 0.5\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.session.duration_secs, 60);
        assert_eq!(settings.session.reveal_start_secs, 30);
        assert_eq!(settings.discovery.match_threshold, 0.5);
        assert_eq!(settings.server.port, 8787);
        assert_eq!(settings.server.json_limit_bytes, 16 * 1024 * 1024);
    }
}
