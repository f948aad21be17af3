//! Configuration management for Umbra.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/umbra/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scanning behavior settings
    pub scanning: ScanningConfig,
    /// Proxy pool settings
    pub proxy: ProxyConfig,
    /// LLM analyzer settings
    pub llm: LlmConfig,
    /// Platform catalog settings
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `UMBRA_MAX_CONCURRENCY`: Override the global concurrency cap
    /// - `UMBRA_PROXY_ENABLED`: Override proxy enable flag (true/false)
    /// - `UMBRA_PROXY_LIST`: Comma-separated proxy endpoint list
    /// - `UMBRA_LLM_ENABLED`: Override LLM enabled status (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to an already-loaded config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("UMBRA_MAX_CONCURRENCY") {
            if let Ok(max) = val.parse() {
                self.scanning.max_concurrency = max;
                tracing::debug!("Override scanning.max_concurrency from env: {}", max);
            }
        }

        if let Ok(val) = std::env::var("UMBRA_PROXY_ENABLED") {
            if let Ok(enabled) = val.parse() {
                self.proxy.enabled = enabled;
                tracing::debug!("Override proxy.enabled from env: {}", enabled);
            }
        }

        if let Ok(val) = std::env::var("UMBRA_PROXY_LIST") {
            let endpoints: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !endpoints.is_empty() {
                tracing::debug!("Override proxy.endpoints from env: {} entries", endpoints.len());
                self.proxy.endpoints = endpoints;
            }
        }

        if let Ok(val) = std::env::var("UMBRA_LLM_ENABLED") {
            if let Ok(enabled) = val.parse() {
                self.llm.enabled = enabled;
                tracing::debug!("Override llm.enabled from env: {}", enabled);
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/umbra/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("io", "umbra", "umbra").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Scanning behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Maximum number of probes in flight at once per scan
    pub max_concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string sent with every probe
    pub user_agent: String,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout_secs: 5,
            user_agent: "Mozilla/5.0 (compatible; Umbra/0.1)".to_string(),
        }
    }
}

/// Proxy pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Whether probes are routed through the proxy pool
    pub enabled: bool,
    /// Proxy endpoints (e.g. `http://host:port`, `socks5://host:port`)
    pub endpoints: Vec<String>,
    /// Rotation mode for selecting the next proxy
    pub rotation: RotationMode,
    /// Maximum retry attempts after a failed proxied request
    pub max_retries: u32,
    /// Base delay in milliseconds for retry backoff
    pub backoff_base_ms: u64,
    /// Seconds a failed proxy stays out of rotation
    pub cooldown_secs: u64,
    /// Whether probes may go direct when no healthy proxy is available
    pub allow_direct_fallback: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoints: Vec::new(),
            rotation: RotationMode::RoundRobin,
            max_retries: 2,
            backoff_base_ms: 500,
            cooldown_secs: 120,
            allow_direct_fallback: true,
        }
    }
}

/// Proxy rotation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationMode {
    /// Cycle through entries in insertion order, skipping cooled-down ones
    RoundRobin,
    /// Uniform random choice among entries not in cooldown
    RandomHealthy,
}

/// LLM analyzer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether model-backed analysis is enabled
    pub enabled: bool,
    /// Provider kind: `ollama` or `openai-compat`
    pub provider: String,
    /// Provider base URL
    pub base_url: String,
    /// Model name to request
    pub model: String,
    /// Maximum tokens for completions
    pub max_tokens: u32,
    /// Temperature for completions
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}

/// Platform catalog settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory containing platform definition TOML files.
    /// `None` means discover `platform-catalog/` from the workspace root.
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scanning.max_concurrency, 8);
        assert_eq!(config.scanning.timeout_secs, 5);
        assert!(!config.proxy.enabled);
        assert_eq!(config.proxy.rotation, RotationMode::RoundRobin);
        assert_eq!(config.proxy.cooldown_secs, 120);
        assert!(config.proxy.allow_direct_fallback);
        assert!(!config.llm.enabled);
        assert!(config.catalog.dir.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[scanning]"));
        assert!(toml_str.contains("[proxy]"));
        assert!(toml_str.contains("[llm]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.scanning.max_concurrency, config.scanning.max_concurrency);
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.proxy.enabled = true;
        config.proxy.endpoints = vec!["http://127.0.0.1:8080".to_string()];
        config.proxy.rotation = RotationMode::RandomHealthy;

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert!(loaded.proxy.enabled);
        assert_eq!(loaded.proxy.endpoints.len(), 1);
        assert_eq!(loaded.proxy.rotation, RotationMode::RandomHealthy);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("UMBRA_MAX_CONCURRENCY", "16");
        std::env::set_var("UMBRA_PROXY_ENABLED", "true");
        std::env::set_var("UMBRA_PROXY_LIST", "http://10.0.0.1:3128, http://10.0.0.2:3128");

        let mut config = AppConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.scanning.max_concurrency, 16);
        assert!(config.proxy.enabled);
        assert_eq!(config.proxy.endpoints.len(), 2);
        assert_eq!(config.proxy.endpoints[0], "http://10.0.0.1:3128");

        std::env::remove_var("UMBRA_MAX_CONCURRENCY");
        std::env::remove_var("UMBRA_PROXY_ENABLED");
        std::env::remove_var("UMBRA_PROXY_LIST");
    }

    #[test]
    fn test_partial_config() {
        // Partial TOML configs fill the rest with defaults
        let toml_str = r#"
[scanning]
max_concurrency = 4

[proxy]
enabled = true
rotation = "random-healthy"
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scanning.max_concurrency, 4);
        assert!(config.proxy.enabled);
        assert_eq!(config.proxy.rotation, RotationMode::RandomHealthy);
        // These should be defaults
        assert_eq!(config.scanning.timeout_secs, 5);
        assert_eq!(config.proxy.max_retries, 2);
    }

    #[test]
    fn test_rotation_mode_serde() {
        let mode: RotationMode =
            toml::from_str::<ProxyConfig>("rotation = \"round-robin\"")
                .expect("parse rotation")
                .rotation;
        assert_eq!(mode, RotationMode::RoundRobin);
    }
}
