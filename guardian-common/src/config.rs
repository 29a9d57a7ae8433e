//! Bootstrap configuration
//!
//! Resolution priority (highest first):
//! 1. Command-line arguments ([`ConfigOverrides`])
//! 2. Environment variables (`GUARDIAN_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing or unreadable TOML file is not fatal: a warning is logged and
//! compiled defaults are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 5760;
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
/// Hard cap imposed by the SMS gateway
pub const GATEWAY_MAX_MESSAGE_CHARS: usize = 1600;
pub const DEFAULT_SAFE_MESSAGE_CHARS: usize = 1400;
pub const DEFAULT_TRANSCRIPT_MAX_CHARS: usize = 150;
pub const DEFAULT_REASON_MAX_CHARS: usize = 300;
pub const DEFAULT_ACTION_INSTRUCTION: &str =
    "If you believe they're in danger, call them, and contact local emergency services.";

/// Environment variable naming the TOML file
pub const CONFIG_PATH_ENV: &str = "GUARDIAN_CONFIG";

/// Complete bootstrap configuration (TOML shape)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub reasoning: ReasoningConfig,
    pub gateway: GatewayConfig,
    pub alert: AlertConfig,
}

/// HTTP listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Generative reasoning service (Gemini)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Set false to force heuristic-only (FALLBACK) mode
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            timeout_ms: 15_000,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

impl ReasoningConfig {
    /// Usable API key, if any (blank keys count as absent)
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// True when live calls can be attempted
    pub fn is_live(&self) -> bool {
        self.enabled && self.api_key().is_some()
    }
}

/// SMS publish gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Provider tag reported in responses
    pub provider: String,
    /// Publish endpoint; unset means every dispatch fails with INTERNAL_ERROR
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
    pub sms_type: String,
    pub max_price: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: "sns".to_string(),
            endpoint: None,
            auth_token: None,
            timeout_ms: 10_000,
            sms_type: "Transactional".to_string(),
            max_price: "0.50".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// Alert composition and dispatch limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub transcript_max_chars: usize,
    /// Reasoning text on the alert's Reason line is cut past this
    pub reason_max_chars: usize,
    pub max_message_chars: usize,
    /// Soft limit: longer messages are sent with a warning
    pub safe_message_chars: usize,
    pub action_instruction: String,
    pub build_id: Option<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            transcript_max_chars: DEFAULT_TRANSCRIPT_MAX_CHARS,
            reason_max_chars: DEFAULT_REASON_MAX_CHARS,
            max_message_chars: GATEWAY_MAX_MESSAGE_CHARS,
            safe_message_chars: DEFAULT_SAFE_MESSAGE_CHARS,
            action_instruction: DEFAULT_ACTION_INSTRUCTION.to_string(),
            build_id: None,
        }
    }
}

/// Command-line overrides (highest priority)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load a TOML file, falling back to defaults when missing or invalid
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{} (using compiled defaults)", e);
                Self::default()
            }
        }
    }

    /// Apply `GUARDIAN_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment-style overrides from an arbitrary lookup
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("GUARDIAN_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = get("GUARDIAN_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid GUARDIAN_PORT value: {}", v),
            }
        }
        if let Some(v) = get("GUARDIAN_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = get("GUARDIAN_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("GUARDIAN_GEMINI_API_KEY").or_else(|| get("GEMINI_API_KEY")) {
            self.reasoning.api_key = Some(v);
        }
        if let Some(v) = get("GUARDIAN_GEMINI_MODEL") {
            self.reasoning.model = v;
        }
        if let Some(v) = get("GUARDIAN_GEMINI_ENDPOINT") {
            self.reasoning.endpoint = v;
        }
        if let Some(v) = get("GUARDIAN_SMS_GATEWAY_URL") {
            self.gateway.endpoint = Some(v);
        }
        if let Some(v) = get("GUARDIAN_SMS_GATEWAY_TOKEN") {
            self.gateway.auth_token = Some(v);
        }
        if let Some(v) = get("GUARDIAN_BUILD_ID") {
            self.alert.build_id = Some(v);
        }
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(bind) = &overrides.bind_address {
            self.server.bind_address = bind.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let alert = &self.alert;
        if alert.transcript_max_chars == 0 {
            return Err(Error::Config("alert.transcript_max_chars must be > 0".to_string()));
        }
        if alert.reason_max_chars == 0 {
            return Err(Error::Config("alert.reason_max_chars must be > 0".to_string()));
        }
        if alert.max_message_chars == 0 || alert.max_message_chars > GATEWAY_MAX_MESSAGE_CHARS {
            return Err(Error::Config(format!(
                "alert.max_message_chars must be in 1..={}",
                GATEWAY_MAX_MESSAGE_CHARS
            )));
        }
        if alert.safe_message_chars > alert.max_message_chars {
            return Err(Error::Config(
                "alert.safe_message_chars must not exceed alert.max_message_chars".to_string(),
            ));
        }
        if self.reasoning.timeout_ms == 0 || self.gateway.timeout_ms == 0 {
            return Err(Error::Config("timeouts must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Locates and assembles the effective configuration
pub struct ConfigResolver {
    cli_config_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_config_path: Option<PathBuf>) -> Self {
        Self { cli_config_path }
    }

    /// Config file to read: CLI path → `GUARDIAN_CONFIG` → platform default
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config_path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        default_config_path()
    }

    /// Defaults ← TOML ← ENV ← CLI, then validation
    pub fn resolve(&self, overrides: &ConfigOverrides) -> Result<TomlConfig> {
        let path = self.config_path();
        let mut config = TomlConfig::load_or_default(path.as_deref());
        config.apply_env();
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }
}

/// First existing platform config file
///
/// Linux: `~/.config/guardian/guardian.toml`, then `/etc/guardian/guardian.toml`.
/// Other platforms: the user config directory only.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("guardian").join("guardian.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/guardian/guardian.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.reasoning.model, DEFAULT_GEMINI_MODEL);
        assert!(!config.reasoning.is_live(), "no API key means fallback mode");
        assert_eq!(config.gateway.provider, "sns");
        assert!(config.gateway.endpoint().is_none());
        assert_eq!(config.alert.max_message_chars, 1600);
        assert_eq!(config.alert.safe_message_chars, 1400);
        assert_eq!(config.alert.reason_max_chars, DEFAULT_REASON_MAX_CHARS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [server]
            port = 6000

            [reasoning]
            api_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert!(config.reasoning.is_live());
        assert_eq!(config.reasoning.timeout_ms, 15_000);
        assert_eq!(config.alert.transcript_max_chars, 150);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[server\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = TomlConfig::load_or_default(Some(Path::new("/nonexistent/guardian.toml")));
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway]\nendpoint = \"https://sms.example.test/publish\"").unwrap();

        let config = TomlConfig::load_or_default(Some(file.path()));
        assert_eq!(config.gateway.endpoint(), Some("https://sms.example.test/publish"));
    }

    #[test]
    fn test_env_overrides_toml() {
        let mut config = TomlConfig::from_toml_str("[server]\nport = 6000").unwrap();
        config.apply_env_from(env_from(&[
            ("GUARDIAN_PORT", "7000"),
            ("GEMINI_API_KEY", "from-env"),
            ("GUARDIAN_SMS_GATEWAY_URL", "https://relay.test"),
        ]));
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.reasoning.api_key(), Some("from-env"));
        assert_eq!(config.gateway.endpoint(), Some("https://relay.test"));
    }

    #[test]
    fn test_guardian_key_wins_over_generic_key() {
        let mut config = TomlConfig::default();
        config.apply_env_from(env_from(&[
            ("GUARDIAN_GEMINI_API_KEY", "specific"),
            ("GEMINI_API_KEY", "generic"),
        ]));
        assert_eq!(config.reasoning.api_key(), Some("specific"));
    }

    #[test]
    fn test_invalid_env_port_ignored() {
        let mut config = TomlConfig::default();
        config.apply_env_from(env_from(&[("GUARDIAN_PORT", "not-a-port")]));
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = TomlConfig::default();
        config.apply_env_from(env_from(&[("GUARDIAN_PORT", "7000")]));
        config.apply_overrides(&ConfigOverrides {
            port: Some(8000),
            ..Default::default()
        });
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = TomlConfig::default();
        config.reasoning.api_key = Some("   ".to_string());
        assert!(config.reasoning.api_key().is_none());
        assert!(!config.reasoning.is_live());
    }

    #[test]
    fn test_disabled_reasoning_is_not_live() {
        let mut config = TomlConfig::default();
        config.reasoning.api_key = Some("k".to_string());
        config.reasoning.enabled = false;
        assert!(!config.reasoning.is_live());
    }

    #[test]
    fn test_validate_rejects_inverted_limits() {
        let mut config = TomlConfig::default();
        config.alert.safe_message_chars = 1500;
        config.alert.max_message_chars = 1000;
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.alert.max_message_chars = 2000;
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.alert.transcript_max_chars = 0;
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.alert.reason_max_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolver_cli_path_wins() {
        let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/explicit.toml")));
        assert_eq!(resolver.config_path(), Some(PathBuf::from("/tmp/explicit.toml")));
    }
}
