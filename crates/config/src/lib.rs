//! Configuration loading, validation, and management for cognitor.
//!
//! Loads configuration from `~/.cognitor/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.cognitor/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Planner (language model) settings
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Cognitive loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Fact memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Capability settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Which planner reply format the deployment speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    /// One JSON plan per iteration
    #[default]
    Structured,
    /// One `FUNCTION_CALL:` / `SELF_CHECK:` / `FINAL_ANSWER:` line per iteration
    Legacy,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Structured => "structured",
            Self::Legacy => "legacy",
        })
    }
}

impl FromStr for ProtocolKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "layered" => Ok(Self::Structured),
            "legacy" => Ok(Self::Legacy),
            other => Err(ConfigError::ValidationError(format!(
                "unknown planner protocol '{other}' (expected 'structured' or 'legacy')"
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Wall-clock bound on every planner call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub protocol: ProtocolKind,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_temperature() -> f32 {
    0.2
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: None,
            timeout_secs: default_timeout_secs(),
            protocol: ProtocolKind::default(),
            temperature: default_temperature(),
        }
    }
}

impl fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("protocol", &self.protocol)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on perception→decision→action cycles per query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Facts recalled per iteration
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    /// Ask the planner for a perception pass before the first plan
    #[serde(default = "default_true")]
    pub use_perception: bool,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_recall_limit() -> usize {
    5
}
fn default_min_relevance() -> f64 {
    0.3
}
fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            recall_limit: default_recall_limit(),
            min_relevance: default_min_relevance(),
            use_perception: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// JSON document holding facts and preferences
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,
}

fn default_memory_path() -> PathBuf {
    AppConfig::config_dir().join("agent_memory.json")
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// SQLite database with an `employee(id, name, salary)` table
    #[serde(default = "default_salary_db_path")]
    pub salary_db_path: PathBuf,

    /// Slide deck edited by the presentation capabilities
    #[serde(default = "default_presentation_path")]
    pub presentation_path: PathBuf,

    #[serde(default)]
    pub email: EmailConfig,
}

fn default_salary_db_path() -> PathBuf {
    AppConfig::config_dir().join("employee_salary.db")
}
fn default_presentation_path() -> PathBuf {
    AppConfig::config_dir().join("presentation.json")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            salary_db_path: default_salary_db_path(),
            presentation_path: default_presentation_path(),
            email: EmailConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Sender address, also the SMTP login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    465
}
fn default_subject() -> String {
    "Math Agent Result".into()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            address: None,
            app_password: None,
            recipient: None,
            subject: default_subject(),
        }
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("address", &self.address)
            .field("app_password", &redact(&self.app_password))
            .field("recipient", &self.recipient)
            .field("subject", &self.subject)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.cognitor/config.toml).
    ///
    /// Environment variables override the file:
    /// - `COGNITOR_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY` (first set wins, only when the file has no key)
    /// - `COGNITOR_PROVIDER`, `COGNITOR_MODEL`, `COGNITOR_PROTOCOL`
    /// - `GMAIL_ADDRESS`, `GMAIL_APP_PASSWORD`, `RECIPIENT_EMAIL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.planner.api_key.is_none() {
            self.planner.api_key = var("COGNITOR_API_KEY")
                .or_else(|| var("GEMINI_API_KEY"))
                .or_else(|| var("OPENAI_API_KEY"));
        }
        if let Some(provider) = var("COGNITOR_PROVIDER") {
            self.planner.provider = provider;
        }
        if let Some(model) = var("COGNITOR_MODEL") {
            self.planner.model = model;
        }
        if let Some(protocol) = var("COGNITOR_PROTOCOL") {
            self.planner.protocol = protocol.parse()?;
        }

        let email = &mut self.tools.email;
        if let Some(address) = var("GMAIL_ADDRESS") {
            email.address = Some(address);
        }
        if let Some(password) = var("GMAIL_APP_PASSWORD") {
            email.app_password = Some(password);
        }
        if let Some(recipient) = var("RECIPIENT_EMAIL") {
            email.recipient = Some(recipient);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".cognitor")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.planner.temperature) {
            return Err(ConfigError::ValidationError(
                "planner.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(1..=60).contains(&self.planner.timeout_secs) {
            return Err(ConfigError::ValidationError(
                "planner.timeout_secs must be between 1 and 60".into(),
            ));
        }

        if !(1..=10).contains(&self.agent.max_iterations) {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be between 1 and 10".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.agent.min_relevance) {
            return Err(ConfigError::ValidationError(
                "agent.min_relevance must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Check if a planner API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.planner.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for cognitor_core::Error {
    fn from(err: ConfigError) -> Self {
        cognitor_core::Error::Config {
            message: err.to_string(),
        }
    }
}
