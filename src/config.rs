//! Configuration management for examplan
//!
//! Configuration is loaded from a YAML file with serde defaults for every
//! field, so an empty or missing file yields a fully working setup: the
//! deterministic proposer, an unlimited gate, and a loopback server bind.

use crate::error::{ExamplanError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Proposer strategy and tuning
    #[serde(default)]
    pub proposer: ProposerConfig,

    /// Usage gate policy
    #[serde(default)]
    pub gate: GateConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Proposer selection and per-strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposerConfig {
    /// Strategy name: `deterministic` or `gateway`
    #[serde(rename = "type", default = "default_proposer_type")]
    pub proposer_type: String,

    /// Tuning for the deterministic scheduler
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Gateway connection settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            proposer_type: default_proposer_type(),
            scheduler: SchedulerConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Tuning knobs for the deterministic scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Shortest session block emitted, in minutes
    #[serde(default = "default_session_min")]
    pub session_min_minutes: i64,

    /// Longest session block emitted, in minutes
    #[serde(default = "default_session_max")]
    pub session_max_minutes: i64,

    /// Suggested in-session break cadence, in minutes
    #[serde(default = "default_break_interval")]
    pub break_interval_minutes: u32,

    /// Gap between consecutive blocks, in minutes
    #[serde(default = "default_block_gap")]
    pub block_gap_minutes: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            session_min_minutes: default_session_min(),
            session_max_minutes: default_session_max(),
            break_interval_minutes: default_break_interval(),
            block_gap_minutes: default_block_gap(),
        }
    }
}

/// Connection settings for the chat-completions gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Usage gate policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Gate mode: `unlimited` or `metered`
    #[serde(default = "default_gate_mode")]
    pub mode: String,

    /// Plans a free caller may generate per UTC day in metered mode
    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: u32,

    /// Callers exempt from metering
    #[serde(default)]
    pub premium_callers: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: default_gate_mode(),
            free_daily_limit: default_free_daily_limit(),
            premium_callers: Vec::new(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_proposer_type() -> String {
    "deterministic".to_string()
}

fn default_session_min() -> i64 {
    45
}

fn default_session_max() -> i64 {
    90
}

fn default_break_interval() -> u32 {
    25
}

fn default_block_gap() -> i64 {
    10
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "EXAMPLAN_API_KEY".to_string()
}

fn default_gate_mode() -> String {
    "unlimited".to_string()
}

fn default_free_daily_limit() -> u32 {
    3
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the parsed configuration is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check configuration invariants
    ///
    /// # Errors
    ///
    /// Returns [`ExamplanError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        match self.proposer.proposer_type.as_str() {
            "deterministic" | "gateway" => {}
            other => {
                return Err(ExamplanError::Config(format!(
                    "Unknown proposer type: {}. Use 'deterministic' or 'gateway'.",
                    other
                ))
                .into())
            }
        }

        let scheduler = &self.proposer.scheduler;
        if scheduler.session_min_minutes <= 0 {
            return Err(ExamplanError::Config(
                "session_min_minutes must be positive".to_string(),
            )
            .into());
        }
        if scheduler.session_max_minutes < scheduler.session_min_minutes {
            return Err(ExamplanError::Config(
                "session_max_minutes must be at least session_min_minutes".to_string(),
            )
            .into());
        }
        if scheduler.block_gap_minutes < 0 {
            return Err(ExamplanError::Config(
                "block_gap_minutes must not be negative".to_string(),
            )
            .into());
        }

        let gateway = &self.proposer.gateway;
        if gateway.api_base.is_empty() {
            return Err(ExamplanError::Config("api_base must not be empty".to_string()).into());
        }
        if gateway.timeout_seconds == 0 {
            return Err(
                ExamplanError::Config("timeout_seconds must be positive".to_string()).into(),
            );
        }
        if !(0.0..=2.0).contains(&gateway.temperature) {
            return Err(ExamplanError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        match self.gate.mode.as_str() {
            "unlimited" | "metered" => {}
            other => {
                return Err(ExamplanError::Config(format!(
                    "Unknown gate mode: {}. Use 'unlimited' or 'metered'.",
                    other
                ))
                .into())
            }
        }
        if self.gate.mode == "metered" && self.gate.free_daily_limit == 0 {
            return Err(ExamplanError::Config(
                "free_daily_limit must be positive in metered mode".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
