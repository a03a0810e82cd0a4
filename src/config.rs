// ABOUTME: Engine configuration - recursion, step, fan-out and retry budgets.
// ABOUTME: Loaded from TOML; missing or malformed files fall back to defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Budgets and policies for a resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delegation depth ceiling. A child spec at this depth or deeper fails
    /// without spawning.
    pub max_depth: usize,
    /// Steps a single researcher may take before giving up.
    pub max_steps: usize,
    /// Top-level tasks running at once.
    pub fan_out: usize,
    /// Wall-clock budget per top-level task, covering its whole subtree.
    pub task_timeout_ms: Option<u64>,
    /// Extra attempts when the reasoning engine is unreachable.
    pub engine_retries: usize,
    /// Extra attempts for tool failures that may be transient.
    pub tool_retries: usize,
    /// Reject scaled numeric literals that no earlier step produced.
    pub require_traceable_inputs: bool,
    pub llm: LlmSettings,
}

/// Settings for the LLM-backed reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_steps: 25,
            fan_out: 4,
            task_timeout_ms: None,
            engine_retries: 2,
            tool_retries: 1,
            require_traceable_inputs: true,
            llm: LlmSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults when the file is missing,
    /// malformed, or invalid.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!("Loaded engine config from {}", path.display());
                config
            }
            Err(ConfigError::Io(_)) => {
                tracing::info!("No engine config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load and validate, reporting every failure.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fan_out == 0 {
            return Err(ConfigError::Invalid("fan_out must be at least 1".into()));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("max_steps must be at least 1".into()));
        }
        if self.task_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("task_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_traceable_inputs(mut self, required: bool) -> Self {
        self.require_traceable_inputs = required;
        self
    }
}
