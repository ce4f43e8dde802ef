//! Evaluation configuration

use std::env;

use tracing::warn;

/// Environment variable enabling debug validation
pub const DEBUG_MODE_ENV: &str = "TEMPORA_DEBUG_MODE";

/// How thoroughly `call` verifies same-sampling pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Compare timestamp buffers of a single index key
    #[default]
    Fast,
    /// Compare timestamp buffers of every index key, and the key sets
    Debug,
}

/// Configuration for an evaluation
#[derive(Debug, Clone, Default)]
pub struct EvaluationConfig {
    /// Sampling validation depth
    pub validation: ValidationMode,
}

impl EvaluationConfig {
    /// Configuration with debug validation
    pub fn debug() -> Self {
        Self {
            validation: ValidationMode::Debug,
        }
    }

    /// Read the validation mode from `TEMPORA_DEBUG_MODE`.
    ///
    /// Intended for top-level entry points and test harnesses only.
    pub fn from_env() -> Self {
        let validation = match env::var(DEBUG_MODE_ENV) {
            Ok(value) if is_truthy(&value) => ValidationMode::Debug,
            _ => ValidationMode::Fast,
        };
        if validation == ValidationMode::Debug {
            warn!("{DEBUG_MODE_ENV} is set: every index key is checked for sampling identity");
        }
        Self { validation }
    }

    /// Check if debug validation is enabled
    pub fn is_debug(&self) -> bool {
        self.validation == ValidationMode::Debug
    }
}

/// Truthy flag values: `1`, `true`, `yes`, `on`, case-insensitive
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
