//! Generation engine configuration.
//!
//! Each engine variant carries its own model id, conversation window
//! bound, and sampling settings. Values here are the shipped defaults;
//! the infra layer overlays them from the config file.

use crate::session::EngineVariant;
use serde::{Deserialize, Serialize};

/// Settings for one generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model identifier sent to the backend, e.g. "google/gemini-2.5-flash-preview".
    pub model: String,
    /// Maximum number of conversation messages included in a prompt.
    pub window_bound: usize,
    /// Sampling temperature. `None` means the backend default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Whether the model interleaves reasoning content that must be
    /// separated from primary output.
    #[serde(default)]
    pub reasoning: bool,
}

impl EngineConfig {
    /// Shipped defaults for the classic engine.
    pub fn classic() -> Self {
        Self {
            model: "google/gemini-2.5-flash-preview".to_string(),
            window_bound: 5,
            temperature: None,
            reasoning: false,
        }
    }

    /// Shipped defaults for the beta engine.
    pub fn beta() -> Self {
        Self {
            model: "openai/o3-mini".to_string(),
            window_bound: 2,
            temperature: Some(0.8),
            reasoning: true,
        }
    }

    pub fn for_variant(variant: EngineVariant) -> Self {
        match variant {
            EngineVariant::Classic => Self::classic(),
            EngineVariant::Beta => Self::beta(),
        }
    }
}

/// Top-level generation settings: both engines plus stream behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "EngineConfig::classic")]
    pub classic: EngineConfig,
    #[serde(default = "EngineConfig::beta")]
    pub beta: EngineConfig,
    /// Seconds without a frame before an in-flight stream is treated
    /// as stalled and the turn fails.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

fn default_stream_idle_timeout_secs() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            classic: EngineConfig::classic(),
            beta: EngineConfig::beta(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn engine(&self, variant: EngineVariant) -> &EngineConfig {
        match variant {
            EngineVariant::Classic => &self.classic,
            EngineVariant::Beta => &self.beta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_defaults() {
        let config = EngineConfig::classic();
        assert_eq!(config.model, "google/gemini-2.5-flash-preview");
        assert_eq!(config.window_bound, 5);
        assert_eq!(config.temperature, None);
        assert!(!config.reasoning);
    }

    #[test]
    fn test_beta_defaults() {
        let config = EngineConfig::beta();
        assert_eq!(config.model, "openai/o3-mini");
        assert_eq!(config.window_bound, 2);
        assert_eq!(config.temperature, Some(0.8));
        assert!(config.reasoning);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let parsed: GenerationConfig = toml::from_str(
            r#"
            [classic]
            model = "google/gemini-2.0-flash"
            window_bound = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.classic.model, "google/gemini-2.0-flash");
        assert_eq!(parsed.beta, EngineConfig::beta());
        assert_eq!(parsed.stream_idle_timeout_secs, 120);
    }

    #[test]
    fn test_engine_lookup_by_variant() {
        let config = GenerationConfig::default();
        assert_eq!(
            config.engine(EngineVariant::Beta).window_bound,
            2
        );
    }
}
