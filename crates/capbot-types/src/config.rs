//! Configuration for the detection, suggestion, and revision components.
//!
//! Plain serde structs with per-field defaults so partial configuration
//! files deserialize cleanly.

use serde::{Deserialize, Serialize};

/// Configuration for the duplicate detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Similarity threshold for a hard match, in [0, 1].
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Relative band below the threshold that still counts as a soft
    /// match: best >= threshold * soft_band_ratio.
    #[serde(default = "default_soft_band_ratio")]
    pub soft_band_ratio: f32,

    /// How many nearest neighbours to fetch per check.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_threshold() -> f32 {
    0.8
}

fn default_soft_band_ratio() -> f32 {
    0.75
}

fn default_top_k() -> usize {
    10
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            soft_band_ratio: default_soft_band_ratio(),
            top_k: default_top_k(),
        }
    }
}

impl DetectorConfig {
    /// Score floor for a soft match.
    pub fn soft_floor(&self) -> f32 {
        self.threshold * self.soft_band_ratio
    }
}

/// Configuration for the suggestion generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// How many drafts to ask the generative model for.
    #[serde(default = "default_draft_count")]
    pub draft_count: usize,

    /// Retries with a simplified prompt after a structural parse failure.
    #[serde(default = "default_parse_retries")]
    pub parse_retries: u32,

    /// Retries with backoff for transient Unavailable/Timeout failures.
    #[serde(default = "default_transient_retries")]
    pub transient_retries: u32,

    /// Sampling temperature for the generative call.
    #[serde(default = "default_suggestion_temperature")]
    pub temperature: f32,

    /// Output budget for the generative call.
    #[serde(default = "default_suggestion_tokens")]
    pub max_output_tokens: u32,
}

fn default_draft_count() -> usize {
    5
}

fn default_parse_retries() -> u32 {
    1
}

fn default_transient_retries() -> u32 {
    3
}

fn default_suggestion_temperature() -> f32 {
    0.8
}

fn default_suggestion_tokens() -> u32 {
    4000
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            draft_count: default_draft_count(),
            parse_retries: default_parse_retries(),
            transient_retries: default_transient_retries(),
            temperature: default_suggestion_temperature(),
            max_output_tokens: default_suggestion_tokens(),
        }
    }
}

/// Configuration for the modification engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionConfig {
    /// Bounded revision attempts before escalating to a human.
    #[serde(default = "default_revision_attempts")]
    pub max_attempts: u32,

    /// Sampling temperature for revision prompts.
    #[serde(default = "default_revision_temperature")]
    pub temperature: f32,

    /// Output budget for revision prompts.
    #[serde(default = "default_revision_tokens")]
    pub max_output_tokens: u32,
}

fn default_revision_attempts() -> u32 {
    2
}

fn default_revision_temperature() -> f32 {
    0.8
}

fn default_revision_tokens() -> u32 {
    2500
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_revision_attempts(),
            temperature: default_revision_temperature(),
            max_output_tokens: default_revision_tokens(),
        }
    }
}

/// Aggregate configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub suggestion: SuggestionConfig,

    #[serde(default)]
    pub revision: RevisionConfig,
}
