//! Language and parameter configuration.

use serde::{Deserialize, Serialize};

/// Which upstream representation of a token sequence feeds the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepresentationSource {
    /// Context-free token embeddings.
    Embedded,
    /// Contextually encoded token representations.
    #[default]
    Encoded,
    /// Reserved; instance construction rejects this mode.
    Modeled,
}

impl RepresentationSource {
    pub fn name(&self) -> &'static str {
        match self {
            RepresentationSource::Embedded => "embedded",
            RepresentationSource::Encoded => "encoded",
            RepresentationSource::Modeled => "modeled",
        }
    }
}

/// Configuration for the language shell and its learned parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Representation used for question tokens inside the language.
    #[serde(default)]
    pub question_source: RepresentationSource,

    /// Representation used for passage tokens inside the language.
    #[serde(default)]
    pub passage_source: RepresentationSource,

    /// Fixed multipliers applied to a passage attention before span
    /// decoding, letting the span predictor see the same attention at
    /// several magnitudes.
    #[serde(default = "default_scaling_values")]
    pub attention_scaling_values: Vec<f32>,

    /// Hidden size of the span-feature sequence encoder.
    #[serde(default = "default_span_hidden_dim")]
    pub span_hidden_dim: usize,

    /// Dropout probability on pre-softmax similarity scores (training only).
    #[serde(default = "default_dropout")]
    pub dropout: f32,

    /// Sample count for the max-over-numbers extension predicate.
    ///
    /// Unused by the active grammar; carried for the documented extension
    /// point.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

fn default_scaling_values() -> Vec<f32> {
    vec![1.0, 2.0, 5.0, 10.0]
}

fn default_span_hidden_dim() -> usize {
    64
}

fn default_dropout() -> f32 {
    0.2
}

fn default_max_samples() -> usize {
    10
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            question_source: RepresentationSource::default(),
            passage_source: RepresentationSource::default(),
            attention_scaling_values: default_scaling_values(),
            span_hidden_dim: default_span_hidden_dim(),
            dropout: default_dropout(),
            max_samples: default_max_samples(),
        }
    }
}
