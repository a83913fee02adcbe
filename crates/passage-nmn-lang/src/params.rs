//! The learned-parameter seam between the language and its host model.
//!
//! Predicates never own weights; they call through [`ExecutorParams`], which
//! the host model implements (or borrows from [`LearnedParams`], the default
//! candle implementation). Every method must be deterministic given fixed
//! parameters and input, and shape-compatible with `(length, hidden_dim)`
//! token matrices.

use candle_core::{Result, Tensor};
use candle_nn::{linear, linear_no_bias, lstm, Dropout, Linear, Module, LSTM, LSTMConfig, RNN, VarBuilder};

use crate::config::LanguageConfig;

/// Named computational functions the language's predicates execute with.
pub trait ExecutorParams: Send + Sync {
    /// Pairwise scores between question and passage tokens.
    ///
    /// # Shapes
    ///
    /// - `question`: `[question_len, dim]`
    /// - `passage`: `[passage_len, dim]`
    /// - result: `[question_len, passage_len]`
    fn question_passage_scores(&self, question: &Tensor, passage: &Tensor) -> Result<Tensor>;

    /// Pairwise scores between passage tokens, read as "token x gives weight
    /// w to token y being a date associated with x".
    ///
    /// # Shapes
    ///
    /// - `passage`: `[passage_len, dim]`
    /// - result: `[passage_len, passage_len]`
    fn token_date_scores(&self, passage: &Tensor) -> Result<Tensor>;

    /// Dropout over pre-softmax similarity scores. Identity outside training.
    fn dropout(&self, scores: &Tensor) -> Result<Tensor>;

    /// Fixed multipliers applied to a passage attention before span decoding.
    fn attention_scaling_values(&self) -> &[f32];

    /// Sequence-encode stacked per-token span features.
    ///
    /// # Shapes
    ///
    /// - `features`: `[passage_len, num_scaling_values]`
    /// - `mask`: `[passage_len]`
    /// - result: `[passage_len, span_hidden_dim]`
    fn encode_span_features(&self, features: &Tensor, mask: &Tensor) -> Result<Tensor>;

    /// Project encoded span features to per-token (start, end) logits.
    ///
    /// # Shapes
    ///
    /// - `hidden`: `[passage_len, span_hidden_dim]`
    /// - result: `[passage_len, 2]`
    fn project_span_logits(&self, hidden: &Tensor) -> Result<Tensor>;
}

/// Default learned implementation of [`ExecutorParams`].
///
/// Question/passage scoring is a plain dot product over the raw token
/// embeddings; token/date scoring is bilinear (`(W·p) pᵀ`); span features run
/// through an LSTM and a 2-output linear head.
pub struct LearnedParams {
    token_date_bilinear: Linear,
    span_encoder: LSTM,
    span_predictor: Linear,
    dropout: Dropout,
    attention_scaling_values: Vec<f32>,
    training: bool,
}

impl LearnedParams {
    /// Build the learned layers from a variable builder.
    ///
    /// `passage_dim` is the width of the passage representation selected by
    /// the config (the bilinear scorer is square in it).
    pub fn new(config: &LanguageConfig, passage_dim: usize, vb: VarBuilder) -> Result<Self> {
        let token_date_bilinear =
            linear_no_bias(passage_dim, passage_dim, vb.pp("token_date_bilinear"))?;
        let span_encoder = lstm(
            config.attention_scaling_values.len(),
            config.span_hidden_dim,
            LSTMConfig::default(),
            vb.pp("span_encoder"),
        )?;
        let span_predictor = linear(config.span_hidden_dim, 2, vb.pp("span_predictor"))?;

        Ok(Self {
            token_date_bilinear,
            span_encoder,
            span_predictor,
            dropout: Dropout::new(config.dropout),
            attention_scaling_values: config.attention_scaling_values.clone(),
            training: false,
        })
    }

    /// Toggle training mode (controls dropout).
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl ExecutorParams for LearnedParams {
    fn question_passage_scores(&self, question: &Tensor, passage: &Tensor) -> Result<Tensor> {
        question.matmul(&passage.t()?)
    }

    fn token_date_scores(&self, passage: &Tensor) -> Result<Tensor> {
        self.token_date_bilinear.forward(passage)?.matmul(&passage.t()?)
    }

    fn dropout(&self, scores: &Tensor) -> Result<Tensor> {
        self.dropout.forward(scores, self.training)
    }

    fn attention_scaling_values(&self) -> &[f32] {
        &self.attention_scaling_values
    }

    fn encode_span_features(&self, features: &Tensor, mask: &Tensor) -> Result<Tensor> {
        // Invalid rows are zeroed; the recurrence still runs over them, the
        // span head's logits there get discarded by masking downstream.
        let masked = features.broadcast_mul(&mask.unsqueeze(1)?)?;
        let states = self.span_encoder.seq(&masked.unsqueeze(0)?)?;
        // Each hidden state is (1, span_hidden_dim); one per passage token.
        let hidden: Vec<Tensor> = states.iter().map(|state| state.h().clone()).collect();
        Tensor::cat(&hidden, 0)
    }

    fn project_span_logits(&self, hidden: &Tensor) -> Result<Tensor> {
        self.span_predictor.forward(hidden)
    }
}
