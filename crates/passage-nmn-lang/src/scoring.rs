//! Date-scoring and expected-comparison engines.
//!
//! [`date_distribution`] turns a passage attention into a probability
//! distribution over the instance's unique dates. The normalization order is
//! deliberate: per-token scores are softmaxed BEFORE aggregating into date
//! buckets, so a date mentioned across many tokens gains mass token by token
//! instead of having its raw scores summed first — summing first would give
//! longer mentions an unfair multiplicative advantage. The accepted tradeoff
//! is that widely varying raw scores can still skew the result.

use std::str::FromStr;

use candle_core::{Result, Tensor};
use passage_nmn_core::LanguageError;

use crate::ops;
use crate::state::InstanceState;

/// Comparison mode for the expectation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `date1` is after `date2`.
    Greater,
    /// `date1` is before `date2`.
    Lesser,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Greater => "greater",
            Comparison::Lesser => "lesser",
        }
    }
}

impl FromStr for Comparison {
    type Err = LanguageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "greater" => Ok(Comparison::Greater),
            "lesser" => Ok(Comparison::Lesser),
            other => Err(LanguageError::UnknownComparison(other.to_string())),
        }
    }
}

/// Distribution over the instance's unique dates induced by a passage
/// attention.
///
/// The attention weights each row of the token→date similarity matrix;
/// summing over rows gives every token a "is a date for this query" score.
/// Scores at non-date tokens are masked out, the remainder is softmaxed, and
/// the per-token probabilities are aggregated into their date buckets.
///
/// The result sums to 1 when at least one valid date token exists; if no
/// passage token maps to any date it is all zero. Callers must tolerate the
/// degenerate case rather than expect an error.
pub fn date_distribution(state: &InstanceState, passage_attention: &Tensor) -> Result<Tensor> {
    if state.num_dates == 0 {
        return Tensor::zeros(0, candle_core::DType::F32, &state.device);
    }

    // (passage_len, passage_len); row t weighted by the attention on token t.
    let weighted = state
        .token_date_similarity
        .broadcast_mul(&passage_attention.unsqueeze(1)?)?;
    // (passage_len,): aggregate evidence that each token is a date token.
    let date_token_scores = weighted.sum(0)?;

    let date_token_probs = ops::masked_softmax(&date_token_scores, &state.date_token_mask, 0)?;

    // Aggregate per-token probability into per-date buckets.
    date_token_probs
        .unsqueeze(0)?
        .matmul(&state.date_buckets)?
        .squeeze(0)
}

/// Expected truth value of `date1 <cmp> date2` under two independent date
/// distributions: the joint outer product contracted with the precomputed
/// boolean comparison matrix. Returns a 0-dim tensor in `[0, 1]`.
pub fn expected_comparison(
    state: &InstanceState,
    date_distribution_1: &Tensor,
    date_distribution_2: &Tensor,
    comparison: Comparison,
) -> Result<Tensor> {
    if state.num_dates == 0 {
        return ops::scalar_zero(&state.device);
    }

    // (num_dates, num_dates) joint distribution over date pairs.
    let joint = date_distribution_1
        .unsqueeze(1)?
        .matmul(&date_distribution_2.unsqueeze(0)?)?;
    let comparison_matrix = match comparison {
        Comparison::Greater => &state.date_gt,
        Comparison::Lesser => &state.date_lt,
    };
    comparison_matrix.mul(&joint)?.sum_all()
}
