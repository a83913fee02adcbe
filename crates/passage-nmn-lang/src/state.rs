//! Per-instance state: upstream inputs, validation, and precomputation.
//!
//! Construction is two-phase and explicit: the upstream encoder hands over an
//! [`InstanceInputs`] bundle, [`initialize`] validates the contract and
//! computes every attention/similarity/comparison artifact the predicates
//! will need, and the resulting [`InstanceState`] is immutable for the
//! instance's lifetime. Predicates only ever read it; nothing is cached
//! lazily and nothing is recomputed per call.

use candle_core::{Device, Tensor};
use passage_nmn_core::date::{comparison_matrices, Date};
use passage_nmn_core::{LanguageError, LanguageResult};

use crate::config::{LanguageConfig, RepresentationSource};
use crate::ops;
use crate::params::ExecutorParams;

/// Everything the upstream encoder must supply for one question/passage pair.
///
/// # Contract
///
/// - The three question tensors are `[question_len, _]` and `question_mask`
///   is `[question_len]`; likewise for the passage side.
/// - Masks are f32 tensors of 0.0/1.0.
/// - `token_date_index[t]` is the unique-date index of passage token `t`, or
///   [`Date::UNKNOWN`] (-1) when the token is not part of a date mention.
///   Every non-sentinel index must be a valid index into `dates`.
#[derive(Debug, Clone)]
pub struct InstanceInputs {
    pub question_raw: Tensor,
    pub question_embedded: Tensor,
    pub question_encoded: Tensor,
    pub passage_raw: Tensor,
    pub passage_embedded: Tensor,
    pub passage_encoded: Tensor,
    pub question_mask: Tensor,
    pub passage_mask: Tensor,
    pub token_date_index: Vec<i64>,
    pub dates: Vec<Date>,
}

impl InstanceInputs {
    fn inconsistent(reason: impl Into<String>) -> LanguageError {
        LanguageError::InconsistentInstance {
            reason: reason.into(),
        }
    }

    /// Check the construction contract. Called by [`initialize`].
    pub fn validate(&self) -> LanguageResult<()> {
        let question_len = self.question_mask.dims();
        if question_len.len() != 1 {
            return Err(Self::inconsistent("question mask must be 1-dimensional"));
        }
        let question_len = question_len[0];
        for (name, tensor) in [
            ("raw question", &self.question_raw),
            ("embedded question", &self.question_embedded),
            ("encoded question", &self.question_encoded),
        ] {
            if tensor.dims().first() != Some(&question_len) {
                return Err(Self::inconsistent(format!(
                    "{name} has {:?} tokens, question mask has {question_len}",
                    tensor.dims().first()
                )));
            }
        }

        let passage_len = self.passage_mask.dims();
        if passage_len.len() != 1 {
            return Err(Self::inconsistent("passage mask must be 1-dimensional"));
        }
        let passage_len = passage_len[0];
        for (name, tensor) in [
            ("raw passage", &self.passage_raw),
            ("embedded passage", &self.passage_embedded),
            ("encoded passage", &self.passage_encoded),
        ] {
            if tensor.dims().first() != Some(&passage_len) {
                return Err(Self::inconsistent(format!(
                    "{name} has {:?} tokens, passage mask has {passage_len}",
                    tensor.dims().first()
                )));
            }
        }

        if self.token_date_index.len() != passage_len {
            return Err(Self::inconsistent(format!(
                "token-date mapping covers {} tokens, passage has {passage_len}",
                self.token_date_index.len()
            )));
        }
        let num_dates = self.dates.len() as i64;
        for (token, &index) in self.token_date_index.iter().enumerate() {
            if index >= num_dates || index < Date::UNKNOWN as i64 {
                return Err(Self::inconsistent(format!(
                    "token {token} maps to date index {index}, but only {num_dates} dates exist"
                )));
            }
        }
        Ok(())
    }
}

/// Immutable per-instance state shared by every predicate call.
///
/// Read-only after [`initialize`] returns; no instance survives to be reused
/// by a different program without reconstruction.
#[derive(Debug, Clone)]
pub struct InstanceState {
    /// `[question_len]` validity mask.
    pub question_mask: Tensor,
    /// `[passage_len]` validity mask.
    pub passage_mask: Tensor,
    /// `[question_len, passage_len]`; each question token's attention over
    /// the passage, rows summing to 1 over valid positions.
    pub question_passage_attention: Tensor,
    /// `[passage_len, passage_len]`; bounded (−1..1) weight for "token x is
    /// evidence for a date at token y".
    pub token_date_similarity: Tensor,
    /// `[passage_len]`; 1.0 where the token maps to a unique date.
    pub date_token_mask: Tensor,
    /// `[passage_len, num_dates]` one-hot bucket rows; multiplying a
    /// per-token probability vector through it aggregates mass per date.
    pub date_buckets: Tensor,
    /// `[num_dates, num_dates]` boolean matrix; `gt[i][j] = 1` iff
    /// `dates[i]` is after `dates[j]`.
    pub date_gt: Tensor,
    /// `[num_dates, num_dates]` boolean matrix for the reverse relation.
    pub date_lt: Tensor,
    /// Unique dates mentioned in the passage, in extraction order.
    pub dates: Vec<Date>,
    pub num_dates: usize,
    pub device: Device,
}

fn reject_unsupported(source: RepresentationSource) -> LanguageResult<()> {
    if source == RepresentationSource::Modeled {
        return Err(LanguageError::UnsupportedRepresentation { mode: "modeled" });
    }
    Ok(())
}

fn select_representation<'a>(
    source: RepresentationSource,
    embedded: &'a Tensor,
    encoded: &'a Tensor,
) -> &'a Tensor {
    match source {
        RepresentationSource::Embedded => embedded,
        // Modeled was rejected up front.
        RepresentationSource::Encoded | RepresentationSource::Modeled => encoded,
    }
}

/// Validate the inputs and precompute the instance's matrices.
pub fn initialize(
    inputs: &InstanceInputs,
    config: &LanguageConfig,
    params: &dyn ExecutorParams,
) -> LanguageResult<InstanceState> {
    inputs.validate()?;
    reject_unsupported(config.question_source)?;
    reject_unsupported(config.passage_source)?;

    let device = inputs.passage_encoded.device().clone();
    let passage_len = inputs.passage_mask.dims()[0];

    // Question -> passage attention over the raw embeddings: score, dropout,
    // then masked softmax along the passage dimension per question token.
    let scores = params.question_passage_scores(&inputs.question_raw, &inputs.passage_raw)?;
    let scores = params.dropout(&scores)?;
    let question_passage_attention = ops::masked_softmax(&scores, &inputs.passage_mask, 1)?;

    // Token -> date-token similarity over the selected passage representation:
    // score, dropout, mask both axes, normalize by passage length, bound.
    let passage = select_representation(
        config.passage_source,
        &inputs.passage_embedded,
        &inputs.passage_encoded,
    );
    let scores = params.dropout(&params.token_date_scores(passage)?)?;
    let masked = scores
        .broadcast_mul(&inputs.passage_mask.unsqueeze(0)?)?
        .broadcast_mul(&inputs.passage_mask.unsqueeze(1)?)?;
    let token_date_similarity = masked.affine(1.0 / passage_len as f64, 0.0)?.tanh()?;

    log_similarity_statistics(&token_date_similarity, &inputs.passage_mask)?;

    // Pairwise date comparisons, computed once over the unique dates.
    let num_dates = inputs.dates.len();
    let (gt, lt) = comparison_matrices(&inputs.dates);
    let date_gt = Tensor::from_vec(
        gt.into_iter().flatten().collect::<Vec<f32>>(),
        (num_dates, num_dates),
        &device,
    )?;
    let date_lt = Tensor::from_vec(
        lt.into_iter().flatten().collect::<Vec<f32>>(),
        (num_dates, num_dates),
        &device,
    )?;

    let date_token_mask = Tensor::from_vec(
        inputs
            .token_date_index
            .iter()
            .map(|&index| if index >= 0 { 1.0f32 } else { 0.0 })
            .collect::<Vec<f32>>(),
        passage_len,
        &device,
    )?;

    let mut buckets = vec![0.0f32; passage_len * num_dates];
    for (token, &index) in inputs.token_date_index.iter().enumerate() {
        if index >= 0 {
            buckets[token * num_dates + index as usize] = 1.0;
        }
    }
    let date_buckets = Tensor::from_vec(buckets, (passage_len, num_dates), &device)?;

    Ok(InstanceState {
        question_mask: inputs.question_mask.clone(),
        passage_mask: inputs.passage_mask.clone(),
        question_passage_attention,
        token_date_similarity,
        date_token_mask,
        date_buckets,
        date_gt,
        date_lt,
        dates: inputs.dates.clone(),
        num_dates,
        device,
    })
}

fn log_similarity_statistics(similarity: &Tensor, passage_mask: &Tensor) -> LanguageResult<()> {
    let valid = passage_mask.sum_all()?.to_scalar::<f32>()?;
    if valid > 0.0 {
        let denom = valid * valid;
        let avg_l1_norm = similarity.abs()?.sum_all()?.to_scalar::<f32>()? / denom;
        let avg_value = similarity.sum_all()?.to_scalar::<f32>()? / denom;
        tracing::debug!(avg_l1_norm, avg_value, "token-date similarity statistics");
    } else {
        tracing::warn!("passage mask has no valid tokens; distributions will be degenerate");
    }
    Ok(())
}
