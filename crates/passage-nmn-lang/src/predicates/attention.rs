//! Attention-lookup predicates.
//!
//! Both take their weights from the program executor's side channel (the
//! parser decides what part of the question a program step talks about), not
//! from a prior predicate's output.

use candle_core::Tensor;
use passage_nmn_core::value::{PassageAttention, QuestionAttention};
use passage_nmn_core::LanguageResult;

use crate::state::InstanceState;

/// Identity wrap of externally supplied question-attention weights.
pub fn find_question_attention(
    _state: &InstanceState,
    weights: &Tensor,
) -> LanguageResult<QuestionAttention> {
    Ok(QuestionAttention {
        attention: weights.clone(),
    })
}

/// Project question-attention weights onto the passage.
///
/// The weights are masked, then used to take a weighted sum of the
/// precomputed per-question-token attention rows over the passage, yielding
/// a passage-length attention vector.
pub fn find_passage_attention(
    state: &InstanceState,
    weights: &Tensor,
) -> LanguageResult<PassageAttention> {
    let question_attention = weights.broadcast_mul(&state.question_mask)?;

    // (question_len, passage_len) rows weighted by the question attention.
    let weighted = state
        .question_passage_attention
        .broadcast_mul(&question_attention.unsqueeze(1)?)?;
    let passage_attention = weighted.sum(0)?;

    Ok(PassageAttention {
        attention: passage_attention,
    })
}
