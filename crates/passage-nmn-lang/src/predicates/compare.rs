//! Date-comparison predicates.
//!
//! Both comparisons share one shape: score each input attention into a
//! distribution over the instance's unique dates, take the expected truth
//! value of the comparison under the joint (independent) distribution, and
//! blend the two input attentions with that probability. The greater variant
//! weights attention 1 by `P(date1 > date2)`; the lesser variant weights it
//! by the complement `1 − P(date1 > date2)`, which keeps the two predicates
//! exactly complementary on identical inputs.
//!
//! The auxiliary loss adds both distribution entropies and subtracts both
//! directed KL terms. The mixed signs are intentional; see
//! [`crate::ops::neg_kl_term`].

use candle_core::Tensor;
use passage_nmn_core::value::{PassageAttention, PassageAttentionAnswer};
use passage_nmn_core::LanguageResult;

use crate::ops;
use crate::scoring::{date_distribution, expected_comparison, Comparison};
use crate::state::InstanceState;

/// `weight · attention_1 + (1 − weight) · attention_2`.
fn blend(
    attention_1: &Tensor,
    attention_2: &Tensor,
    weight_1: &Tensor,
) -> candle_core::Result<Tensor> {
    let weighted_1 = attention_1.broadcast_mul(weight_1)?;
    let weighted_2 = attention_2.broadcast_mul(&weight_1.affine(-1.0, 1.0)?)?;
    weighted_1.add(&weighted_2)
}

/// Shared implementation of `compare_date_greater_than` and
/// `compare_date_lesser_than`.
pub fn compare_dates(
    state: &InstanceState,
    attention_1: PassageAttention,
    attention_2: PassageAttention,
    comparison: Comparison,
) -> LanguageResult<PassageAttentionAnswer> {
    let attention_1 = attention_1.attention.broadcast_mul(&state.passage_mask)?;
    let attention_2 = attention_2.attention.broadcast_mul(&state.passage_mask)?;

    if state.num_dates == 0 {
        // Degenerate instance: no dates at all. The expectation is zero, the
        // loss contributes nothing, and the blend follows from weight 0.
        let weight_1 = match comparison {
            Comparison::Greater => ops::scalar_zero(&state.device)?,
            Comparison::Lesser => ops::scalar_zero(&state.device)?.affine(-1.0, 1.0)?,
        };
        let blended = blend(&attention_1, &attention_2, &weight_1)?;
        return Ok(PassageAttentionAnswer {
            attention: blended,
            loss: ops::scalar_zero(&state.device)?,
        });
    }

    let distribution_1 = date_distribution(state, &attention_1)?;
    let distribution_2 = date_distribution(state, &attention_2)?;

    let loss = ops::entropy_with_floor(&distribution_1)?
        .add(&ops::entropy_with_floor(&distribution_2)?)?
        .add(&ops::neg_kl_term(&distribution_1, &distribution_2)?)?
        .add(&ops::neg_kl_term(&distribution_2, &distribution_1)?)?;

    let prob_1_greater =
        expected_comparison(state, &distribution_1, &distribution_2, Comparison::Greater)?;
    let weight_1 = match comparison {
        Comparison::Greater => prob_1_greater,
        Comparison::Lesser => prob_1_greater.affine(-1.0, 1.0)?,
    };

    let blended = blend(&attention_1, &attention_2, &weight_1)?;

    Ok(PassageAttentionAnswer {
        attention: blended,
        loss,
    })
}
