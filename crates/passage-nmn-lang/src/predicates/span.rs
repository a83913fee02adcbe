//! Span decoding: from a passage attention to start/end pointers.

use candle_core::{IndexOp, Tensor};
use passage_nmn_core::value::{PassageAttentionAnswer, PassageSpanAnswer};
use passage_nmn_core::LanguageResult;

use crate::ops;
use crate::params::ExecutorParams;
use crate::state::InstanceState;

/// Decode start/end log-probability sequences over the passage.
///
/// The attention is masked, rescaled by each configured scaling value, and
/// the rescaled copies are stacked into per-token feature vectors for the
/// span encoder; a 2-output projection then yields per-token (start, end)
/// logits. Both the raw logits and the log-probabilities are independently
/// sanitized to [`ops::NEG_FILL`] at invalid positions so that a masked
/// token can neither win span selection nor retain probability mass after
/// renormalization.
///
/// The input's accumulated loss is threaded through unchanged.
pub fn find_passage_span_answer(
    state: &InstanceState,
    params: &dyn ExecutorParams,
    input: PassageAttentionAnswer,
) -> LanguageResult<PassageSpanAnswer> {
    let attention = input.attention.broadcast_mul(&state.passage_mask)?;

    let scaling_values = params.attention_scaling_values();
    let mut scaled = Vec::with_capacity(scaling_values.len());
    for &factor in scaling_values {
        scaled.push(attention.affine(factor as f64, 0.0)?);
    }
    // (passage_len, num_scaling_values)
    let features = Tensor::stack(&scaled, 1)?;

    // (passage_len, span_hidden_dim)
    let hidden = params.encode_span_features(&features, &state.passage_mask)?;
    // (passage_len, 2)
    let logits = params.project_span_logits(&hidden)?;

    let start_logits = logits.i((.., 0))?;
    let end_logits = logits.i((.., 1))?;

    let start_logits =
        ops::replace_masked_values(&start_logits, &state.passage_mask, ops::NEG_FILL)?;
    let end_logits = ops::replace_masked_values(&end_logits, &state.passage_mask, ops::NEG_FILL)?;

    let start_log_probs = ops::masked_log_softmax(&start_logits, &state.passage_mask, 0)?;
    let end_log_probs = ops::masked_log_softmax(&end_logits, &state.passage_mask, 0)?;

    let start_log_probs =
        ops::replace_masked_values(&start_log_probs, &state.passage_mask, ops::NEG_FILL)?;
    let end_log_probs =
        ops::replace_masked_values(&end_log_probs, &state.passage_mask, ops::NEG_FILL)?;

    Ok(PassageSpanAnswer {
        start_log_probs,
        end_log_probs,
        start_logits,
        end_logits,
        loss: input.loss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageConfig;
    use crate::params::LearnedParams;
    use crate::testing::identity_state;
    use candle_core::{DType, Device};
    use candle_nn::VarBuilder;

    fn zeroed_params() -> LearnedParams {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        LearnedParams::new(&LanguageConfig::default(), 2, vb).unwrap()
    }

    fn answer_input(values: &[f32], loss: f32) -> PassageAttentionAnswer {
        let device = Device::Cpu;
        PassageAttentionAnswer {
            attention: Tensor::new(values, &device).unwrap(),
            loss: Tensor::new(loss, &device).unwrap(),
        }
    }

    #[test]
    fn masked_tail_position_gets_the_sentinel_everywhere() {
        let mut state = identity_state(5, vec![-1; 5], vec![]);
        state.passage_mask =
            Tensor::new(&[1.0f32, 1.0, 1.0, 1.0, 0.0], &Device::Cpu).unwrap();
        let params = zeroed_params();

        let answer = find_passage_span_answer(
            &state,
            &params,
            answer_input(&[0.2, 0.2, 0.2, 0.2, 0.2], 0.0),
        )
        .unwrap();

        let sentinel = ops::NEG_FILL as f32;
        assert_eq!(answer.start_logits.to_vec1::<f32>().unwrap()[4], sentinel);
        assert_eq!(answer.end_logits.to_vec1::<f32>().unwrap()[4], sentinel);
        assert_eq!(answer.start_log_probs.to_vec1::<f32>().unwrap()[4], sentinel);
        assert_eq!(answer.end_log_probs.to_vec1::<f32>().unwrap()[4], sentinel);

        // Zero-initialized weights give uniform log-probs over the 4 valid
        // positions.
        let start = answer.start_log_probs.to_vec1::<f32>().unwrap();
        let expected = -(4.0f32).ln();
        for position in 0..4 {
            assert!(
                (start[position] - expected).abs() < 1e-4,
                "position {position}: got {}, expected {expected}",
                start[position]
            );
        }
    }

    #[test]
    fn all_masked_passage_yields_sentinel_sequences_and_no_mass() {
        let mut state = identity_state(4, vec![-1; 4], vec![]);
        state.passage_mask = Tensor::zeros(4, DType::F32, &Device::Cpu).unwrap();
        let params = zeroed_params();

        let answer = find_passage_span_answer(
            &state,
            &params,
            answer_input(&[0.25, 0.25, 0.25, 0.25], 0.0),
        )
        .unwrap();

        let sentinel = ops::NEG_FILL as f32;
        for log_prob in answer.start_log_probs.to_vec1::<f32>().unwrap() {
            assert_eq!(log_prob, sentinel);
            assert_eq!(log_prob.exp(), 0.0, "masked position held probability mass");
        }
        for log_prob in answer.end_log_probs.to_vec1::<f32>().unwrap() {
            assert_eq!(log_prob, sentinel);
        }
    }

    #[test]
    fn accumulated_loss_is_threaded_through() {
        let state = identity_state(3, vec![-1; 3], vec![]);
        let params = zeroed_params();

        let answer = find_passage_span_answer(
            &state,
            &params,
            answer_input(&[0.5, 0.3, 0.2], 2.5),
        )
        .unwrap();

        assert_eq!(answer.loss.to_scalar::<f32>().unwrap(), 2.5);
    }

    #[test]
    fn output_sequences_cover_the_passage() {
        let state = identity_state(6, vec![-1; 6], vec![]);
        let params = zeroed_params();

        let answer = find_passage_span_answer(
            &state,
            &params,
            answer_input(&[0.1, 0.2, 0.3, 0.2, 0.1, 0.1], 0.0),
        )
        .unwrap();

        assert_eq!(answer.start_log_probs.dims(), &[6]);
        assert_eq!(answer.end_log_probs.dims(), &[6]);
        assert_eq!(answer.start_logits.dims(), &[6]);
        assert_eq!(answer.end_logits.dims(), &[6]);
    }
}
