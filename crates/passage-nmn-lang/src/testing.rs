//! Hand-built instance states for unit tests.

use candle_core::{DType, Device, Tensor};
use passage_nmn_core::date::{comparison_matrices, Date};

use crate::state::InstanceState;

/// State with an identity token→date similarity matrix, so a passage
/// attention passes through the date-scoring engine unchanged before the
/// softmax. Question-side fields are placeholders sized for 3 tokens.
pub(crate) fn identity_state(
    passage_len: usize,
    token_date_index: Vec<i64>,
    dates: Vec<Date>,
) -> InstanceState {
    let device = Device::Cpu;
    let num_dates = dates.len();

    let mut identity = vec![0.0f32; passage_len * passage_len];
    for i in 0..passage_len {
        identity[i * passage_len + i] = 1.0;
    }

    let mut buckets = vec![0.0f32; passage_len * num_dates];
    for (token, &index) in token_date_index.iter().enumerate() {
        if index >= 0 {
            buckets[token * num_dates + index as usize] = 1.0;
        }
    }

    let (gt, lt) = comparison_matrices(&dates);

    InstanceState {
        question_mask: Tensor::ones(3, DType::F32, &device).unwrap(),
        passage_mask: Tensor::ones(passage_len, DType::F32, &device).unwrap(),
        question_passage_attention: Tensor::zeros((3, passage_len), DType::F32, &device).unwrap(),
        token_date_similarity: Tensor::from_vec(identity, (passage_len, passage_len), &device)
            .unwrap(),
        date_token_mask: Tensor::from_vec(
            token_date_index
                .iter()
                .map(|&i| if i >= 0 { 1.0f32 } else { 0.0 })
                .collect::<Vec<f32>>(),
            passage_len,
            &device,
        )
        .unwrap(),
        date_buckets: Tensor::from_vec(buckets, (passage_len, num_dates), &device).unwrap(),
        date_gt: Tensor::from_vec(
            gt.into_iter().flatten().collect::<Vec<f32>>(),
            (num_dates, num_dates),
            &device,
        )
        .unwrap(),
        date_lt: Tensor::from_vec(
            lt.into_iter().flatten().collect::<Vec<f32>>(),
            (num_dates, num_dates),
            &device,
        )
        .unwrap(),
        dates,
        num_dates,
        device,
    }
}
