//! Masked tensor primitives shared by the predicates.
//!
//! Masks are f32 tensors of 0.0/1.0, broadcastable against the values they
//! mask. All functions here follow the language's degenerate-state policy:
//! an all-masked input produces an all-zero (or all-[`NEG_FILL`]) output
//! rather than an error, and logarithms are floored so that empty
//! distributions never propagate NaN/Inf.

use candle_core::{Result, Tensor};

/// Fill value for invalid logit positions. Large enough that no masked
/// position can ever win span selection, small enough to stay finite in f32.
pub const NEG_FILL: f64 = -1e32;

/// Additive floor applied inside logarithms over probability values.
pub const LOG_FLOOR: f64 = 1e-40;

/// `(1 - mask) * NEG_FILL`, broadcast-added to the scores.
fn fill_masked(scores: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let fill = mask.affine(-1.0, 1.0)?.affine(NEG_FILL, 0.0)?;
    scores.broadcast_add(&fill)
}

/// Softmax restricted to valid positions.
///
/// Invalid positions receive exactly zero probability; rows with no valid
/// position at all come out as all zeros (not uniform, not an error).
pub fn masked_softmax(scores: &Tensor, mask: &Tensor, dim: usize) -> Result<Tensor> {
    let filled = fill_masked(scores, mask)?;
    let probs = candle_nn::ops::softmax(&filled, dim)?;
    probs.broadcast_mul(mask)
}

/// Log-softmax restricted to valid positions.
///
/// Invalid positions contribute no probability mass to the normalizer. The
/// returned log-probabilities at invalid positions are NOT sanitized here;
/// callers that hand them to a loss must apply [`replace_masked_values`].
pub fn masked_log_softmax(logits: &Tensor, mask: &Tensor, dim: usize) -> Result<Tensor> {
    let filled = fill_masked(logits, mask)?;
    candle_nn::ops::log_softmax(&filled, dim)
}

/// Replace values at invalid positions with `fill`, keeping valid positions
/// untouched.
pub fn replace_masked_values(values: &Tensor, mask: &Tensor, fill: f64) -> Result<Tensor> {
    let kept = values.broadcast_mul(mask)?;
    let filler = mask.affine(-1.0, 1.0)?.affine(fill, 0.0)?;
    kept.broadcast_add(&filler)
}

/// Shannon entropy `-Σ p·ln(p + LOG_FLOOR)` as a 0-dim tensor.
pub fn entropy_with_floor(dist: &Tensor) -> Result<Tensor> {
    let log_p = dist.affine(1.0, LOG_FLOOR)?.log()?;
    dist.mul(&log_p)?.sum_all()?.neg()
}

/// Negated pointwise KL term `-mean(target · (ln(target + LOG_FLOOR) - input))`.
///
/// `input` is consumed as given; only `target` is floored before the log.
/// This is the exact arithmetic the date-comparison loss is built from, and
/// it is not a well-formed divergence; do not "correct" it.
pub fn neg_kl_term(input: &Tensor, target: &Tensor) -> Result<Tensor> {
    let log_target = target.affine(1.0, LOG_FLOOR)?.log()?;
    let pointwise = target.mul(&log_target.sub(input)?)?;
    pointwise.mean_all()?.neg()
}

/// 0-dim zero tensor, used as the default accumulated loss.
pub fn scalar_zero(device: &candle_core::Device) -> Result<Tensor> {
    Tensor::new(0f32, device)
}
