//! Inactive extension value types.
//!
//! These types give the grammar room to grow toward date arithmetic,
//! counting, and number aggregation. They are part of the type system but no
//! registered predicate produces or consumes them yet, so they sit outside
//! the [`Value`](super::Value) sum. Wiring one in means adding a `Value`
//! variant, a `ValueKind` tag, and the predicate(s) over it.

use candle_core::Tensor;

/// A date as three independent categorical distributions, one per field.
///
/// Intended output type for soft date arithmetic (`date + delta`).
#[derive(Debug, Clone)]
pub struct DateDistribution {
    pub year_distribution: Tensor,
    pub month_distribution: Tensor,
    pub day_distribution: Tensor,
}

/// A signed offset between dates, one delta distribution per field.
///
/// Intended operand type for soft date arithmetic.
#[derive(Debug, Clone)]
pub struct DateDelta {
    pub year_delta: Tensor,
    pub month_delta: Tensor,
    pub day_delta: Tensor,
}

/// Distribution over candidate counts of a phenomenon in the passage.
///
/// Intended output type for a counting predicate over a passage attention.
#[derive(Debug, Clone)]
pub struct CountAnswer {
    pub distribution: Tensor,
}

/// Distribution over candidate numeric answers from addition/subtraction
/// over passage numbers.
#[derive(Debug, Clone)]
pub struct NumberAnswer {
    pub distribution: Tensor,
}
