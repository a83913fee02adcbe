//! Error taxonomy for program execution.
//!
//! Two kinds of failure exist and only two:
//!
//! - **Contract violations** ([`LanguageError::TypeViolation`],
//!   [`LanguageError::ArityMismatch`], [`LanguageError::UnknownPredicate`],
//!   [`LanguageError::UnknownComparison`]): a malformed program or a
//!   programming error. These fail fast and abort the program's evaluation.
//! - **Infrastructure failures** ([`LanguageError::Tensor`]): the tensor
//!   runtime rejected an operation.
//!
//! Degenerate numeric states (all-masked attention, empty date distribution)
//! are deliberately NOT errors; they propagate as zero or near-zero
//! distributions so that a single malformed span cannot abort a batch.

use thiserror::Error;

use crate::value::ValueKind;

/// Result alias used throughout the language crates.
pub type LanguageResult<T> = Result<T, LanguageError>;

/// Failures raised while executing a program against an instance.
#[derive(Debug, Error)]
pub enum LanguageError {
    /// A predicate received a value of the wrong kind.
    ///
    /// Never coerced silently; the executor treats this as the whole
    /// program's evaluation failing.
    #[error("type violation: {predicate} expected {expected:?} for argument {position}, got {actual:?}")]
    TypeViolation {
        predicate: &'static str,
        position: usize,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A predicate received the wrong number of arguments.
    #[error("arity mismatch: {predicate} takes {expected} arguments, got {actual}")]
    ArityMismatch {
        predicate: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A predicate required a side-channel input the executor did not supply.
    #[error("missing side input: {predicate} requires externally supplied {side_input} weights")]
    MissingSideInput {
        predicate: &'static str,
        side_input: &'static str,
    },

    /// The program named a predicate the registry does not know.
    #[error("unknown predicate: {0:?}")]
    UnknownPredicate(String),

    /// An unrecognized comparison mode string.
    ///
    /// A programming-contract failure, unreachable from a well-formed
    /// grammar.
    #[error("unknown comparison mode: {0:?}")]
    UnknownComparison(String),

    /// A representation mode the language does not support yet.
    #[error("unsupported representation mode: {mode}")]
    UnsupportedRepresentation { mode: &'static str },

    /// Predicate execution was attempted on a placeholder instance.
    ///
    /// Placeholder instances carry no tensors and exist only so callers can
    /// introspect the available production rules.
    #[error("placeholder instance cannot execute predicates")]
    PlaceholderInstance,

    /// Upstream tensors violated the instance construction contract.
    #[error("inconsistent instance: {reason}")]
    InconsistentInstance { reason: String },

    /// The tensor runtime rejected an operation.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_violation_names_the_offending_argument() {
        let err = LanguageError::TypeViolation {
            predicate: "compare_date_greater_than",
            position: 1,
            expected: ValueKind::PassageAttention,
            actual: ValueKind::QuestionAttention,
        };
        let msg = err.to_string();
        assert!(msg.contains("compare_date_greater_than"), "got: {msg}");
        assert!(msg.contains("PassageAttention"), "got: {msg}");
        assert!(msg.contains("argument 1"), "got: {msg}");
    }

    #[test]
    fn unknown_comparison_carries_the_mode_string() {
        let err = LanguageError::UnknownComparison("between".to_string());
        assert!(err.to_string().contains("between"));
    }
}
