//! Typed values flowing through a program execution.
//!
//! Every predicate consumes and produces values of fixed kinds; the executor
//! threads them through a single-use data-flow chain (each value is produced
//! by one predicate and consumed by exactly the next). [`Value`] is the
//! closed sum of everything that can flow; [`ValueKind`] is its tag, used by
//! the registry to describe predicate signatures and by the grammar to name
//! its start types.
//!
//! Answer-producing values additionally carry an accumulated scalar loss
//! (a 0-dim tensor) threaded forward from earlier predicates in the chain.
//! The loss is an additive training-time component, not the final training
//! loss.

use candle_core::Tensor;

use crate::error::{LanguageError, LanguageResult};

pub mod ext;

/// Tag identifying the kind of a [`Value`].
///
/// Also used standalone: predicate signatures are lists of kinds, and the
/// grammar's start-type set is a set of kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    QuestionAttention,
    PassageAttention,
    PassageAttentionAnswer,
    PassageSpanAnswer,
    QuestionSpanAnswer,
}

impl ValueKind {
    /// Name used in production-rule listings.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::QuestionAttention => "QuestionAttention",
            ValueKind::PassageAttention => "PassageAttention",
            ValueKind::PassageAttentionAnswer => "PassageAttentionAnswer",
            ValueKind::PassageSpanAnswer => "PassageSpanAnswer",
            ValueKind::QuestionSpanAnswer => "QuestionSpanAnswer",
        }
    }
}

/// Attention distribution over question tokens.
#[derive(Debug, Clone)]
pub struct QuestionAttention {
    pub attention: Tensor,
}

/// Attention distribution over passage tokens.
#[derive(Debug, Clone)]
pub struct PassageAttention {
    pub attention: Tensor,
}

/// Passage attention produced by an answer-directed predicate, carrying the
/// loss accumulated so far.
#[derive(Debug, Clone)]
pub struct PassageAttentionAnswer {
    pub attention: Tensor,
    /// Scalar (0-dim) accumulated auxiliary loss.
    pub loss: Tensor,
}

/// Span answer over the passage: start/end log-probability sequences for the
/// loss, raw logits for decoding, and the threaded loss.
#[derive(Debug, Clone)]
pub struct PassageSpanAnswer {
    pub start_log_probs: Tensor,
    pub end_log_probs: Tensor,
    pub start_logits: Tensor,
    pub end_logits: Tensor,
    /// Scalar (0-dim) accumulated auxiliary loss.
    pub loss: Tensor,
}

/// Span answer over the question.
///
/// Declared start type with no active producing predicate; see
/// [`ext`](self::ext) for the other inactive extension points.
#[derive(Debug, Clone)]
pub struct QuestionSpanAnswer {
    pub start_log_probs: Tensor,
    pub end_log_probs: Tensor,
    pub start_logits: Tensor,
    pub end_logits: Tensor,
}

/// The closed sum of values a predicate can produce or consume.
#[derive(Debug, Clone)]
pub enum Value {
    QuestionAttention(QuestionAttention),
    PassageAttention(PassageAttention),
    PassageAttentionAnswer(PassageAttentionAnswer),
    PassageSpanAnswer(PassageSpanAnswer),
    QuestionSpanAnswer(QuestionSpanAnswer),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::QuestionAttention(_) => ValueKind::QuestionAttention,
            Value::PassageAttention(_) => ValueKind::PassageAttention,
            Value::PassageAttentionAnswer(_) => ValueKind::PassageAttentionAnswer,
            Value::PassageSpanAnswer(_) => ValueKind::PassageSpanAnswer,
            Value::QuestionSpanAnswer(_) => ValueKind::QuestionSpanAnswer,
        }
    }

    fn type_violation(
        &self,
        predicate: &'static str,
        position: usize,
        expected: ValueKind,
    ) -> LanguageError {
        LanguageError::TypeViolation {
            predicate,
            position,
            expected,
            actual: self.kind(),
        }
    }

    /// Unwrap a passage attention, failing with a [`LanguageError::TypeViolation`]
    /// naming the predicate and argument position otherwise.
    pub fn expect_passage_attention(
        self,
        predicate: &'static str,
        position: usize,
    ) -> LanguageResult<PassageAttention> {
        match self {
            Value::PassageAttention(inner) => Ok(inner),
            other => {
                Err(other.type_violation(predicate, position, ValueKind::PassageAttention))
            }
        }
    }

    /// Unwrap a passage attention answer; see [`Self::expect_passage_attention`].
    pub fn expect_passage_attention_answer(
        self,
        predicate: &'static str,
        position: usize,
    ) -> LanguageResult<PassageAttentionAnswer> {
        match self {
            Value::PassageAttentionAnswer(inner) => Ok(inner),
            other => Err(other.type_violation(
                predicate,
                position,
                ValueKind::PassageAttentionAnswer,
            )),
        }
    }

    /// Unwrap a question attention; see [`Self::expect_passage_attention`].
    pub fn expect_question_attention(
        self,
        predicate: &'static str,
        position: usize,
    ) -> LanguageResult<QuestionAttention> {
        match self {
            Value::QuestionAttention(inner) => Ok(inner),
            other => {
                Err(other.type_violation(predicate, position, ValueKind::QuestionAttention))
            }
        }
    }

    /// Unwrap a passage span answer; see [`Self::expect_passage_attention`].
    pub fn expect_passage_span_answer(
        self,
        predicate: &'static str,
        position: usize,
    ) -> LanguageResult<PassageSpanAnswer> {
        match self {
            Value::PassageSpanAnswer(inner) => Ok(inner),
            other => {
                Err(other.type_violation(predicate, position, ValueKind::PassageSpanAnswer))
            }
        }
    }
}
