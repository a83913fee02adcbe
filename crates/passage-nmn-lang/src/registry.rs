//! Static predicate registry.
//!
//! Maps each operator name the parser can emit to its type signature and
//! implementation. Built once at first use; the grammar's production rules
//! are derived from it, so registering a predicate here is the single step
//! that makes it visible to the language.

use std::sync::OnceLock;

use candle_core::Tensor;
use passage_nmn_core::{LanguageError, LanguageResult, Value, ValueKind};

use crate::language::NmnLanguage;
use crate::predicates;
use crate::scoring::Comparison;

/// Operator names, exactly as the program executor invokes them.
pub mod names {
    pub const FIND_QUESTION_ATTENTION: &str = "find_QuestionAttention";
    pub const FIND_PASSAGE_ATTENTION: &str = "find_PassageAttention";
    pub const COMPARE_DATE_GREATER_THAN: &str = "compare_date_greater_than";
    pub const COMPARE_DATE_LESSER_THAN: &str = "compare_date_lesser_than";
    pub const FIND_PASSAGE_SPAN_ANSWER: &str = "find_passageSpanAnswer";
}

/// Side-channel input a predicate requires from the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideInput {
    None,
    /// Raw attention weights over the question, chosen by the parser.
    QuestionAttention,
}

/// Implementation signature for a registered predicate.
pub type PredicateFn =
    fn(&NmnLanguage, Vec<Value>, Option<&Tensor>) -> LanguageResult<Value>;

/// One registered operator: name, signature, and implementation.
pub struct PredicateDef {
    pub name: &'static str,
    pub arguments: &'static [ValueKind],
    pub output: ValueKind,
    pub side_input: SideInput,
    pub run: PredicateFn,
}

impl PredicateDef {
    /// Production rule string, e.g.
    /// `PassageAttentionAnswer -> compare_date_greater_than(PassageAttention, PassageAttention)`.
    pub fn production_rule(&self) -> String {
        if self.arguments.is_empty() {
            format!("{} -> {}", self.output.name(), self.name)
        } else {
            let arguments = self
                .arguments
                .iter()
                .map(ValueKind::name)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} -> {}({})", self.output.name(), self.name, arguments)
        }
    }
}

static REGISTRY: OnceLock<Vec<PredicateDef>> = OnceLock::new();

/// All registered predicates, in registration order.
pub fn registry() -> &'static [PredicateDef] {
    REGISTRY.get_or_init(build).as_slice()
}

/// Find a predicate by operator name.
pub fn lookup(name: &str) -> Option<&'static PredicateDef> {
    registry().iter().find(|def| def.name == name)
}

fn build() -> Vec<PredicateDef> {
    vec![
        PredicateDef {
            name: names::FIND_QUESTION_ATTENTION,
            arguments: &[],
            output: ValueKind::QuestionAttention,
            side_input: SideInput::QuestionAttention,
            run: run_find_question_attention,
        },
        PredicateDef {
            name: names::FIND_PASSAGE_ATTENTION,
            arguments: &[],
            output: ValueKind::PassageAttention,
            side_input: SideInput::QuestionAttention,
            run: run_find_passage_attention,
        },
        PredicateDef {
            name: names::COMPARE_DATE_GREATER_THAN,
            arguments: &[ValueKind::PassageAttention, ValueKind::PassageAttention],
            output: ValueKind::PassageAttentionAnswer,
            side_input: SideInput::None,
            run: run_compare_date_greater_than,
        },
        PredicateDef {
            name: names::COMPARE_DATE_LESSER_THAN,
            arguments: &[ValueKind::PassageAttention, ValueKind::PassageAttention],
            output: ValueKind::PassageAttentionAnswer,
            side_input: SideInput::None,
            run: run_compare_date_lesser_than,
        },
        PredicateDef {
            name: names::FIND_PASSAGE_SPAN_ANSWER,
            arguments: &[ValueKind::PassageAttentionAnswer],
            output: ValueKind::PassageSpanAnswer,
            side_input: SideInput::None,
            run: run_find_passage_span_answer,
        },
    ]
}

fn require_side_input<'t>(
    side_input: Option<&'t Tensor>,
    predicate: &'static str,
) -> LanguageResult<&'t Tensor> {
    side_input.ok_or(LanguageError::MissingSideInput {
        predicate,
        side_input: "question attention",
    })
}

fn run_find_question_attention(
    language: &NmnLanguage,
    _arguments: Vec<Value>,
    side_input: Option<&Tensor>,
) -> LanguageResult<Value> {
    let state = language.state()?;
    let weights = require_side_input(side_input, names::FIND_QUESTION_ATTENTION)?;
    Ok(Value::QuestionAttention(
        predicates::find_question_attention(state, weights)?,
    ))
}

fn run_find_passage_attention(
    language: &NmnLanguage,
    _arguments: Vec<Value>,
    side_input: Option<&Tensor>,
) -> LanguageResult<Value> {
    let state = language.state()?;
    let weights = require_side_input(side_input, names::FIND_PASSAGE_ATTENTION)?;
    Ok(Value::PassageAttention(predicates::find_passage_attention(
        state, weights,
    )?))
}

fn run_compare(
    language: &NmnLanguage,
    arguments: Vec<Value>,
    predicate: &'static str,
    comparison: Comparison,
) -> LanguageResult<Value> {
    let state = language.state()?;
    let [first, second] = <[Value; 2]>::try_from(arguments).map_err(|arguments| {
        LanguageError::ArityMismatch {
            predicate,
            expected: 2,
            actual: arguments.len(),
        }
    })?;
    let attention_1 = first.expect_passage_attention(predicate, 0)?;
    let attention_2 = second.expect_passage_attention(predicate, 1)?;
    Ok(Value::PassageAttentionAnswer(predicates::compare_dates(
        state,
        attention_1,
        attention_2,
        comparison,
    )?))
}

fn run_compare_date_greater_than(
    language: &NmnLanguage,
    arguments: Vec<Value>,
    _side_input: Option<&Tensor>,
) -> LanguageResult<Value> {
    run_compare(
        language,
        arguments,
        names::COMPARE_DATE_GREATER_THAN,
        Comparison::Greater,
    )
}

fn run_compare_date_lesser_than(
    language: &NmnLanguage,
    arguments: Vec<Value>,
    _side_input: Option<&Tensor>,
) -> LanguageResult<Value> {
    run_compare(
        language,
        arguments,
        names::COMPARE_DATE_LESSER_THAN,
        Comparison::Lesser,
    )
}

fn run_find_passage_span_answer(
    language: &NmnLanguage,
    arguments: Vec<Value>,
    _side_input: Option<&Tensor>,
) -> LanguageResult<Value> {
    let state = language.state()?;
    let params = language.params()?;
    let [input] = <[Value; 1]>::try_from(arguments).map_err(|arguments| {
        LanguageError::ArityMismatch {
            predicate: names::FIND_PASSAGE_SPAN_ANSWER,
            expected: 1,
            actual: arguments.len(),
        }
    })?;
    let input = input.expect_passage_attention_answer(names::FIND_PASSAGE_SPAN_ANSWER, 0)?;
    Ok(Value::PassageSpanAnswer(
        predicates::find_passage_span_answer(state, params, input)?,
    ))
}
