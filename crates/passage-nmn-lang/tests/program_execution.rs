//! End-to-end program execution over a small synthetic instance.
//!
//! Drives the grammar shell the way the external program executor does:
//! predicates invoked by name, side-channel attention weights supplied where
//! required, values threaded from one call into the next until a start-type
//! value comes out.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use passage_nmn_core::{Date, LanguageError, Value, ValueKind};
use passage_nmn_lang::registry::names;
use passage_nmn_lang::{InstanceInputs, LanguageConfig, LearnedParams, NmnLanguage};

const DIM: usize = 4;

/// 3 question tokens, 5 passage tokens, dates at passage tokens 1 (2001)
/// and 3 (2002).
fn instance_inputs(device: &Device) -> InstanceInputs {
    let question = Tensor::new(
        &[
            [1.0f32, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
        device,
    )
    .unwrap();
    let passage = Tensor::new(
        &[
            [1.0f32, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.5, 0.5, 0.0, 0.0],
        ],
        device,
    )
    .unwrap();

    InstanceInputs {
        question_raw: question.clone(),
        question_embedded: question.clone(),
        question_encoded: question,
        passage_raw: passage.clone(),
        passage_embedded: passage.clone(),
        passage_encoded: passage,
        question_mask: Tensor::ones(3, DType::F32, device).unwrap(),
        passage_mask: Tensor::ones(5, DType::F32, device).unwrap(),
        token_date_index: vec![-1, 0, -1, 1, -1],
        dates: vec![Date::new(2001, 1, 1), Date::new(2002, 1, 1)],
    }
}

fn language() -> NmnLanguage {
    let device = Device::Cpu;
    let config = LanguageConfig::default();
    let vb = VarBuilder::zeros(DType::F32, &device);
    let params = LearnedParams::new(&config, DIM, vb).unwrap();
    NmnLanguage::new(&instance_inputs(&device), &config, Box::new(params)).unwrap()
}

fn passage_attention(language: &NmnLanguage, question_weights: &[f32; 3]) -> Value {
    let weights = Tensor::new(question_weights, &Device::Cpu).unwrap();
    language
        .execute(names::FIND_PASSAGE_ATTENTION, Vec::new(), Some(&weights))
        .unwrap()
}

#[test]
fn full_program_produces_a_start_type_value() {
    let language = language();

    let attention_1 = passage_attention(&language, &[1.0, 0.0, 0.0]);
    let attention_2 = passage_attention(&language, &[0.0, 1.0, 0.0]);
    assert_eq!(attention_1.kind(), ValueKind::PassageAttention);

    let compared = language
        .execute(
            names::COMPARE_DATE_GREATER_THAN,
            vec![attention_1, attention_2],
            None,
        )
        .unwrap();
    assert_eq!(compared.kind(), ValueKind::PassageAttentionAnswer);

    let answer = language
        .execute(names::FIND_PASSAGE_SPAN_ANSWER, vec![compared], None)
        .unwrap();
    assert!(language.is_start_type(answer.kind()));

    let span = match answer {
        Value::PassageSpanAnswer(span) => span,
        other => panic!("expected a span answer, got {:?}", other.kind()),
    };
    assert_eq!(span.start_log_probs.dims(), &[5]);
    assert_eq!(span.end_log_probs.dims(), &[5]);
    assert!(span.loss.to_scalar::<f32>().unwrap().is_finite());
}

#[test]
fn question_attention_round_trips_through_the_side_channel() {
    let language = language();
    let weights = Tensor::new(&[0.2f32, 0.3, 0.5], &Device::Cpu).unwrap();

    let value = language
        .execute(names::FIND_QUESTION_ATTENTION, Vec::new(), Some(&weights))
        .unwrap();

    let wrapped = match value {
        Value::QuestionAttention(inner) => inner,
        other => panic!("expected question attention, got {:?}", other.kind()),
    };
    assert_eq!(
        wrapped.attention.to_vec1::<f32>().unwrap(),
        vec![0.2, 0.3, 0.5]
    );
}

#[test]
fn comparison_loss_threads_into_the_span_answer() {
    let language = language();

    let attention_1 = passage_attention(&language, &[1.0, 0.0, 0.0]);
    let attention_2 = passage_attention(&language, &[0.0, 0.0, 1.0]);

    let compared = language
        .execute(
            names::COMPARE_DATE_LESSER_THAN,
            vec![attention_1, attention_2],
            None,
        )
        .unwrap();
    let comparison_loss = match &compared {
        Value::PassageAttentionAnswer(answer) => answer.loss.to_scalar::<f32>().unwrap(),
        other => panic!("expected attention answer, got {:?}", other.kind()),
    };
    assert!(comparison_loss.is_finite());

    let answer = language
        .execute(names::FIND_PASSAGE_SPAN_ANSWER, vec![compared], None)
        .unwrap();
    let span_loss = match answer {
        Value::PassageSpanAnswer(span) => span.loss.to_scalar::<f32>().unwrap(),
        other => panic!("expected span answer, got {:?}", other.kind()),
    };
    assert_eq!(span_loss, comparison_loss, "loss must thread through unchanged");
}

#[test]
fn wrong_argument_kind_fails_with_a_type_violation() {
    let language = language();
    let weights = Tensor::new(&[1.0f32, 0.0, 0.0], &Device::Cpu).unwrap();

    let question_attention = language
        .execute(names::FIND_QUESTION_ATTENTION, Vec::new(), Some(&weights))
        .unwrap();
    let passage_attention = passage_attention(&language, &[0.0, 1.0, 0.0]);

    let err = language
        .execute(
            names::COMPARE_DATE_GREATER_THAN,
            vec![question_attention, passage_attention],
            None,
        )
        .unwrap_err();

    match err {
        LanguageError::TypeViolation {
            predicate,
            position,
            expected,
            actual,
        } => {
            assert_eq!(predicate, names::COMPARE_DATE_GREATER_THAN);
            assert_eq!(position, 0);
            assert_eq!(expected, ValueKind::PassageAttention);
            assert_eq!(actual, ValueKind::QuestionAttention);
        }
        other => panic!("expected TypeViolation, got {other:?}"),
    }
}

#[test]
fn wrong_arity_fails_before_execution() {
    let language = language();
    let attention = passage_attention(&language, &[1.0, 0.0, 0.0]);

    let err = language
        .execute(names::COMPARE_DATE_GREATER_THAN, vec![attention], None)
        .unwrap_err();
    assert!(
        matches!(
            err,
            LanguageError::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ),
        "got {err:?}"
    );
}

#[test]
fn missing_side_input_is_reported() {
    let language = language();
    let err = language
        .execute(names::FIND_PASSAGE_ATTENTION, Vec::new(), None)
        .unwrap_err();
    assert!(matches!(err, LanguageError::MissingSideInput { .. }), "got {err:?}");
}

#[test]
fn passage_attention_mass_follows_the_question() {
    // With dot-product scoring over one-hot embeddings, question token 0
    // attends to passage tokens that share its direction; the projected
    // passage attention must be a proper distribution.
    let language = language();
    let value = passage_attention(&language, &[1.0, 0.0, 0.0]);

    let attention = match value {
        Value::PassageAttention(inner) => inner.attention,
        other => panic!("expected passage attention, got {:?}", other.kind()),
    };
    let weights = attention.to_vec1::<f32>().unwrap();
    let total: f32 = weights.iter().sum();
    assert!((total - 1.0).abs() < 1e-4, "projected attention sums to {total}");
    assert!(weights.iter().all(|w| *w >= 0.0));
}
