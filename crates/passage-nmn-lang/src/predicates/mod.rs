//! The executable operators exposed to the grammar.
//!
//! Every predicate is a pure function from typed inputs to a typed output;
//! none raises under normal operation. Type violations are surfaced by the
//! registry dispatch layer before these functions run, so the implementations
//! here receive already-unwrapped payloads.
//!
//! | Predicate | Input | Output |
//! |---|---|---|
//! | `find_QuestionAttention` | side-channel weights | `QuestionAttention` |
//! | `find_PassageAttention` | side-channel weights | `PassageAttention` |
//! | `compare_date_greater_than` | two `PassageAttention`s | `PassageAttentionAnswer` |
//! | `compare_date_lesser_than` | two `PassageAttention`s | `PassageAttentionAnswer` |
//! | `find_passageSpanAnswer` | `PassageAttentionAnswer` | `PassageSpanAnswer` |

pub mod attention;
pub mod compare;
pub mod span;

pub use attention::{find_passage_attention, find_question_attention};
pub use compare::compare_dates;
pub use span::find_passage_span_answer;
