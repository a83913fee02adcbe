//! Core domain types for the passage NMN executable language.
//!
//! This crate defines the tensor-free and tensor-carrying values that flow
//! through a program execution:
//!
//! - [`date::Date`]: partially specified calendar dates with deliberately
//!   non-transitive equality, plus the pairwise comparison matrices built
//!   from them
//! - [`value::Value`]: the closed sum of typed values a predicate can
//!   produce or consume
//! - [`error::LanguageError`]: the error taxonomy for program execution
//!
//! The execution semantics themselves (instance state, precomputation,
//! predicates, registry) live in `passage-nmn-lang`.

pub mod date;
pub mod error;
pub mod value;

pub use date::Date;
pub use error::{LanguageError, LanguageResult};
pub use value::{Value, ValueKind};
