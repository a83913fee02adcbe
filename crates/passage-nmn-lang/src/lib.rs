//! Executable language core for differentiable QA over passages.
//!
//! A question is parsed (externally) into a program whose primitive
//! operations are learned neural functions over attention distributions,
//! not discrete symbolic values. This crate supplies everything between the
//! encoder outputs and the program executor:
//!
//! - [`ops`]: masked softmax/log-softmax and the loss-term arithmetic
//! - [`params`]: the learned-parameter seam ([`params::ExecutorParams`]) and
//!   its default candle implementation
//! - [`state`]: two-phase construction of the immutable per-instance state,
//!   including the precomputed attention/similarity/comparison matrices
//! - [`scoring`]: the date-scoring and expected-comparison engines
//! - [`predicates`]: the executable operators exposed to the grammar
//! - [`registry`]: the static operator registry (name, signature, function)
//! - [`language`]: the grammar shell tying the above together per instance
//!
//! # Execution model
//!
//! The shell is constructed once per question/passage pair; the external
//! executor then invokes predicates by name in program order. Each call
//! produces a new typed [`passage_nmn_core::Value`] (possibly carrying an
//! accumulated loss) consumed by the next call, until a start-type value is
//! produced and handed back for loss computation and decoding.
//!
//! Everything is synchronous and single-threaded; the per-instance state is
//! read-only after construction and shared freely across predicate calls
//! within one program execution.

pub mod config;
pub mod language;
pub mod ops;
pub mod params;
pub mod predicates;
pub mod registry;
pub mod scoring;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{LanguageConfig, RepresentationSource};
pub use language::NmnLanguage;
pub use params::{ExecutorParams, LearnedParams};
pub use scoring::Comparison;
pub use state::{InstanceInputs, InstanceState};
