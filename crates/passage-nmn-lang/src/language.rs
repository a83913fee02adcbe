//! The grammar shell: per-instance composition root.
//!
//! An [`NmnLanguage`] binds one question/passage instance's precomputed
//! state and its learned parameters, and exposes the registry's predicates
//! to the external program executor. Construction runs the full two-phase
//! initialization; the resulting shell is immutable and serves any number of
//! predicate calls for this instance. A [placeholder](NmnLanguage::placeholder)
//! shell carries no tensors at all and exists only for grammar
//! introspection.

use candle_core::Tensor;
use passage_nmn_core::{LanguageError, LanguageResult, Value, ValueKind};

use crate::config::LanguageConfig;
use crate::params::ExecutorParams;
use crate::registry;
use crate::state::{initialize, InstanceInputs, InstanceState};

/// Start types of the grammar: the value kinds a complete program must
/// produce.
pub const START_TYPES: [ValueKind; 2] =
    [ValueKind::PassageSpanAnswer, ValueKind::QuestionSpanAnswer];

/// Per-instance language shell.
pub struct NmnLanguage {
    state: Option<InstanceState>,
    params: Option<Box<dyn ExecutorParams>>,
}

impl NmnLanguage {
    /// Build the shell for one instance: validates the inputs and runs the
    /// precomputation.
    pub fn new(
        inputs: &InstanceInputs,
        config: &LanguageConfig,
        params: Box<dyn ExecutorParams>,
    ) -> LanguageResult<Self> {
        let state = initialize(inputs, config, params.as_ref())?;
        Ok(Self {
            state: Some(state),
            params: Some(params),
        })
    }

    /// Shell with no instance state, usable only to introspect the grammar
    /// (start types, production rules). Any predicate execution fails with
    /// [`LanguageError::PlaceholderInstance`]; no tensor computation is ever
    /// attempted.
    pub fn placeholder() -> Self {
        Self {
            state: None,
            params: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.state.is_none()
    }

    /// The instance state, or [`LanguageError::PlaceholderInstance`].
    pub fn state(&self) -> LanguageResult<&InstanceState> {
        self.state.as_ref().ok_or(LanguageError::PlaceholderInstance)
    }

    /// The learned parameters, or [`LanguageError::PlaceholderInstance`].
    pub fn params(&self) -> LanguageResult<&dyn ExecutorParams> {
        self.params
            .as_deref()
            .ok_or(LanguageError::PlaceholderInstance)
    }

    pub fn start_types(&self) -> &'static [ValueKind] {
        &START_TYPES
    }

    pub fn is_start_type(&self, kind: ValueKind) -> bool {
        START_TYPES.contains(&kind)
    }

    /// Production rules of the grammar, one per registered predicate.
    /// Available on placeholder shells.
    pub fn production_rules(&self) -> Vec<String> {
        registry::registry()
            .iter()
            .map(registry::PredicateDef::production_rule)
            .collect()
    }

    /// Execute one predicate by operator name.
    ///
    /// `arguments` are the values produced by earlier program steps, in
    /// order; `side_input` carries executor-supplied raw attention weights
    /// for the predicates that require them.
    pub fn execute(
        &self,
        predicate: &str,
        arguments: Vec<Value>,
        side_input: Option<&Tensor>,
    ) -> LanguageResult<Value> {
        let def = registry::lookup(predicate)
            .ok_or_else(|| LanguageError::UnknownPredicate(predicate.to_string()))?;
        if arguments.len() != def.arguments.len() {
            return Err(LanguageError::ArityMismatch {
                predicate: def.name,
                expected: def.arguments.len(),
                actual: arguments.len(),
            });
        }
        (def.run)(self, arguments, side_input)
    }
}
