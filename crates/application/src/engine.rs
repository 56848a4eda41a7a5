//! Read-time rule evaluation over an immutable form snapshot.

mod condition_evaluator;
mod effect_resolver;
mod error;
mod form_assembler;
mod reference_resolver;
mod tree_builder;
mod value_store;

pub use condition_evaluator::{ConditionEvaluator, EvaluationTrace, compare};
pub use effect_resolver::{EffectResolver, EffectSet, FieldState};
pub use error::FormEngineError;
pub use form_assembler::{ColumnBinding, FormAssembler, FormView, LayoutView, ViewValue};
pub use reference_resolver::{
    EvaluationScope, ReferenceResolver, UnresolvedPolicy, value_to_text,
};
pub use tree_builder::{Forest, TreeRecord};
pub use value_store::{EffectiveValue, ValueStore};
