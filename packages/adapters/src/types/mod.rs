//! Core data types: adapter specs, acceptance criteria, evaluation reports.

pub mod criteria;
pub mod report;
pub mod spec;

pub use criteria::{default_criteria, resolve_criteria, Criteria};
pub use report::EvaluationReport;
pub use spec::{
    validate, AdapterSpec, FieldRule, FieldRuleSpec, FieldRuleView, MatchRule, Template,
    ValueSource,
};
