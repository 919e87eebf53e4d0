//! The rule type system.
//!
//! Rules are boolean predicates compiled from untyped JSON specifications
//! and evaluated against an [`EvaluationContext`]. The built-in kinds are
//! `compare`, `all`, `any`, `not` and `truthy`; external code can add more
//! through the [`RuleRegistry`](crate::registry::RuleRegistry).

use std::fmt;

use serde_json::{Map, Value};

use crate::context::EvaluationContext;
use crate::error::Result;

mod combinator;
mod compare;
mod truthy;

pub use combinator::{AllRule, AnyRule, NotRule};
pub use compare::{CompareOp, CompareRule};
pub use truthy::TruthyRule;

/// Capability every rule variant implements.
///
/// Implementations must be willing to report a `{type, result}` trace
/// record on demand through [`Rule::explain`] without their own `evaluate`
/// logic branching on an explain flag — the engine, not the rule, decides
/// whether traces are collected.
pub trait Rule: fmt::Debug + Send + Sync {
    /// The registered type name of this rule (e.g. `"compare"`).
    fn type_name(&self) -> &str;

    /// Evaluate this rule against the given context.
    ///
    /// Every evaluation bumps the context's `rule_eval` metric before the
    /// rule's own logic runs.
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool>;

    /// Produce a trace record for this rule's evaluation.
    ///
    /// The default implementation evaluates the rule and reports
    /// `{"type": .., "result": ..}`. Variants may add fields.
    fn explain(&self, ctx: &mut EvaluationContext<'_>) -> Result<Map<String, Value>> {
        let result = self.evaluate(ctx)?;
        let mut record = Map::new();
        record.insert("type".to_string(), Value::from(self.type_name()));
        record.insert("result".to_string(), Value::Bool(result));
        Ok(record)
    }
}
