//! The result of evaluating a policy.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::Effect;

/// Result of evaluating a policy against one input payload.
///
/// The invariant `allowed == (matched if effect == allow else !matched)`
/// always holds.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Final decision after applying the policy effect to the match result.
    pub allowed: bool,

    /// Name of the policy that was evaluated.
    pub policy: String,

    /// The effect that was applied.
    pub effect: Effect,

    /// Whether every top-level rule evaluated to true.
    pub matched: bool,

    /// Per-rule trace, present only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

/// Structured per-rule trace plus evaluation metrics.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// Whether every top-level rule evaluated to true.
    pub matched: bool,

    /// The policy effect.
    pub effect: Effect,

    /// Snapshot of the evaluation metrics.
    pub metrics: BTreeMap<String, u64>,

    /// One trace record per top-level rule, each at least `{type, result}`.
    pub rules: Vec<Map<String, Value>>,
}
