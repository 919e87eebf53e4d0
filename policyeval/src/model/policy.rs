//! Policy specification and compiled policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PolicyError, Result};
use crate::rules::Rule;

/// The effect a policy applies to its match result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// The decision is allowed exactly when every rule matched.
    #[default]
    Allow,

    /// The decision is allowed exactly when not every rule matched.
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(PolicyError::Load(format!(
                "policy 'effect' must be 'allow' or 'deny', got '{other}'"
            ))),
        }
    }
}

/// A loaded but not yet compiled policy specification.
///
/// Produced by the loader, consumed by
/// [`PolicyEngine::compile`](crate::engine::PolicyEngine::compile). The rule
/// specifications stay untyped until compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySpec {
    /// The policy name. Non-empty.
    pub name: String,

    /// The policy effect. Defaults to `allow`.
    #[serde(default)]
    pub effect: Effect,

    /// Ordered rule specifications, each an object with a `type` field.
    #[serde(default)]
    pub rules: Vec<Value>,
}

/// A compiled policy, ready for evaluation.
///
/// The rule tree is owned exclusively and holds no per-call state, so a
/// compiled policy is reusable across many evaluations, concurrently
/// included — each call allocates its own evaluation context.
#[derive(Debug)]
pub struct Policy {
    name: String,
    effect: Effect,
    rules: Vec<Box<dyn Rule>>,
}

impl Policy {
    /// Assemble a compiled policy. Used by the engine's `compile`.
    pub(crate) fn new(name: String, effect: Effect, rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            name,
            effect,
            rules,
        }
    }

    /// The policy name from the source spec.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The policy effect.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// The compiled rules, in source order.
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effect_parsing_and_display() {
        assert_eq!("allow".parse::<Effect>().unwrap(), Effect::Allow);
        assert_eq!("deny".parse::<Effect>().unwrap(), Effect::Deny);
        assert!(matches!(
            "permit".parse::<Effect>(),
            Err(PolicyError::Load(_))
        ));
        assert_eq!(Effect::Deny.to_string(), "deny");
    }

    #[test]
    fn test_policy_spec_deserialization_defaults() {
        let spec: PolicySpec = serde_json::from_value(json!({"name": "p"})).unwrap();
        assert_eq!(spec.effect, Effect::Allow);
        assert!(spec.rules.is_empty());
    }
}
