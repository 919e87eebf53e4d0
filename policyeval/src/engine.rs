//! Policy compilation and evaluation.
//!
//! The engine orchestrates the two halves of the system: `compile` turns a
//! policy specification into an executable rule tree via the registry, and
//! `evaluate` walks that tree against an input payload, folding rule
//! results into a [`Decision`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::context::{EvaluationContext, StrictMode};
use crate::error::{PolicyError, Result};
use crate::model::{Decision, Effect, Explanation, Policy, PolicySpec};
use crate::registry::{default_registry, RuleRegistry};

/// Either a specification (compiled on the fly) or an already compiled
/// policy. Both forms of `evaluate` input convert into this.
#[derive(Debug, Clone, Copy)]
pub enum PolicyInput<'a> {
    /// A spec, compiled for this call only and discarded afterwards.
    Spec(&'a PolicySpec),

    /// A compiled policy, reused as-is.
    Compiled(&'a Policy),
}

impl<'a> From<&'a PolicySpec> for PolicyInput<'a> {
    fn from(spec: &'a PolicySpec) -> Self {
        Self::Spec(spec)
    }
}

impl<'a> From<&'a Policy> for PolicyInput<'a> {
    fn from(policy: &'a Policy) -> Self {
        Self::Compiled(policy)
    }
}

/// Per-call evaluation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Strict mode override; defaults to the engine's configured mode.
    pub strict: Option<StrictMode>,

    /// Evaluation timestamp; defaults to the current UTC time.
    pub now: Option<DateTime<Utc>>,

    /// When set, every top-level rule is evaluated and the decision
    /// carries a per-rule explanation.
    pub explain: bool,
}

impl EvalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the strict mode for this call.
    pub fn strict(mut self, strict: StrictMode) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Inject the evaluation timestamp.
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Request a per-rule explanation.
    pub fn explain(mut self) -> Self {
        self.explain = true;
        self
    }
}

/// Evaluates policies against input payloads.
///
/// An engine is bound to a registry (the process-wide default unless one is
/// supplied) and a default strict mode. Evaluation itself is a single
/// synchronous pass over the immutable rule tree; each call owns its own
/// [`EvaluationContext`], so one compiled policy can be evaluated from many
/// callers at once.
pub struct PolicyEngine {
    registry: Arc<RwLock<RuleRegistry>>,
    strict: StrictMode,
}

impl PolicyEngine {
    /// Create an engine bound to the default registry with strict mode
    /// `warn`.
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
            strict: StrictMode::Warn,
        }
    }

    /// Create an engine bound to an explicit registry.
    pub fn with_registry(registry: Arc<RwLock<RuleRegistry>>) -> Self {
        Self {
            registry,
            strict: StrictMode::Warn,
        }
    }

    /// Set the engine's default strict mode.
    pub fn with_strict(mut self, strict: StrictMode) -> Self {
        self.strict = strict;
        self
    }

    /// Compile a specification into an executable [`Policy`].
    ///
    /// Rule specifications are mapped through the registry in order; any
    /// syntax or unknown-rule error from a child propagates unchanged.
    pub fn compile(&self, spec: &PolicySpec) -> Result<Policy> {
        let registry = self.registry.read();
        let rules = spec
            .rules
            .iter()
            .map(|s| registry.create(s))
            .collect::<Result<Vec<_>>>()?;
        debug!(policy = %spec.name, rules = rules.len(), "compiled policy");
        Ok(Policy::new(spec.name.clone(), spec.effect, rules))
    }

    /// Evaluate a policy (or spec, compiled ad hoc) against an input
    /// payload.
    ///
    /// Without `explain`, the top-level rules run as an implicit `all` with
    /// a stop on the first false result. With `explain`, every top-level
    /// rule is evaluated so the explanation carries one trace entry per
    /// rule; combinators still short-circuit within their own children.
    pub fn evaluate<'a>(
        &self,
        policy: impl Into<PolicyInput<'a>>,
        input: &Value,
        opts: EvalOptions,
    ) -> Result<Decision> {
        let compiled_ad_hoc;
        let compiled = match policy.into() {
            PolicyInput::Spec(spec) => {
                compiled_ad_hoc = self.compile(spec)?;
                &compiled_ad_hoc
            }
            PolicyInput::Compiled(policy) => policy,
        };

        let now = opts.now.unwrap_or_else(Utc::now);
        let strict = opts.strict.unwrap_or(self.strict);
        let mut ctx = EvaluationContext::new(input, now, strict);

        let mut matched = true;
        let mut traces = Vec::new();
        if opts.explain {
            for rule in compiled.rules() {
                let record = rule.explain(&mut ctx)?;
                let result = record
                    .get("result")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                traces.push(record);
                if !result {
                    matched = false;
                }
            }
        } else {
            for rule in compiled.rules() {
                if !rule.evaluate(&mut ctx)? {
                    matched = false;
                    break;
                }
            }
        }

        let allowed = match compiled.effect() {
            Effect::Allow => matched,
            Effect::Deny => !matched,
        };
        debug!(policy = %compiled.name(), allowed, matched, "evaluated policy");

        let explanation = opts.explain.then(|| Explanation {
            matched,
            effect: compiled.effect(),
            metrics: ctx.metrics().clone(),
            rules: traces,
        });

        Ok(Decision {
            allowed,
            policy: compiled.name().to_string(),
            effect: compiled.effect(),
            matched,
            explanation,
        })
    }

    /// Shortcut for `evaluate` with explanation forced on, returning only
    /// the explanation.
    pub fn explain<'a>(
        &self,
        policy: impl Into<PolicyInput<'a>>,
        input: &Value,
        strict: Option<StrictMode>,
    ) -> Result<Explanation> {
        let opts = EvalOptions {
            strict,
            now: None,
            explain: true,
        };
        let decision = self.evaluate(policy, input, opts)?;
        decision
            .explanation
            .ok_or_else(|| PolicyError::Evaluation("explanation was not produced".to_string()))
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> PolicySpec {
        serde_json::from_value(value).unwrap()
    }

    fn isolated_engine() -> PolicyEngine {
        PolicyEngine::with_registry(Arc::new(RwLock::new(RuleRegistry::with_builtins())))
    }

    #[test]
    fn test_compile_preserves_rule_order() {
        let engine = isolated_engine();
        let policy = engine
            .compile(&spec(json!({"name": "p", "rules": [
                {"type": "truthy", "path": "a"},
                {"type": "compare", "path": "b", "op": "exists"},
                {"type": "all", "rules": []}
            ]})))
            .unwrap();
        let names: Vec<&str> = policy.rules().iter().map(|r| r.type_name()).collect();
        assert_eq!(names, ["truthy", "compare", "all"]);
    }

    #[test]
    fn test_compile_propagates_child_errors() {
        let engine = isolated_engine();
        let err = engine
            .compile(&spec(json!({"name": "p", "rules": [{"type": "nope"}]})))
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownRule(_)));

        let err = engine
            .compile(&spec(json!({"name": "p", "rules": [{"type": "truthy"}]})))
            .unwrap_err();
        assert!(matches!(err, PolicyError::Syntax(_)));
    }

    #[test]
    fn test_empty_rule_list_matches_vacuously() {
        let engine = isolated_engine();
        for strict in [StrictMode::Off, StrictMode::Warn, StrictMode::Raise] {
            let decision = engine
                .evaluate(
                    &spec(json!({"name": "open", "effect": "allow", "rules": []})),
                    &json!({}),
                    EvalOptions::new().strict(strict),
                )
                .unwrap();
            assert!(decision.allowed);
            assert!(decision.matched);
        }
    }

    #[test]
    fn test_injected_now_is_used() {
        let engine = isolated_engine();
        let now = "2026-08-30T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        // The timestamp is carried by the context; evaluation succeeding
        // with an injected clock is what we can observe from outside.
        let decision = engine
            .evaluate(
                &spec(json!({"name": "p", "rules": []})),
                &json!({}),
                EvalOptions::new().now(now),
            )
            .unwrap();
        assert!(decision.allowed);
    }

    #[test]
    fn test_explain_returns_explanation() {
        let engine = isolated_engine();
        let explanation = engine
            .explain(
                &spec(json!({"name": "p", "effect": "deny", "rules": [
                    {"type": "truthy", "path": "flag"}
                ]})),
                &json!({"flag": true}),
                None,
            )
            .unwrap();
        assert!(explanation.matched);
        assert_eq!(explanation.effect, Effect::Deny);
        assert_eq!(explanation.rules.len(), 1);
    }
}
