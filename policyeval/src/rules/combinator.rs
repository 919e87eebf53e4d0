//! Boolean combinator rules: `all`, `any` and `not`.

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::{PolicyError, Result};
use crate::registry::RuleRegistry;
use crate::value::type_label;

use super::Rule;

/// Compile the `rules` field of a combinator spec through the registry.
/// An absent or `null` field compiles to an empty child list.
fn compile_children(
    spec: &Value,
    kind: &str,
    registry: &RuleRegistry,
) -> Result<Vec<Box<dyn Rule>>> {
    match spec.get("rules") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(|s| registry.create(s)).collect(),
        Some(other) => Err(PolicyError::Syntax(format!(
            "'{kind}' rule requires an array 'rules', got {}",
            type_label(other)
        ))),
    }
}

/// Logical AND: matches only if every child matches.
///
/// Children are evaluated in order with a short-circuit on the first
/// `false`; short-circuited children contribute neither metrics nor errors.
/// An empty child list evaluates to `true`.
#[derive(Debug)]
pub struct AllRule {
    rules: Vec<Box<dyn Rule>>,
}

impl AllRule {
    pub fn from_spec(spec: &Value, registry: &RuleRegistry) -> Result<Self> {
        Ok(Self {
            rules: compile_children(spec, "all", registry)?,
        })
    }
}

impl Rule for AllRule {
    fn type_name(&self) -> &str {
        "all"
    }

    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        ctx.bump("rule_eval", 1);
        for rule in &self.rules {
            if !rule.evaluate(ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Logical OR: matches if any child matches.
///
/// Children are evaluated in order with a short-circuit on the first
/// `true`. An empty child list evaluates to `false`.
#[derive(Debug)]
pub struct AnyRule {
    rules: Vec<Box<dyn Rule>>,
}

impl AnyRule {
    pub fn from_spec(spec: &Value, registry: &RuleRegistry) -> Result<Self> {
        Ok(Self {
            rules: compile_children(spec, "any", registry)?,
        })
    }
}

impl Rule for AnyRule {
    fn type_name(&self) -> &str {
        "any"
    }

    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        ctx.bump("rule_eval", 1);
        for rule in &self.rules {
            if rule.evaluate(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Logical NOT: inverts the result of a single child rule.
#[derive(Debug)]
pub struct NotRule {
    rule: Box<dyn Rule>,
}

impl NotRule {
    pub fn from_spec(spec: &Value, registry: &RuleRegistry) -> Result<Self> {
        let inner = match spec.get("rule") {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                return Err(PolicyError::Syntax(format!(
                    "'not' rule requires an object 'rule', got {}",
                    type_label(other)
                )))
            }
            None => {
                return Err(PolicyError::Syntax(
                    "'not' rule requires an object 'rule'".to_string(),
                ))
            }
        };
        Ok(Self {
            rule: registry.create(inner)?,
        })
    }
}

impl Rule for NotRule {
    fn type_name(&self) -> &str {
        "not"
    }

    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        ctx.bump("rule_eval", 1);
        Ok(!self.rule.evaluate(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StrictMode;
    use chrono::Utc;
    use serde_json::json;

    fn registry() -> RuleRegistry {
        RuleRegistry::with_builtins()
    }

    fn eval(rule: &dyn Rule, input: &Value, strict: StrictMode) -> Result<bool> {
        let mut ctx = EvaluationContext::new(input, Utc::now(), strict);
        rule.evaluate(&mut ctx)
    }

    #[test]
    fn test_empty_all_is_true_every_strict_mode() {
        let r = AllRule::from_spec(&json!({"type": "all", "rules": []}), &registry()).unwrap();
        let input = json!({});
        for strict in [StrictMode::Off, StrictMode::Warn, StrictMode::Raise] {
            assert!(eval(&r, &input, strict).unwrap());
        }
    }

    #[test]
    fn test_empty_any_is_false_every_strict_mode() {
        let r = AnyRule::from_spec(&json!({"type": "any", "rules": []}), &registry()).unwrap();
        let input = json!({});
        for strict in [StrictMode::Off, StrictMode::Warn, StrictMode::Raise] {
            assert!(!eval(&r, &input, strict).unwrap());
        }
    }

    #[test]
    fn test_missing_rules_field_compiles_to_empty() {
        let r = AllRule::from_spec(&json!({"type": "all"}), &registry()).unwrap();
        assert!(eval(&r, &json!({}), StrictMode::Warn).unwrap());
    }

    #[test]
    fn test_non_array_rules_field_is_syntax_error() {
        let err = AllRule::from_spec(&json!({"type": "all", "rules": "x"}), &registry())
            .unwrap_err();
        assert!(matches!(err, PolicyError::Syntax(_)));
    }

    #[test]
    fn test_all_short_circuits_before_raising_child() {
        // The second child would fail with an evaluation error (ordering a
        // string against a number), but the first child is false and
        // short-circuits past it.
        let spec = json!({"type": "all", "rules": [
            {"type": "compare", "path": "a", "op": "eq", "value": "nope"},
            {"type": "compare", "path": "s", "op": "gt", "value": 3}
        ]});
        let r = AllRule::from_spec(&spec, &registry()).unwrap();
        let input = json!({"a": "yes", "s": "banana"});
        assert!(!eval(&r, &input, StrictMode::Off).unwrap());
    }

    #[test]
    fn test_any_short_circuits_on_first_true() {
        let spec = json!({"type": "any", "rules": [
            {"type": "compare", "path": "a", "op": "eq", "value": "yes"},
            {"type": "compare", "path": "s", "op": "gt", "value": 3}
        ]});
        let r = AnyRule::from_spec(&spec, &registry()).unwrap();
        let input = json!({"a": "yes", "s": "banana"});
        assert!(eval(&r, &input, StrictMode::Off).unwrap());
    }

    #[test]
    fn test_not_inverts_child() {
        let spec = json!({"type": "not", "rule":
            {"type": "compare", "path": "user.role", "op": "eq", "value": "admin"}});
        let r = NotRule::from_spec(&spec, &registry()).unwrap();
        assert!(!eval(&r, &json!({"user": {"role": "admin"}}), StrictMode::Warn).unwrap());
        assert!(eval(&r, &json!({"user": {"role": "guest"}}), StrictMode::Warn).unwrap());
    }

    #[test]
    fn test_not_requires_object_rule() {
        let err =
            NotRule::from_spec(&json!({"type": "not", "rule": "x"}), &registry()).unwrap_err();
        assert!(matches!(err, PolicyError::Syntax(_)));

        let err = NotRule::from_spec(&json!({"type": "not"}), &registry()).unwrap_err();
        assert!(matches!(err, PolicyError::Syntax(_)));
    }

    #[test]
    fn test_nested_combinators() {
        let spec = json!({"type": "any", "rules": [
            {"type": "all", "rules": [
                {"type": "compare", "path": "user.role", "op": "eq", "value": "admin"},
                {"type": "truthy", "path": "user.active"}
            ]},
            {"type": "compare", "path": "user.override", "op": "exists"}
        ]});
        let r = AnyRule::from_spec(&spec, &registry()).unwrap();

        let input = json!({"user": {"role": "admin", "active": true}});
        assert!(eval(&r, &input, StrictMode::Off).unwrap());

        let input = json!({"user": {"role": "guest", "override": 1}});
        assert!(eval(&r, &input, StrictMode::Off).unwrap());

        let input = json!({"user": {"role": "guest"}});
        assert!(!eval(&r, &input, StrictMode::Off).unwrap());
    }
}
