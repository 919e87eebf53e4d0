//! The `truthy` rule: check whether the value at a path is truthy.

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::{PolicyError, Result};
use crate::value::is_truthy;

use super::Rule;

/// Checks whether the value at a dot-separated path is truthy per
/// [`is_truthy`]. A resolver miss falls into the missing-data policy of
/// the context's strict mode.
#[derive(Debug)]
pub struct TruthyRule {
    path: String,
}

impl TruthyRule {
    /// Build a truthy rule from its specification. Fails with a syntax
    /// error if `path` is missing or empty.
    pub fn from_spec(spec: &Value) -> Result<Self> {
        match spec.get("path") {
            Some(Value::String(s)) if !s.is_empty() => Ok(Self { path: s.clone() }),
            _ => Err(PolicyError::Syntax(
                "truthy rule requires non-empty 'path'".to_string(),
            )),
        }
    }
}

impl Rule for TruthyRule {
    fn type_name(&self) -> &str {
        "truthy"
    }

    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        ctx.bump("rule_eval", 1);
        match ctx.resolve(&self.path) {
            Some(value) => Ok(is_truthy(&value)),
            None => ctx.handle_missing(&self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StrictMode;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_from_spec_requires_path() {
        assert!(matches!(
            TruthyRule::from_spec(&json!({"type": "truthy"})),
            Err(PolicyError::Syntax(_))
        ));
        assert!(matches!(
            TruthyRule::from_spec(&json!({"type": "truthy", "path": ""})),
            Err(PolicyError::Syntax(_))
        ));
    }

    #[test]
    fn test_truthy_delegates_to_classifier() {
        let r = TruthyRule::from_spec(&json!({"type": "truthy", "path": "flag"})).unwrap();

        let input = json!({"flag": "yes"});
        let mut ctx = EvaluationContext::new(&input, Utc::now(), StrictMode::Warn);
        assert!(r.evaluate(&mut ctx).unwrap());

        let input = json!({"flag": "off"});
        let mut ctx = EvaluationContext::new(&input, Utc::now(), StrictMode::Warn);
        assert!(!r.evaluate(&mut ctx).unwrap());
    }

    #[test]
    fn test_truthy_missing_follows_strict_mode() {
        let r = TruthyRule::from_spec(&json!({"type": "truthy", "path": "flag"})).unwrap();
        let input = json!({});

        let mut ctx = EvaluationContext::new(&input, Utc::now(), StrictMode::Warn);
        assert!(!r.evaluate(&mut ctx).unwrap());
        assert_eq!(ctx.metrics().get("missing"), Some(&1));

        let mut ctx = EvaluationContext::new(&input, Utc::now(), StrictMode::Raise);
        assert!(matches!(
            r.evaluate(&mut ctx),
            Err(PolicyError::Evaluation(_))
        ));
    }
}
