//! The `compare` rule: resolve a path and compare against a target value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::context::EvaluationContext;
use crate::error::{PolicyError, Result};
use crate::value::{json_eq, type_label};

use super::Rule;

/// Comparison operator for a [`CompareRule`].
///
/// Unknown operator strings are rejected when the rule is constructed,
/// never at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    Exists,
}

impl CompareOp {
    /// The wire name of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Exists => "exists",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "in" => Ok(Self::In),
            "contains" => Ok(Self::Contains),
            "exists" => Ok(Self::Exists),
            other => Err(PolicyError::Syntax(format!(
                "unknown compare op '{other}'"
            ))),
        }
    }
}

/// Compares the value at a dot-separated path to a target value.
///
/// On a resolver miss, `exists` answers `false` with no side effect; every
/// other operator falls into the missing-data policy of the context's
/// strict mode.
#[derive(Debug)]
pub struct CompareRule {
    path: String,
    op: CompareOp,
    value: Option<Value>,
}

impl CompareRule {
    /// Build a compare rule from its specification.
    ///
    /// Fails with a syntax error if `path` or `op` is missing or empty, if
    /// `op` is not a known operator, or if the operator requires a `value`
    /// and none (or an explicit `null`) is given.
    pub fn from_spec(spec: &Value) -> Result<Self> {
        let path = match spec.get("path") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(PolicyError::Syntax(
                    "compare rule requires non-empty 'path'".to_string(),
                ))
            }
        };
        let op = match spec.get("op") {
            Some(Value::String(s)) if !s.is_empty() => s.parse::<CompareOp>()?,
            _ => {
                return Err(PolicyError::Syntax(
                    "compare rule requires non-empty 'op'".to_string(),
                ))
            }
        };
        let value = spec.get("value").filter(|v| !v.is_null()).cloned();
        if value.is_none() && op != CompareOp::Exists {
            return Err(PolicyError::Syntax(format!(
                "compare op '{op}' requires a 'value'"
            )));
        }
        Ok(Self { path, op, value })
    }

    fn expected(&self) -> Result<&Value> {
        self.value.as_ref().ok_or_else(|| {
            PolicyError::Evaluation(format!("compare op '{}' has no target value", self.op))
        })
    }
}

impl Rule for CompareRule {
    fn type_name(&self) -> &str {
        "compare"
    }

    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        ctx.bump("rule_eval", 1);

        let Some(actual) = ctx.resolve(&self.path) else {
            if self.op == CompareOp::Exists {
                return Ok(false);
            }
            return ctx.handle_missing(&self.path);
        };

        match self.op {
            CompareOp::Exists => Ok(true),
            CompareOp::Eq => Ok(json_eq(&actual, self.expected()?)),
            CompareOp::Ne => Ok(!json_eq(&actual, self.expected()?)),
            CompareOp::Gt => Ok(json_cmp(&actual, self.expected()?)? == Ordering::Greater),
            CompareOp::Gte => Ok(json_cmp(&actual, self.expected()?)? != Ordering::Less),
            CompareOp::Lt => Ok(json_cmp(&actual, self.expected()?)? == Ordering::Less),
            CompareOp::Lte => Ok(json_cmp(&actual, self.expected()?)? != Ordering::Greater),
            CompareOp::In => member_of(&actual, self.expected()?, CompareOp::In),
            CompareOp::Contains => member_of(self.expected()?, &actual, CompareOp::Contains),
        }
    }

    fn explain(&self, ctx: &mut EvaluationContext<'_>) -> Result<Map<String, Value>> {
        let actual = ctx.resolve(&self.path);
        let result = self.evaluate(ctx)?;
        let mut record = Map::new();
        record.insert("type".to_string(), Value::from("compare"));
        record.insert("path".to_string(), Value::from(self.path.clone()));
        record.insert("op".to_string(), Value::from(self.op.as_str()));
        record.insert(
            "value".to_string(),
            self.value.clone().unwrap_or(Value::Null),
        );
        record.insert("actual".to_string(), actual.unwrap_or(Value::Null));
        record.insert("result".to_string(), Value::Bool(result));
        Ok(record)
    }
}

/// Order two JSON values: numbers against numbers, strings against strings.
/// Anything else is not order-comparable and fails the evaluation.
fn json_cmp(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| {
                    PolicyError::Evaluation("numbers are not order-comparable".to_string())
                }),
                _ => Err(PolicyError::Evaluation(
                    "numbers are not order-comparable".to_string(),
                )),
            }
        }
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(PolicyError::Evaluation(format!(
            "cannot order {} against {}",
            type_label(a),
            type_label(b)
        ))),
    }
}

/// Membership test: is `needle` a member of `haystack`?
///
/// Arrays test element membership, strings test substring containment,
/// objects test key membership. Anything else is an evaluation error.
fn member_of(needle: &Value, haystack: &Value, op: CompareOp) -> Result<bool> {
    match haystack {
        Value::Array(items) => Ok(items.iter().any(|v| json_eq(v, needle))),
        Value::String(s) => match needle {
            Value::String(sub) => Ok(s.contains(sub.as_str())),
            _ => Err(PolicyError::Evaluation(format!(
                "'{op}' against a string requires a string, got {}",
                type_label(needle)
            ))),
        },
        Value::Object(map) => match needle {
            Value::String(key) => Ok(map.contains_key(key)),
            _ => Err(PolicyError::Evaluation(format!(
                "'{op}' against an object requires a string key, got {}",
                type_label(needle)
            ))),
        },
        _ => Err(PolicyError::Evaluation(format!(
            "'{op}' requires a collection, got {}",
            type_label(haystack)
        ))),
    }
}
