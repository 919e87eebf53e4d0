//! Per-evaluation mutable state.
//!
//! An `EvaluationContext` is created fresh for every `evaluate` call and
//! discarded at the end of it. It carries the input payload, a
//! normalized-key variable store, a memoization cache for path lookups, the
//! evaluation metrics, the evaluation timestamp, and the strict mode.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::{PolicyError, Result};
use crate::value::{deep_get, normalize_key};

/// How rules behave when a required input path cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictMode {
    /// Missing values evaluate to `false` silently.
    Off,

    /// Missing values evaluate to `false` and increment the `missing`
    /// metric.
    #[default]
    Warn,

    /// Missing values fail the whole evaluation.
    Raise,
}

impl fmt::Display for StrictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Warn => write!(f, "warn"),
            Self::Raise => write!(f, "raise"),
        }
    }
}

impl FromStr for StrictMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "raise" => Ok(Self::Raise),
            other => Err(PolicyError::Load(format!(
                "strict mode must be 'off', 'warn' or 'raise', got '{other}'"
            ))),
        }
    }
}

/// Context passed to rules during evaluation.
///
/// The context is never shared between concurrent evaluations; each call
/// owns its own instance.
#[derive(Debug)]
pub struct EvaluationContext<'a> {
    /// The input payload being evaluated.
    pub input: &'a Value,

    /// The evaluation timestamp.
    pub now: DateTime<Utc>,

    /// Strict mode for handling missing data.
    pub strict: StrictMode,

    /// Intermediate values, keyed by normalized name.
    vars: HashMap<String, Value>,

    /// Memoized path lookups, keyed by the raw path string.
    cache: HashMap<String, Option<Value>>,

    /// Evaluation metrics, keyed by normalized metric name.
    metrics: BTreeMap<String, u64>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a fresh context for one evaluation call.
    pub fn new(input: &'a Value, now: DateTime<Utc>, strict: StrictMode) -> Self {
        Self {
            input,
            now,
            strict,
            vars: HashMap::new(),
            cache: HashMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Retrieve a variable from the context. The key is normalized before
    /// lookup, so `"User-Role"` and `"user_role"` address the same slot.
    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.vars.get(&normalize_key(key))
    }

    /// Set a variable in the context. The key is normalized before storage.
    pub fn set_var(&mut self, key: &str, value: Value) {
        self.vars.insert(normalize_key(key), value);
    }

    /// Increment a metric counter, creating it at zero if absent. The
    /// metric name is normalized.
    pub fn bump(&mut self, metric: &str, amount: u64) {
        *self.metrics.entry(normalize_key(metric)).or_insert(0) += amount;
    }

    /// The metrics collected so far.
    pub fn metrics(&self) -> &BTreeMap<String, u64> {
        &self.metrics
    }

    /// Resolve a dot-separated path against the input payload, memoizing
    /// the result for the rest of this evaluation.
    ///
    /// The cache is keyed by the raw path string, not a normalized form,
    /// since paths are structural. A present JSON `null` is reported as a
    /// miss, indistinguishable from an absent path.
    pub fn resolve(&mut self, path: &str) -> Option<Value> {
        if let Some(hit) = self.cache.get(path) {
            trace!(path, "path cache hit");
            return hit.clone();
        }
        let resolved = deep_get(self.input, path)
            .filter(|v| !v.is_null())
            .cloned();
        self.cache.insert(path.to_string(), resolved.clone());
        resolved
    }

    /// Apply the missing-data policy for a path that could not be resolved.
    ///
    /// Returns `Ok(false)` under `off` and `warn` (bumping the `missing`
    /// metric under `warn`), or an evaluation error under `raise`.
    pub fn handle_missing(&mut self, path: &str) -> Result<bool> {
        match self.strict {
            StrictMode::Off => Ok(false),
            StrictMode::Warn => {
                warn!(path, "missing value at path");
                self.bump("missing", 1);
                Ok(false)
            }
            StrictMode::Raise => Err(PolicyError::Evaluation(format!(
                "missing value at path '{path}'"
            ))),
        }
    }
}
