//! # PolicyEval
//!
//! `policyeval` is a configuration-driven policy evaluation engine. It
//! loads declarative access-control policies from JSON — a name, an
//! `allow`/`deny` effect, and an ordered list of boolean rules — and
//! evaluates them against arbitrary structured input payloads, producing a
//! single admit/deny [`Decision`] with an optional per-rule explanation.
//!
//! Key concepts:
//!
//! 1. **Policy**: a named effect plus an ordered rule tree, compiled once
//!    and reusable across evaluations.
//!
//! 2. **Rule**: a boolean predicate over an evaluation context. Built-in
//!    kinds: `compare`, `all`, `any`, `not`, `truthy`.
//!
//! 3. **Registry**: a mapping from rule-type name to constructor, open to
//!    extension with custom rule kinds.
//!
//! 4. **Strict mode**: what happens when a required input path cannot be
//!    resolved (`off`, `warn`, or `raise`).
//!
//! # Quick start
//!
//! ```
//! use policyeval::{load_policy, EvalOptions, PolicyEngine};
//! use serde_json::json;
//!
//! let policy = load_policy(r#"{
//!     "name": "admin-only",
//!     "effect": "allow",
//!     "rules": [{"type": "compare", "path": "user.role", "op": "eq", "value": "admin"}]
//! }"#).unwrap();
//!
//! let engine = PolicyEngine::new();
//! let decision = engine
//!     .evaluate(&policy, &json!({"user": {"role": "admin"}}), EvalOptions::new())
//!     .unwrap();
//! assert!(decision.allowed);
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod registry;
pub mod rules;
pub mod value;

// Re-export key types for convenience
pub use context::{EvaluationContext, StrictMode};
pub use engine::{EvalOptions, PolicyEngine, PolicyInput};
pub use error::{PolicyError, Result};
pub use loader::{load_policy, load_policy_value, load_policy_with};
pub use model::{Decision, Effect, Explanation, Policy, PolicySpec};
pub use registry::{default_registry, register_builtin_rules, RuleFactory, RuleRegistry};
pub use rules::Rule;
