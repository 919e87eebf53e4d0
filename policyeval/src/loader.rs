//! Loading and validating policy specifications.
//!
//! The loader accepts a JSON document, an inline JSON string, or a file
//! path, validates the policy surface shape (`name`, `effect`, `rules`),
//! and constructs every rule specification once through a registry so that
//! syntax and unknown-rule errors surface at load time rather than on the
//! first evaluation.

use std::fs;

use serde_json::Value;
use tracing::debug;

use crate::error::{PolicyError, Result};
use crate::model::{Effect, PolicySpec};
use crate::registry::{default_registry, RuleRegistry};
use crate::value::type_label;

/// Load and validate a policy from an inline JSON string or a file path.
///
/// A source whose first non-whitespace character is `{` is parsed as inline
/// JSON; anything else is treated as a path to a JSON file. Rule
/// specifications are validated against the default registry.
pub fn load_policy(source: &str) -> Result<PolicySpec> {
    let registry = default_registry();
    let guard = registry.read();
    load_policy_with(source, &guard)
}

/// Like [`load_policy`], validating rules against an explicit registry.
pub fn load_policy_with(source: &str, registry: &RuleRegistry) -> Result<PolicySpec> {
    let data: Value = if source.trim_start().starts_with('{') {
        serde_json::from_str(source)
            .map_err(|e| PolicyError::Load(format!("invalid policy JSON: {e}")))?
    } else {
        let text = fs::read_to_string(source)
            .map_err(|e| PolicyError::Load(format!("cannot read policy file '{source}': {e}")))?;
        serde_json::from_str(&text)
            .map_err(|e| PolicyError::Load(format!("invalid policy JSON in '{source}': {e}")))?
    };
    load_policy_value(&data, registry)
}

/// Validate an already parsed JSON document into a [`PolicySpec`].
///
/// `name` must be a non-empty string; `effect` defaults to `allow` and must
/// otherwise be exactly `allow` or `deny`; `rules` defaults to an empty
/// sequence and must otherwise be an array. Every rule specification is
/// constructed once through the registry and the resulting instance
/// discarded, so construction-time errors surface here.
pub fn load_policy_value(data: &Value, registry: &RuleRegistry) -> Result<PolicySpec> {
    let Some(map) = data.as_object() else {
        return Err(PolicyError::Load(format!(
            "policy must be an object, got {}",
            type_label(data)
        )));
    };

    let name = match map.get("name") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => {
            return Err(PolicyError::Load(
                "policy requires non-empty 'name'".to_string(),
            ))
        }
    };

    let effect = match map.get("effect") {
        None | Some(Value::Null) => Effect::Allow,
        Some(Value::String(s)) => s.parse::<Effect>()?,
        Some(other) => {
            return Err(PolicyError::Load(format!(
                "policy 'effect' must be a string, got {}",
                type_label(other)
            )))
        }
    };

    let rules = match map.get("rules") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(PolicyError::Load(format!(
                "policy 'rules' must be an array, got {}",
                type_label(other)
            )))
        }
    };

    // Validate rule specs early by constructing each one once.
    for spec in &rules {
        let _ = registry.create(spec)?;
    }

    debug!(policy = %name, rules = rules.len(), "loaded policy");
    Ok(PolicySpec {
        name,
        effect,
        rules,
    })
}
