//! Registry mapping rule type names to constructor functions.
//!
//! The registry is the open extension point of the rule system: any caller
//! may register additional rule kinds before compiling a policy. A
//! process-wide default registry, pre-populated with the built-in rules, is
//! created lazily on first access and lives for the process lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{PolicyError, Result};
use crate::rules::{AllRule, AnyRule, CompareRule, NotRule, Rule, TruthyRule};
use crate::value::type_label;

/// Constructor function for a rule type.
///
/// Factories receive the full rule specification and the registry they were
/// looked up in, so composite rules can recursively compile children
/// through the same registry, preserving custom extensions through nesting.
pub type RuleFactory = Box<dyn Fn(&Value, &RuleRegistry) -> Result<Box<dyn Rule>> + Send + Sync>;

/// Registry mapping rule type names to factories.
///
/// The registry is ordinary shared mutable state: concurrent mutation of
/// one instance requires external synchronization (the default registry is
/// held behind a lock for exactly this reason).
pub struct RuleRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in rule types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtin_rules(&mut registry);
        registry
    }

    /// Register a factory under a type name. Re-registering an existing
    /// name silently overwrites the previous factory.
    pub fn register(&mut self, type_name: impl Into<String>, factory: RuleFactory) {
        self.factories.insert(type_name.into(), factory);
    }

    /// Remove a type name from the registry. A no-op if the name was never
    /// registered.
    pub fn unregister(&mut self, type_name: &str) {
        self.factories.remove(type_name);
    }

    /// Whether a type name is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Build a rule instance from an untyped specification.
    ///
    /// The spec must be an object with a non-empty string `type` field
    /// (syntax error otherwise); the type name is looked up by exact string
    /// match (unknown-rule error on absence).
    pub fn create(&self, spec: &Value) -> Result<Box<dyn Rule>> {
        let Some(map) = spec.as_object() else {
            return Err(PolicyError::Syntax(format!(
                "rule spec must be an object, got {}",
                type_label(spec)
            )));
        };
        let type_name = match map.get("type") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => {
                return Err(PolicyError::Syntax(
                    "rule spec requires non-empty 'type'".to_string(),
                ))
            }
        };
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| PolicyError::UnknownRule(type_name.clone()))?;
        factory(spec, self)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RuleRegistry").field("types", &names).finish()
    }
}

/// Register the five built-in rule factories (`compare`, `all`, `any`,
/// `not`, `truthy`) on a registry.
pub fn register_builtin_rules(registry: &mut RuleRegistry) {
    registry.register(
        "compare",
        Box::new(|spec, _| Ok(Box::new(CompareRule::from_spec(spec)?) as Box<dyn Rule>)),
    );
    registry.register(
        "all",
        Box::new(|spec, r| Ok(Box::new(AllRule::from_spec(spec, r)?) as Box<dyn Rule>)),
    );
    registry.register(
        "any",
        Box::new(|spec, r| Ok(Box::new(AnyRule::from_spec(spec, r)?) as Box<dyn Rule>)),
    );
    registry.register(
        "not",
        Box::new(|spec, r| Ok(Box::new(NotRule::from_spec(spec, r)?) as Box<dyn Rule>)),
    );
    registry.register(
        "truthy",
        Box::new(|spec, _| Ok(Box::new(TruthyRule::from_spec(spec)?) as Box<dyn Rule>)),
    );
}

lazy_static! {
    static ref DEFAULT_REGISTRY: Arc<RwLock<RuleRegistry>> =
        Arc::new(RwLock::new(RuleRegistry::with_builtins()));
}

/// The process-wide default registry, created with the built-in rules on
/// first access.
///
/// The instance is shared by every caller that does not supply its own
/// registry; mutations through the lock are visible process-wide. Callers
/// that need isolation (tests in particular) should construct their own
/// [`RuleRegistry`] instead of mutating the default.
pub fn default_registry() -> Arc<RwLock<RuleRegistry>> {
    Arc::clone(&DEFAULT_REGISTRY)
}
