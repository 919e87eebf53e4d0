//! Error types for the policy evaluation system.
//!
//! All failures surface through a single root enum, `PolicyError`, so that
//! callers can handle the whole taxonomy uniformly while still matching on
//! the phase that produced the failure: loading, rule construction, or
//! evaluation.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Root error type for the policy evaluation system.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy could not be loaded or parsed: unreadable file, invalid
    /// JSON, or an invalid `name`/`effect`/`rules` shape.
    #[error("Policy load error: {0}")]
    Load(String),

    /// A rule specification is structurally invalid: not an object, no
    /// `type`, or missing required fields for its declared type. Raised at
    /// construction time, never during evaluation.
    #[error("Rule syntax error: {0}")]
    Syntax(String),

    /// A rule specification names a `type` absent from the registry.
    #[error("Unknown rule type: {0}")]
    UnknownRule(String),

    /// A rule failed while being evaluated: missing required data under
    /// strict `raise`, an ordering comparison between incomparable values,
    /// or `in`/`contains` against a non-collection.
    #[error("Rule evaluation error: {0}")]
    Evaluation(String),
}
