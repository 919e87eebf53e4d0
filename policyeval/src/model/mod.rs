//! Policy data model.
//!
//! This module defines the policy specification and compiled forms, and the
//! decision produced by evaluating one.

mod decision;
mod policy;

pub use decision::{Decision, Explanation};
pub use policy::{Effect, Policy, PolicySpec};
