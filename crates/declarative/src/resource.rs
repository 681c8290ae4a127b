//! Resource trait for declarative state management
//!
//! A Resource is one "ensure state X" request against an external system.
//! Reconciling it reads live state, computes the desired state, diffs the two
//! and performs at most the mutations needed to converge.

use crate::context::ApplyContext;
use crate::types::{Failure, Outcome};
use std::fmt;

/// Core trait for declarative resources
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, Failure, Outcome, Resource};
///
/// #[derive(Debug)]
/// struct Marker { path: String }
///
/// impl Resource for Marker {
///     fn id(&self) -> String { self.path.clone() }
///     fn description(&self) -> String { format!("Ensure {} exists", self.path) }
///     fn resource_type(&self) -> &'static str { "marker" }
///
///     fn reconcile(&self, ctx: &ApplyContext) -> Result<Outcome, Failure> {
///         if std::path::Path::new(&self.path).exists() {
///             return Ok(Outcome::no_change("Marker present"));
///         }
///         if ctx.dry_run {
///             return Ok(Outcome::would_change("Marker would be created"));
///         }
///         std::fs::write(&self.path, "").map_err(|e| Failure::new(e.to_string()))?;
///         Ok(Outcome::changed("Marker created"))
///     }
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// Stable within its type. Examples:
    /// - "web" for a profile
    /// - "default/data" for a storage volume
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping and filtering
    fn resource_type(&self) -> &'static str;

    /// Converge the resource towards its desired state
    ///
    /// Implementations must:
    /// 1. Return `NoChange` when nothing differs
    /// 2. Return `WouldChange` under `ctx.dry_run` without any mutating call
    /// 3. Otherwise mutate and return `Changed`
    ///
    /// A returned `Err` terminates this resource only; the executor turns it
    /// into `Outcome::Failed`.
    fn reconcile(&self, ctx: &ApplyContext) -> Result<Outcome, Failure>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Reconcile a resource, folding errors into `Outcome::Failed`
pub fn reconcile_to_outcome(resource: &dyn Resource, ctx: &ApplyContext) -> Outcome {
    match resource.reconcile(ctx) {
        Ok(outcome) => outcome,
        Err(failure) => Outcome::Failed(failure),
    }
}
