//! # Declarative
//!
//! A framework for declarative resource reconciliation.
//!
//! This crate provides the vocabulary shared by every "ensure state X"
//! operation: what a resource is, how a run is reported, and how a batch of
//! resources is previewed and converged.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with live state that can be converged
//! - **Outcome**: The single terminal result of one reconciliation
//!   (no change / would change / changed / failed)
//! - **ConfigPatch**: Key/value overrides where a null value removes the key
//! - **ExecutionPlan**: An ordered, filterable list of resources
//! - **Executor**: Previews a plan in dry-run mode, confirms, then applies
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, ExecutionPlan, execute_simple};
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_resource(Box::new(my_resource));
//!
//! let summary = execute_simple(&plan, &ExecuteOptions::default())?;
//! println!("{} changed", summary.changed);
//! ```
//!
//! ## Callback Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod executor;
pub mod patch;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use executor::{execute, execute_simple};
pub use patch::{ConfigMap, ConfigPatch};
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource, reconcile_to_outcome};
pub use types::{ExecuteOptions, ExecuteSummary, Failure, Outcome};
