//! Execution engine - reconciles a plan of resources sequentially
//!
//! Every plan is first previewed in dry-run mode and the preview reported.
//! When the preview shows pending changes and they are confirmed, the whole
//! plan is reconciled again for real, in order. Entries that converged
//! already report `NoChange`, and an entry whose preview failed because it
//! depends on an earlier change gets to run after that change is made.

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::resource::reconcile_to_outcome;
use crate::types::{ExecuteOptions, ExecuteSummary};
use anyhow::Result;

/// Execute a plan with the given options and callbacks
///
/// # Returns
/// Summary of execution results. Under `opts.dry_run`, or when the user
/// declines, the summary counts `would_change` instead of `changed`.
pub fn execute<P, C>(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    progress.on_batch_start(plan.len(), true);
    let preview = reconcile_all(plan, &ApplyContext::check(), progress);

    // The preview is the final report for dry runs
    if opts.dry_run || preview.would_change == 0 {
        return Ok(preview);
    }

    let prompt = format!("Apply {} change(s)?", preview.would_change);
    if !confirm.confirm(&prompt)? {
        log::info!("User declined; {} change(s) not applied", preview.would_change);
        return Ok(preview);
    }

    progress.on_batch_start(plan.len(), false);
    Ok(reconcile_all(plan, &ApplyContext::live(), progress))
}

/// Reconcile every resource in plan order, reporting each outcome
fn reconcile_all<P: ProgressCallback>(
    plan: &ExecutionPlan,
    ctx: &ApplyContext,
    progress: &mut P,
) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    for resource in &plan.resources {
        progress.on_resource_start(&resource.id(), &resource.description());
        let outcome = reconcile_to_outcome(resource.as_ref(), ctx);
        let phase = if ctx.dry_run { "preview" } else { "apply" };
        log::debug!("{phase} {}: {:?}", resource.id(), outcome);
        progress.on_resource_complete(&resource.id(), &outcome);
        summary.add_outcome(&outcome);
    }
    progress.on_batch_complete();
    summary
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(plan: &ExecutionPlan, opts: &ExecuteOptions) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, opts, &mut NoProgress, &mut AutoConfirm)
}
