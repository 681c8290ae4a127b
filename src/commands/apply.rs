//! `incant apply` and `incant diff`

use anyhow::Result;
use colored::Colorize;
use declarative::{
    AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteSummary, ExecutionPlan, Outcome,
    ProgressCallback, execute,
};
use incuskit::Client;

use crate::Context;
use crate::cli::{ApplyArgs, DiffArgs};
use crate::config::Manifest;
use crate::paths;
use crate::ui;

/// Prints each outcome as it completes
struct TerminalProgress {
    quiet: bool,
}

impl ProgressCallback for TerminalProgress {
    fn on_batch_start(&mut self, count: usize, dry_run: bool) {
        if self.quiet {
            return;
        }
        let title = if dry_run {
            format!("Preview ({count} resources)")
        } else {
            format!("Applying ({count} resources)")
        };
        ui::header(&title);
    }

    fn on_resource_start(&mut self, id: &str, description: &str) {
        log::debug!("{id}: {description}");
    }

    fn on_resource_complete(&mut self, id: &str, outcome: &Outcome) {
        if self.quiet && outcome.is_success() {
            return;
        }
        ui::outcome(id, outcome);
    }

    fn on_batch_complete(&mut self) {}
}

/// Asks on the terminal before applying
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        println!();
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;
        if !confirmed {
            println!("  {} Aborted", "✗".red());
        }
        Ok(confirmed)
    }
}

fn load_plan(file: Option<&str>, target: Option<&str>) -> Result<ExecutionPlan> {
    let path = paths::manifest_path(file)?;
    let manifest = Manifest::load(&path)?;
    let client = Client::new()?;
    Ok(manifest.build_plan(&client).filter_by_target(target))
}

fn run_plan(
    ctx: &Context,
    plan: &ExecutionPlan,
    dry_run: bool,
    yes: bool,
) -> Result<ExecuteSummary> {
    let opts = ExecuteOptions { dry_run };
    let mut progress = TerminalProgress { quiet: ctx.quiet };
    if yes {
        execute(plan, &opts, &mut progress, &mut AutoConfirm)
    } else {
        execute(plan, &opts, &mut progress, &mut PromptConfirm)
    }
}

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<bool> {
    let plan = load_plan(args.file.as_deref(), args.target.as_deref())?;
    if plan.is_empty() {
        ui::warn("No resources to reconcile");
        return Ok(true);
    }

    let summary = run_plan(ctx, &plan, args.check, args.yes)?;
    if !ctx.quiet {
        ui::summary(&summary, args.check);
    }
    Ok(summary.is_success())
}

pub fn diff(ctx: &Context, args: &DiffArgs) -> Result<bool> {
    let plan = load_plan(args.file.as_deref(), args.target.as_deref())?;
    if plan.is_empty() {
        ui::warn("No resources to preview");
        return Ok(true);
    }

    let summary = run_plan(ctx, &plan, true, true)?;
    if !ctx.quiet {
        if summary.would_change == 0 && summary.is_success() {
            ui::info("Everything matches the manifest");
        } else {
            ui::summary(&summary, true);
        }
    }
    Ok(summary.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ProfileSpec, VolumeSpec};
    use incuskit::backend::scripted::ScriptedBackend;
    use incuskit::{CommandOutput, VolumeMode};
    use std::sync::Arc;

    fn manifest() -> Manifest {
        Manifest {
            profile: vec![ProfileSpec {
                name: "web".to_string(),
                ..Default::default()
            }],
            volume: vec![VolumeSpec {
                pool: "default".to_string(),
                name: Some("data".to_string()),
                state: VolumeMode::Restored,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn quiet() -> Context {
        Context { quiet: true }
    }

    #[test]
    fn test_preview_makes_no_mutating_calls() {
        let backend = Arc::new(ScriptedBackend::new());
        let plan = manifest().build_plan(&Client::with_backend(backend.clone()));

        let summary = run_plan(&quiet(), &plan, true, true).unwrap();
        assert_eq!(summary.would_change, 1);
        // restored without a snapshot
        assert_eq!(summary.failed, 1);
        assert!(backend.mutating_calls().is_empty());
    }

    #[test]
    fn test_apply_with_yes_converges() {
        let backend = Arc::new(ScriptedBackend::new());
        backend
            .respond(
                &["profile", "show", "web"],
                CommandOutput::failed(1, "Error: Profile not found\n"),
            )
            .respond(
                &["profile", "show", "web"],
                CommandOutput::failed(1, "Error: Profile not found\n"),
            )
            .respond(
                &["profile", "show", "web"],
                CommandOutput::ok("config: {}\ndescription: \"\"\ndevices: {}\n"),
            );
        let plan = manifest()
            .build_plan(&Client::with_backend(backend.clone()))
            .filter_by_target(Some("profile"));

        let summary = run_plan(&quiet(), &plan, false, true).unwrap();
        assert_eq!(summary.changed, 1);
        assert!(summary.is_success());
        let lines: Vec<_> = backend.mutating_calls().iter().map(|c| c.line()).collect();
        assert_eq!(lines, ["profile create web", "profile edit web"]);

        let summary = run_plan(&quiet(), &plan, false, true).unwrap();
        assert_eq!(summary.no_change, 1);
        assert_eq!(backend.mutating_calls().len(), 2);
    }

    #[test]
    fn test_apply_copies_volume_created_earlier_in_the_batch() {
        let backend = Arc::new(ScriptedBackend::new());
        let missing = || CommandOutput::failed(1, "Error: Storage volume not found\n");
        backend
            .respond(&["storage", "volume", "show", "default", "data"], missing())
            .respond(&["storage", "volume", "show", "default", "data"], missing())
            .respond(&["storage", "volume", "show", "default", "data"], missing())
            .respond(
                &["storage", "volume", "show", "default", "data"],
                CommandOutput::ok("config: {}\ndescription: \"\"\n"),
            );
        let manifest = Manifest {
            volume: vec![
                VolumeSpec {
                    pool: "default".to_string(),
                    name: Some("data".to_string()),
                    ..Default::default()
                },
                VolumeSpec {
                    pool: "default".to_string(),
                    name: Some("data".to_string()),
                    state: VolumeMode::Copied,
                    target_pool: Some("fast".to_string()),
                    target_volume: Some("data2".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let plan = manifest.build_plan(&Client::with_backend(backend.clone()));

        let summary = run_plan(&quiet(), &plan, false, true).unwrap();
        assert_eq!(summary.changed, 2);
        assert!(summary.is_success());
        let lines: Vec<_> = backend.mutating_calls().iter().map(|c| c.line()).collect();
        assert_eq!(
            lines,
            [
                "storage volume create default data",
                "storage volume copy default/data fast/data2",
            ]
        );
    }
}
