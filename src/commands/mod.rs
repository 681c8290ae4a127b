//! Command implementations
//!
//! Each command returns whether every resource it touched succeeded; the
//! caller turns a failure into exit status 1.

pub mod apply;
pub mod profile;
pub mod volume;

use anyhow::Result;
use declarative::Outcome;

use crate::Context;
use crate::ui;

/// Print the outcome of a single-resource command
fn report(ctx: &Context, id: &str, outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        return ui::outcome_json(id, outcome);
    }
    if ctx.quiet && !matches!(outcome, Outcome::Failed(_)) {
        return Ok(());
    }
    ui::outcome(id, outcome);
    Ok(())
}
