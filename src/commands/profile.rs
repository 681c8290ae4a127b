//! `incant profile`

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ApplyContext, Resource, reconcile_to_outcome};
use incuskit::Client;

use super::report;
use crate::Context;
use crate::cli::ProfileArgs;
use crate::config::Defaults;
use crate::resource::ProfileResource;
use crate::ui;

pub fn run(ctx: &Context, args: &ProfileArgs) -> Result<bool> {
    let client = Client::new()?;
    let resource = ProfileResource::new(args.spec(), &Defaults::default(), client);

    if args.diff && !args.output.json {
        let (current, desired) = resource
            .documents()
            .context("Failed to render profile documents")?;
        ui::print_diff(&current, &desired, &resource.id());
    }

    let apply_ctx = ApplyContext::new(args.output.check);
    let outcome = reconcile_to_outcome(&resource, &apply_ctx);
    report(ctx, &resource.id(), &outcome, args.output.json)?;
    Ok(outcome.is_success())
}
