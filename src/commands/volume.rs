//! `incant volume`

use anyhow::Result;
use declarative::{ApplyContext, Resource, reconcile_to_outcome};
use incuskit::Client;

use super::report;
use crate::Context;
use crate::cli::VolumeArgs;
use crate::config::Defaults;
use crate::resource::VolumeResource;

pub fn run(ctx: &Context, args: &VolumeArgs) -> Result<bool> {
    let client = Client::new()?;
    let resource = VolumeResource::new(args.spec(), &Defaults::default(), client);

    let apply_ctx = ApplyContext::new(args.output.check);
    let outcome = reconcile_to_outcome(&resource, &apply_ctx);
    report(ctx, &resource.id(), &outcome, args.output.json)?;
    Ok(outcome.is_success())
}
