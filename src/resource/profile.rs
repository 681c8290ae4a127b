//! Profile resource

use declarative::{ApplyContext, ConfigPatch, Failure, Outcome, Resource};
use incuskit::desired::{build_profile, load_declaration};
use incuskit::diff::diff_profile;
use incuskit::operation::resolve_profile;
use incuskit::{
    Client, DevicePatch, OperationRequest, ProfileMode, ProfileOverrides, ProfileState,
    ResourceIdentity, Result, command,
};
use serde::Deserialize;
use std::path::Path;

use super::{config_patch, expand, scope_for};
use crate::config::Defaults;

/// Desired state of one profile, as written in a manifest or on the CLI
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSpec {
    pub name: String,
    #[serde(default)]
    pub state: ProfileMode,
    /// Declaration file providing the full baseline
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Option<ConfigPatch>,
    /// Config keys to remove
    #[serde(default)]
    pub unset: Vec<String>,
    #[serde(default)]
    pub devices: Option<DevicePatch>,
    /// Devices to remove
    #[serde(default)]
    pub remove_devices: Vec<String>,
    /// Rename this profile to `name` if it exists and `name` does not
    #[serde(default)]
    pub rename_from: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

impl ProfileSpec {
    /// Per-field overrides with removals folded in.
    pub fn overrides(&self) -> ProfileOverrides {
        let devices = if self.remove_devices.is_empty() {
            self.devices.clone()
        } else {
            Some(
                self.remove_devices
                    .iter()
                    .fold(self.devices.clone().unwrap_or_default(), |patch, name| {
                        patch.remove(name.as_str())
                    }),
            )
        };
        ProfileOverrides {
            description: self.description.clone(),
            config: config_patch(self.config.as_ref(), &self.unset),
            devices,
        }
    }
}

/// A profile reconciled against the live Incus state
#[derive(Debug, Clone)]
pub struct ProfileResource {
    spec: ProfileSpec,
    identity: ResourceIdentity,
    client: Client,
}

impl ProfileResource {
    pub fn new(spec: ProfileSpec, defaults: &Defaults, client: Client) -> Self {
        let scope = scope_for(spec.remote.as_deref(), spec.project.as_deref(), defaults);
        let identity = ResourceIdentity::profile(spec.name.clone(), scope);
        Self {
            spec,
            identity,
            client,
        }
    }

    fn desired(&self, current: Option<&ProfileState>) -> Result<ProfileState> {
        let declaration = match expand(self.spec.source.as_deref()) {
            Some(path) => Some(load_declaration(Path::new(&path))?),
            None => None,
        };
        Ok(build_profile(declaration, current, &self.spec.overrides()))
    }

    /// Current and desired profile documents, for a textual diff.
    ///
    /// An absent profile renders as an empty document, as does the desired
    /// side of a deletion.
    pub fn documents(&self) -> Result<(String, String)> {
        let current = self.client.fetch_profile(&self.identity)?;
        let render = |state: Option<&ProfileState>| -> Result<String> {
            match state {
                Some(state) => Ok(serde_yaml::to_string(state)?),
                None => Ok(String::new()),
            }
        };
        let desired = match self.spec.state {
            ProfileMode::Present => Some(self.desired(current.as_ref())?),
            ProfileMode::Absent => None,
        };
        Ok((render(current.as_ref())?, render(desired.as_ref())?))
    }

    /// Replace the whole profile document.
    fn edit(&self, id: &ResourceIdentity, desired: &ProfileState) -> Result<()> {
        let document = serde_yaml::to_string(desired)?;
        self.client.run_checked(
            id.scope(),
            &command::profile_edit(id),
            Some(document.as_str()),
            "Failed to update profile",
        )?;
        Ok(())
    }

    fn update(&self, ctx: &ApplyContext, current: &ProfileState) -> Result<Outcome> {
        let desired = self.desired(Some(current))?;
        let changes = diff_profile(current, &desired);
        if changes.is_empty() {
            return Ok(Outcome::no_change("Profile matches configuration"));
        }
        log::info!(
            "profile {}: {} differ",
            self.identity,
            changes.fields().join(", ")
        );
        if ctx.dry_run {
            return Ok(Outcome::would_change("Profile would be updated"));
        }
        self.edit(&self.identity, &desired)?;
        Ok(Outcome::changed("Profile updated"))
    }

    /// Reconcile, reporting errors as `incuskit::Error`.
    pub fn run(&self, ctx: &ApplyContext) -> Result<Outcome> {
        let id = &self.identity;
        let scope = id.scope();
        let current = self.client.fetch_profile(id)?;

        let request = resolve_profile(
            self.spec.state,
            current.is_some(),
            self.spec.rename_from.as_deref(),
            |from| Ok(self.client.fetch_profile(&id.renamed(from))?.is_some()),
        )?;
        log::info!("profile {id}: {request:?}");

        match request {
            OperationRequest::Keep { message } => Ok(Outcome::no_change(message)),
            OperationRequest::Update => match current {
                Some(current) => self.update(ctx, &current),
                None => Err(incuskit::Error::not_found(format!("Profile '{id}'"))),
            },
            OperationRequest::Create { .. } => {
                let desired = self.desired(None)?;
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Profile would be created"));
                }
                self.client.run_checked(
                    scope,
                    &command::profile_create(id),
                    None,
                    "Failed to create profile",
                )?;
                self.edit(id, &desired)?;
                Ok(Outcome::changed("Profile created"))
            }
            OperationRequest::Rename { from } => {
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Profile would be renamed"));
                }
                let source = id.renamed(from.as_str());
                let previous = self.client.fetch_profile(&source)?.unwrap_or_default();
                self.client.run_checked(
                    scope,
                    &command::profile_rename(&source, id.name()),
                    None,
                    "Failed to rename profile",
                )?;
                let outcome = self.update(ctx, &previous)?;
                if outcome.is_change() {
                    Ok(Outcome::changed(format!("Profile renamed, {}", outcome.message())))
                } else {
                    Ok(Outcome::changed("Profile renamed"))
                }
            }
            OperationRequest::Delete => {
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Profile would be deleted"));
                }
                self.client.run_checked(
                    scope,
                    &command::profile_delete(id),
                    None,
                    "Failed to delete profile",
                )?;
                Ok(Outcome::changed("Profile deleted"))
            }
            other => Err(incuskit::Error::validation(format!(
                "{other:?} does not apply to profiles"
            ))),
        }
    }
}

impl Resource for ProfileResource {
    fn id(&self) -> String {
        self.identity.to_string()
    }

    fn description(&self) -> String {
        format!(
            "profile {} ({})",
            self.identity.qualified_name(),
            self.spec.state
        )
    }

    fn resource_type(&self) -> &'static str {
        "profile"
    }

    fn reconcile(&self, ctx: &ApplyContext) -> std::result::Result<Outcome, Failure> {
        Ok(self.run(ctx)?)
    }
}
