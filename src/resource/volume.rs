//! Custom storage volume resource

use declarative::{ApplyContext, ConfigPatch, Failure, Outcome, Resource};
use incuskit::command::{self, CreateVolume};
use incuskit::desired::{build_volume, load_declaration};
use incuskit::diff::{ConfigDelta, diff_volume};
use incuskit::operation::resolve_volume;
use incuskit::{
    AttachSpec, Client, ContentType, Error, OperationRequest, ResourceIdentity, Result,
    TransferKind, TransferSpec, VolumeMode, VolumeOverrides, VolumeParams, VolumeState,
    VolumeType,
};
use serde::Deserialize;
use std::path::Path;

use super::{config_patch, expand, scope_for};
use crate::config::Defaults;

/// Desired state of one custom volume, as written in a manifest or on the CLI
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSpec {
    pub pool: String,
    /// Volume name; optional only for imports
    #[serde(default, alias = "volume")]
    pub name: Option<String>,
    #[serde(default)]
    pub state: VolumeMode,
    #[serde(default, rename = "type")]
    pub volume_type: VolumeType,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    /// Declaration file providing description and config
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Option<ConfigPatch>,
    #[serde(default)]
    pub unset: Vec<String>,
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default)]
    pub export_to: Option<String>,
    #[serde(default)]
    pub import_from: Option<String>,
    #[serde(default)]
    pub target_pool: Option<String>,
    #[serde(default)]
    pub target_volume: Option<String>,
    #[serde(default, rename = "move")]
    pub move_volume: bool,
    /// Cluster member: creation target, or copy/move source
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub destination_target: Option<String>,
    #[serde(default)]
    pub attach_to: Option<String>,
    #[serde(default)]
    pub attach_path: Option<String>,
    #[serde(default)]
    pub attach_device: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

impl VolumeSpec {
    /// Content type the volume has or will have.
    pub fn effective_content_type(&self) -> ContentType {
        self.content_type.unwrap_or_else(|| self.volume_type.content_type())
    }

    /// `--type` value for creation: the content type when given, block
    /// when requested, otherwise left to the server.
    fn create_type(&self) -> Option<ContentType> {
        match (self.content_type, self.volume_type) {
            (Some(content_type), _) => Some(content_type),
            (None, VolumeType::Block) => Some(ContentType::Block),
            (None, VolumeType::Filesystem) => None,
        }
    }

    pub fn params(&self) -> VolumeParams {
        VolumeParams {
            name: self.name.clone(),
            snapshot: self.snapshot.clone(),
            export_to: expand(self.export_to.as_deref()),
            import_from: expand(self.import_from.as_deref()),
            target_pool: self.target_pool.clone(),
            target_volume: self.target_volume.clone(),
            move_volume: self.move_volume,
            target: self.target.clone(),
            destination_target: self.destination_target.clone(),
            attach_to: self.attach_to.clone(),
            attach_path: self.attach_path.clone(),
            attach_device: self.attach_device.clone(),
            content_type: self.effective_content_type(),
        }
    }

    pub fn overrides(&self) -> VolumeOverrides {
        VolumeOverrides {
            description: self.description.clone(),
            config: config_patch(self.config.as_ref(), &self.unset),
        }
    }
}

/// A custom volume reconciled against the live Incus state
#[derive(Debug, Clone)]
pub struct VolumeResource {
    spec: VolumeSpec,
    identity: ResourceIdentity,
    client: Client,
}

impl VolumeResource {
    pub fn new(spec: VolumeSpec, defaults: &Defaults, client: Client) -> Self {
        let scope = scope_for(spec.remote.as_deref(), spec.project.as_deref(), defaults);
        let identity = ResourceIdentity::volume(
            spec.pool.clone(),
            spec.name.clone().unwrap_or_default(),
            scope,
        );
        Self {
            spec,
            identity,
            client,
        }
    }

    fn desired(&self, current: Option<&VolumeState>) -> Result<VolumeState> {
        let declaration = match expand(self.spec.source.as_deref()) {
            Some(path) => Some(load_declaration(Path::new(&path))?),
            None => None,
        };
        Ok(build_volume(declaration, current, &self.spec.overrides()))
    }

    fn checked(&self, args: &[String], what: &str) -> Result<()> {
        self.client.run_checked(self.identity.scope(), args, None, what)?;
        Ok(())
    }

    /// Reconcile, reporting errors as `incuskit::Error`.
    ///
    /// The primary operation and an optional attach step each report an
    /// outcome; their change messages are joined into one.
    pub fn run(&self, ctx: &ApplyContext) -> Result<Outcome> {
        let mut current = None;
        let requests = resolve_volume(self.spec.state, &self.spec.params(), || {
            current = self.client.fetch_volume(&self.identity)?;
            Ok(current.is_some())
        })?;

        let mut changes = Vec::new();
        let mut unchanged = None;
        for request in requests {
            log::info!("volume {}: {request:?}", self.identity);
            let outcome = self.perform(ctx, request, current.as_ref())?;
            if outcome.is_change() {
                changes.push(outcome.message().to_string());
            } else if unchanged.is_none() {
                unchanged = Some(outcome.message().to_string());
            }
        }

        Ok(match (changes.is_empty(), ctx.dry_run) {
            (true, _) => Outcome::no_change(
                unchanged.unwrap_or_else(|| "Storage volume matches configuration".to_string()),
            ),
            (false, true) => Outcome::would_change(changes.join(", ")),
            (false, false) => Outcome::changed(changes.join(", ")),
        })
    }

    fn perform(
        &self,
        ctx: &ApplyContext,
        request: OperationRequest,
        current: Option<&VolumeState>,
    ) -> Result<Outcome> {
        let id = &self.identity;
        match request {
            OperationRequest::Keep { message } => Ok(Outcome::no_change(message)),
            OperationRequest::Create { snapshot } => self.create(ctx, snapshot.as_deref()),
            OperationRequest::Update => match current {
                Some(current) => self.update(ctx, current),
                None => Err(Error::not_found(format!("Volume '{}'", id.name()))),
            },
            OperationRequest::Delete => {
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Storage volume would be deleted"));
                }
                self.checked(&command::volume_delete(id), "Failed to delete storage volume")?;
                Ok(Outcome::changed("Storage volume deleted"))
            }
            OperationRequest::SnapshotCreate { snapshot } => {
                if self.client.snapshot_exists(id, &snapshot)? {
                    return Ok(Outcome::no_change("Snapshot already exists"));
                }
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Snapshot would be created"));
                }
                self.checked(
                    &command::snapshot_create(id, &snapshot),
                    "Failed to create snapshot",
                )?;
                Ok(Outcome::changed("Snapshot created"))
            }
            OperationRequest::SnapshotDelete { snapshot } => {
                if !self.client.snapshot_exists(id, &snapshot)? {
                    return Ok(Outcome::no_change("Snapshot not found"));
                }
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Snapshot would be deleted"));
                }
                self.checked(
                    &command::snapshot_delete(id, &snapshot),
                    "Failed to delete snapshot",
                )?;
                Ok(Outcome::changed("Snapshot deleted"))
            }
            OperationRequest::SnapshotRestore { snapshot } => {
                if !self.client.snapshot_exists(id, &snapshot)? {
                    return Err(Error::not_found(format!("Snapshot '{snapshot}'")));
                }
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Snapshot would be restored"));
                }
                self.checked(
                    &command::snapshot_restore(id, &snapshot),
                    "Failed to restore snapshot",
                )?;
                Ok(Outcome::changed("Snapshot restored"))
            }
            OperationRequest::Export { path } => {
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Volume would be exported"));
                }
                self.checked(&command::volume_export(id, &path), "Failed to export volume")?;
                Ok(Outcome::changed("Volume exported"))
            }
            OperationRequest::Import { path, name } => {
                if ctx.dry_run {
                    return Ok(Outcome::would_change("Volume would be imported"));
                }
                let args = command::volume_import(
                    id.scope(),
                    id.pool(),
                    &path,
                    name.as_deref(),
                    self.spec.content_type,
                );
                self.checked(&args, "Failed to import volume")?;
                Ok(Outcome::changed("Volume imported"))
            }
            OperationRequest::Copy(spec) => self.transfer(ctx, TransferKind::Copy, &spec),
            OperationRequest::Move(spec) => self.transfer(ctx, TransferKind::Move, &spec),
            OperationRequest::Attach(mut spec) => {
                // An existing volume's own content type wins over the creation type
                if self.spec.content_type.is_none()
                    && let Some(current) = current
                {
                    spec.content_type = current.content_type;
                }
                self.attach(ctx, &spec)
            }
            OperationRequest::Rename { .. } => {
                Err(Error::validation("rename applies to profiles only"))
            }
        }
    }

    fn create(&self, ctx: &ApplyContext, snapshot: Option<&str>) -> Result<Outcome> {
        let id = &self.identity;
        let desired = self.desired(None)?;
        if ctx.dry_run {
            return Ok(Outcome::would_change(match snapshot {
                Some(_) => "Storage volume would be created, Snapshot would be created",
                None => "Storage volume would be created",
            }));
        }

        let params = CreateVolume {
            description: Some(desired.description.as_str()),
            content_type: self.spec.create_type(),
            target: self.spec.target.as_deref(),
            config: Some(&desired.config),
        };
        self.checked(
            &command::volume_create(id, &params),
            "Failed to create storage volume",
        )?;

        match snapshot {
            Some(snapshot) => {
                self.checked(
                    &command::snapshot_create(id, snapshot),
                    "Failed to create snapshot",
                )?;
                Ok(Outcome::changed("Storage volume created, Snapshot created"))
            }
            None => Ok(Outcome::changed("Storage volume created")),
        }
    }

    /// Apply description and per-key config changes.
    fn update(&self, ctx: &ApplyContext, current: &VolumeState) -> Result<Outcome> {
        let id = &self.identity;
        let desired = self.desired(Some(current))?;
        let changes = diff_volume(current, &desired);
        if changes.is_empty() {
            return Ok(Outcome::no_change("Storage volume matches configuration"));
        }

        let mut messages = Vec::new();
        if let Some(description) = changes.description() {
            if !ctx.dry_run {
                self.checked(
                    &command::volume_set_description(id, description),
                    "Failed to set volume description",
                )?;
            }
            messages.push(if ctx.dry_run {
                "Would update description".to_string()
            } else {
                "Updated description".to_string()
            });
        }
        for delta in changes.config_delta() {
            match delta {
                ConfigDelta::Set { key, value } => {
                    if !ctx.dry_run {
                        self.checked(
                            &command::volume_set(id, key, value),
                            &format!("Failed to set volume config '{key}'"),
                        )?;
                    }
                    messages.push(if ctx.dry_run {
                        format!("Would update config '{key}'")
                    } else {
                        format!("Updated config '{key}'")
                    });
                }
                ConfigDelta::Unset { key } => {
                    if !ctx.dry_run {
                        self.checked(
                            &command::volume_unset(id, key),
                            &format!("Failed to unset volume config '{key}'"),
                        )?;
                    }
                    messages.push(if ctx.dry_run {
                        format!("Would remove config '{key}'")
                    } else {
                        format!("Removed config '{key}'")
                    });
                }
            }
        }

        let message = messages.join(", ");
        Ok(if ctx.dry_run {
            Outcome::would_change(message)
        } else {
            Outcome::changed(message)
        })
    }

    fn transfer(
        &self,
        ctx: &ApplyContext,
        kind: TransferKind,
        spec: &TransferSpec,
    ) -> Result<Outcome> {
        if ctx.dry_run {
            return Ok(Outcome::would_change(format!("Volume would be {}", kind.past())));
        }
        self.checked(
            &command::volume_transfer(kind, &self.identity, spec),
            &format!("Failed to {} volume", kind.verb()),
        )?;
        Ok(Outcome::changed(format!("Volume {}", kind.past())))
    }

    /// Attach unless the instance already has a device of that name.
    ///
    /// Only the device name is compared, not its pool or source.
    fn attach(&self, ctx: &ApplyContext, spec: &AttachSpec) -> Result<Outcome> {
        let scope = self.identity.scope();
        let devices = self.client.instance_devices(scope, &spec.instance)?;
        if devices.is_some_and(|d| d.contains_key(&spec.device)) {
            return Ok(Outcome::no_change(format!(
                "Already attached to instance '{}'",
                spec.instance
            )));
        }
        if ctx.dry_run {
            return Ok(Outcome::would_change(format!(
                "Would attach to instance '{}'",
                spec.instance
            )));
        }
        self.checked(
            &command::volume_attach(&self.identity, spec),
            "Failed to attach volume",
        )?;
        Ok(Outcome::changed(format!(
            "Attached to instance '{}'",
            spec.instance
        )))
    }
}

impl Resource for VolumeResource {
    fn id(&self) -> String {
        self.identity.to_string()
    }

    fn description(&self) -> String {
        format!(
            "volume {}/{} ({})",
            self.identity.qualified_pool(),
            self.identity.name(),
            self.spec.state
        )
    }

    fn resource_type(&self) -> &'static str {
        "volume"
    }

    fn reconcile(&self, ctx: &ApplyContext) -> std::result::Result<Outcome, Failure> {
        Ok(self.run(ctx)?)
    }
}
