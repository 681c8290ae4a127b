//! Argument builders for the `incus` command grammar.
//!
//! Builders are pure: they turn an identity plus parameters into the
//! argument list handed to a [`Backend`](crate::backend::Backend). The
//! `--project` flag is not part of the list; the client adds it from the
//! identity's scope.

use crate::types::{ContentType, ResourceIdentity, Scope};
use declarative::ConfigMap;

fn args<const N: usize>(fixed: [&str; N]) -> Vec<String> {
    fixed.iter().map(ToString::to_string).collect()
}

// =============================================================================
// Profiles
// =============================================================================

/// `profile show <remote:name>`
pub fn profile_show(id: &ResourceIdentity) -> Vec<String> {
    let mut cmd = args(["profile", "show"]);
    cmd.push(id.qualified_name());
    cmd
}

/// `profile create <remote:name>`
pub fn profile_create(id: &ResourceIdentity) -> Vec<String> {
    let mut cmd = args(["profile", "create"]);
    cmd.push(id.qualified_name());
    cmd
}

/// `profile edit <remote:name>`; the document is fed on stdin.
pub fn profile_edit(id: &ResourceIdentity) -> Vec<String> {
    let mut cmd = args(["profile", "edit"]);
    cmd.push(id.qualified_name());
    cmd
}

/// `profile delete <remote:name>`
pub fn profile_delete(id: &ResourceIdentity) -> Vec<String> {
    let mut cmd = args(["profile", "delete"]);
    cmd.push(id.qualified_name());
    cmd
}

/// `profile rename <remote:old> <new>`
pub fn profile_rename(from: &ResourceIdentity, to: &str) -> Vec<String> {
    let mut cmd = args(["profile", "rename"]);
    cmd.push(from.qualified_name());
    cmd.push(to.to_string());
    cmd
}

// =============================================================================
// Volumes
// =============================================================================

fn volume_cmd<const N: usize>(verb: [&str; N], id: &ResourceIdentity) -> Vec<String> {
    let mut cmd = args(["storage", "volume"]);
    cmd.extend(verb.iter().map(ToString::to_string));
    cmd.push(id.qualified_pool());
    cmd.push(id.name().to_string());
    cmd
}

/// `storage volume show <remote:pool> <name[/snapshot]>`
pub fn volume_show(id: &ResourceIdentity, snapshot: Option<&str>) -> Vec<String> {
    let mut cmd = args(["storage", "volume", "show"]);
    cmd.push(id.qualified_pool());
    match snapshot {
        Some(snapshot) => cmd.push(format!("{}/{snapshot}", id.name())),
        None => cmd.push(id.name().to_string()),
    }
    cmd
}

/// Parameters of `storage volume create`.
#[derive(Debug, Clone, Default)]
pub struct CreateVolume<'a> {
    pub description: Option<&'a str>,
    /// Value for `--type=`, already resolved from type/content type
    pub content_type: Option<ContentType>,
    /// Cluster member to create the volume on
    pub target: Option<&'a str>,
    pub config: Option<&'a ConfigMap>,
}

/// `storage volume create <pool> <name> [--description=..] [--type=..] [--target=..] [k=v ...]`
pub fn volume_create(id: &ResourceIdentity, params: &CreateVolume<'_>) -> Vec<String> {
    let mut cmd = volume_cmd(["create"], id);
    if let Some(description) = params.description.filter(|d| !d.is_empty()) {
        cmd.push(format!("--description={description}"));
    }
    if let Some(content_type) = params.content_type {
        cmd.push(format!("--type={content_type}"));
    }
    if let Some(target) = params.target {
        cmd.push(format!("--target={target}"));
    }
    if let Some(config) = params.config {
        cmd.extend(config.iter().map(|(k, v)| format!("{k}={v}")));
    }
    cmd
}

/// `storage volume set <pool> <name> key=value`
pub fn volume_set(id: &ResourceIdentity, key: &str, value: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["set"], id);
    cmd.push(format!("{key}={value}"));
    cmd
}

/// `storage volume unset <pool> <name> key`
pub fn volume_unset(id: &ResourceIdentity, key: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["unset"], id);
    cmd.push(key.to_string());
    cmd
}

/// `storage volume set <pool> <name> --property description=<text>`
pub fn volume_set_description(id: &ResourceIdentity, description: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["set"], id);
    cmd.push("--property".to_string());
    cmd.push(format!("description={description}"));
    cmd
}

/// `storage volume delete <pool> <name>`
pub fn volume_delete(id: &ResourceIdentity) -> Vec<String> {
    volume_cmd(["delete"], id)
}

/// `storage volume snapshot create <pool> <name> <snapshot>`
pub fn snapshot_create(id: &ResourceIdentity, snapshot: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["snapshot", "create"], id);
    cmd.push(snapshot.to_string());
    cmd
}

/// `storage volume snapshot delete <pool> <name> <snapshot>`
pub fn snapshot_delete(id: &ResourceIdentity, snapshot: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["snapshot", "delete"], id);
    cmd.push(snapshot.to_string());
    cmd
}

/// `storage volume snapshot restore <pool> <name> <snapshot>`
pub fn snapshot_restore(id: &ResourceIdentity, snapshot: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["snapshot", "restore"], id);
    cmd.push(snapshot.to_string());
    cmd
}

/// `storage volume export <pool> <name> <file>`
pub fn volume_export(id: &ResourceIdentity, file: &str) -> Vec<String> {
    let mut cmd = volume_cmd(["export"], id);
    cmd.push(file.to_string());
    cmd
}

/// `storage volume import <remote:pool> <file> [<name>] [--type=..]`
pub fn volume_import(
    scope: &Scope,
    pool: &str,
    file: &str,
    name: Option<&str>,
    content_type: Option<ContentType>,
) -> Vec<String> {
    let mut cmd = args(["storage", "volume", "import"]);
    cmd.push(scope.qualify(pool));
    cmd.push(file.to_string());
    if let Some(name) = name {
        cmd.push(name.to_string());
    }
    if let Some(content_type) = content_type {
        cmd.push(format!("--type={content_type}"));
    }
    cmd
}

/// Whether a transfer copies or moves the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Copy,
    Move,
}

impl TransferKind {
    pub fn verb(&self) -> &'static str {
        match self {
            TransferKind::Copy => "copy",
            TransferKind::Move => "move",
        }
    }

    /// Past tense, for outcome messages.
    pub fn past(&self) -> &'static str {
        match self {
            TransferKind::Copy => "copied",
            TransferKind::Move => "moved",
        }
    }
}

/// Destination and cluster placement of a copy or move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub target_pool: String,
    pub target_volume: String,
    /// Source cluster member (`--target`)
    pub target: Option<String>,
    /// Destination cluster member (`--destination-target`)
    pub destination_target: Option<String>,
}

/// `storage volume copy|move <remote:pool/name> <remote:pool/name> [--target=..] [--destination-target=..]`
pub fn volume_transfer(
    kind: TransferKind,
    source: &ResourceIdentity,
    spec: &TransferSpec,
) -> Vec<String> {
    let scope = source.scope();
    let mut cmd = args(["storage", "volume", kind.verb()]);
    cmd.push(scope.qualify(&format!("{}/{}", source.pool(), source.name())));
    cmd.push(scope.qualify(&format!("{}/{}", spec.target_pool, spec.target_volume)));
    if let Some(target) = &spec.target {
        cmd.push(format!("--target={target}"));
    }
    if let Some(destination) = &spec.destination_target {
        cmd.push(format!("--destination-target={destination}"));
    }
    cmd
}

/// Instance attachment of a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachSpec {
    pub instance: String,
    /// Device name on the instance; the volume name when unset
    pub device: String,
    pub path: Option<String>,
    /// Effective content type of the volume
    pub content_type: ContentType,
}

impl AttachSpec {
    /// Mount path, when one applies to this content type.
    pub fn mount_path(&self) -> Option<&str> {
        match self.content_type {
            ContentType::Filesystem => self.path.as_deref().filter(|p| !p.is_empty()),
            ContentType::Block | ContentType::Iso => None,
        }
    }
}

/// `storage volume attach <pool> <name> <instance> [<device>] [<path>]`
///
/// The device is omitted when it equals the volume name and no path is
/// sent, since the path is positional after the device.
pub fn volume_attach(id: &ResourceIdentity, spec: &AttachSpec) -> Vec<String> {
    let mut cmd = volume_cmd(["attach"], id);
    // The instance lives on the pool's remote; no prefix of its own
    cmd.push(spec.instance.clone());

    let path = spec.mount_path();
    if spec.device != id.name() || path.is_some() {
        cmd.push(spec.device.clone());
    }
    if let Some(path) = path {
        cmd.push(path.to_string());
    }
    cmd
}

/// `config show <remote:instance>`
pub fn instance_config_show(scope: &Scope, instance: &str) -> Vec<String> {
    let mut cmd = args(["config", "show"]);
    cmd.push(scope.qualify(instance));
    cmd
}
