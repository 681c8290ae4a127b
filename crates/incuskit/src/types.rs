//! Core types for Incus reconciliation.

use declarative::ConfigMap;
use declarative::patch::string_map;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Remote label meaning "the default endpoint".
pub const LOCAL_REMOTE: &str = "local";

/// Project used when none is given.
pub const DEFAULT_PROJECT: &str = "default";

// =============================================================================
// Scope and identity
// =============================================================================

/// Remote endpoint and project a command targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Remote label; "local" is the implicit endpoint
    pub remote: String,
    /// Project namespace; empty means no `--project` flag
    pub project: String,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            remote: LOCAL_REMOTE.to_string(),
            project: DEFAULT_PROJECT.to_string(),
        }
    }
}

impl Scope {
    /// Create a scope, falling back to the defaults for missing values.
    pub fn new(remote: Option<&str>, project: Option<&str>) -> Self {
        Self {
            remote: remote.unwrap_or(LOCAL_REMOTE).to_string(),
            project: project.unwrap_or(DEFAULT_PROJECT).to_string(),
        }
    }

    /// Whether commands go to the implicit local endpoint.
    pub fn is_local(&self) -> bool {
        self.remote.is_empty() || self.remote == LOCAL_REMOTE
    }

    /// Prefix `name` with the remote, unless the remote is local.
    pub fn qualify(&self, name: &str) -> String {
        if self.is_local() {
            name.to_string()
        } else {
            format!("{}:{}", self.remote, name)
        }
    }

    /// Project to pass as `--project`, if any.
    pub fn project_flag(&self) -> Option<&str> {
        (!self.project.is_empty()).then_some(self.project.as_str())
    }
}

/// Kind of managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Configuration profile
    Profile,
    /// Custom storage volume
    Volume,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Profile => write!(f, "profile"),
            ResourceKind::Volume => write!(f, "volume"),
        }
    }
}

/// Composite identity of a managed resource.
///
/// Fields are private: an identity does not change once a run begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    kind: ResourceKind,
    name: String,
    pool: Option<String>,
    scope: Scope,
}

impl ResourceIdentity {
    /// Identity of a profile.
    pub fn profile(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            kind: ResourceKind::Profile,
            name: name.into(),
            pool: None,
            scope,
        }
    }

    /// Identity of a custom volume in `pool`.
    pub fn volume(pool: impl Into<String>, name: impl Into<String>, scope: Scope) -> Self {
        Self {
            kind: ResourceKind::Volume,
            name: name.into(),
            pool: Some(pool.into()),
            scope,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning pool; empty for profiles.
    pub fn pool(&self) -> &str {
        self.pool.as_deref().unwrap_or_default()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Remote-qualified name, e.g. `cloud:web`.
    pub fn qualified_name(&self) -> String {
        self.scope.qualify(&self.name)
    }

    /// Remote-qualified pool, e.g. `cloud:default`.
    pub fn qualified_pool(&self) -> String {
        self.scope.qualify(self.pool())
    }

    /// Same resource under another name (used by rename).
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pool {
            Some(pool) => write!(f, "{pool}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

// =============================================================================
// Volume content
// =============================================================================

/// Content type of a custom volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Mountable filesystem
    #[default]
    Filesystem,
    /// Raw block device
    Block,
    /// Read-only ISO image
    Iso,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Filesystem => "filesystem",
            ContentType::Block => "block",
            ContentType::Iso => "iso",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filesystem" => Ok(ContentType::Filesystem),
            "block" => Ok(ContentType::Block),
            "iso" => Ok(ContentType::Iso),
            other => Err(format!(
                "invalid content type '{other}' (expected filesystem, block or iso)"
            )),
        }
    }
}

/// Volume type requested at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    #[default]
    Filesystem,
    Block,
}

impl VolumeType {
    pub fn content_type(&self) -> ContentType {
        match self {
            VolumeType::Filesystem => ContentType::Filesystem,
            VolumeType::Block => ContentType::Block,
        }
    }
}

impl FromStr for VolumeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filesystem" => Ok(VolumeType::Filesystem),
            "block" => Ok(VolumeType::Block),
            other => Err(format!(
                "invalid volume type '{other}' (expected filesystem or block)"
            )),
        }
    }
}

// =============================================================================
// Devices
// =============================================================================

/// Attributes of one device (`type`, `network`, `path`, ...).
pub type DeviceSpec = BTreeMap<String, String>;

/// Devices keyed by device name.
pub type DeviceMap = BTreeMap<String, DeviceSpec>;

#[derive(Deserialize)]
struct LenientDevice(#[serde(deserialize_with = "string_map")] DeviceSpec);

/// Deserialize a device map, stringifying attribute values.
pub fn device_map<'de, D>(deserializer: D) -> Result<DeviceMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, LenientDevice>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, device)| (name, device.0))
        .collect())
}

/// Device overrides: a `Some` entry replaces the device wholesale, a `None`
/// entry removes it. Devices are never field-merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DevicePatch(BTreeMap<String, Option<DeviceSpec>>);

impl DevicePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or add) device `name`.
    pub fn put(mut self, name: impl Into<String>, device: DeviceSpec) -> Self {
        self.0.insert(name.into(), Some(device));
        self
    }

    /// Remove device `name` if present.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply the patch to `base`, producing a new mapping.
    pub fn apply(&self, base: &DeviceMap) -> DeviceMap {
        let mut merged = base.clone();
        for (name, device) in &self.0 {
            match device {
                Some(device) => {
                    merged.insert(name.clone(), device.clone());
                }
                None => {
                    merged.remove(name);
                }
            }
        }
        merged
    }
}

impl<'de> Deserialize<'de> for DevicePatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, Option<LenientDevice>> = BTreeMap::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(name, device)| (name, device.map(|d| d.0)))
                .collect(),
        ))
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Resource state
// =============================================================================

/// Representation of a profile, as shown and edited by `incus profile`.
///
/// Unknown fields of `profile show` output (`name`, `used_by`, `project`)
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileState {
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "string_map")]
    pub config: ConfigMap,
    #[serde(default, deserialize_with = "device_map")]
    pub devices: DeviceMap,
}

/// Representation of a custom storage volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeState {
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "string_map")]
    pub config: ConfigMap,
    #[serde(default)]
    pub content_type: ContentType,
    /// Cluster member holding the volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Raw result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; -1 when terminated by a signal
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_qualify() {
        let local = Scope::default();
        assert_eq!(local.qualify("web"), "web");
        assert_eq!(local.project_flag(), Some("default"));

        let remote = Scope::new(Some("cloud"), Some("prod"));
        assert_eq!(remote.qualify("web"), "cloud:web");
        assert_eq!(remote.project_flag(), Some("prod"));

        let unscoped = Scope::new(None, Some(""));
        assert_eq!(unscoped.project_flag(), None);
    }

    #[test]
    fn test_volume_identity() {
        let id = ResourceIdentity::volume("default", "data", Scope::new(Some("cloud"), None));
        assert_eq!(id.kind(), ResourceKind::Volume);
        assert_eq!(id.qualified_pool(), "cloud:default");
        assert_eq!(id.name(), "data");
        assert_eq!(id.to_string(), "default/data");

        let profile = ResourceIdentity::profile("web", Scope::default());
        assert_eq!(profile.pool(), "");
        assert_eq!(profile.to_string(), "web");
    }

    #[test]
    fn test_decode_profile_show_output() {
        let yaml = r#"
config:
  limits.cpu: "2"
  boot.autostart: true
description: Web servers
devices:
  eth0:
    name: eth0
    network: incusbr0
    type: nic
  root:
    path: /
    pool: default
    type: disk
name: web
used_by:
- /1.0/instances/web1
project: default
"#;
        let state: ProfileState = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(state.description, "Web servers");
        assert_eq!(state.config["limits.cpu"], "2");
        assert_eq!(state.config["boot.autostart"], "true");
        assert_eq!(state.devices["eth0"]["network"], "incusbr0");
        assert_eq!(state.devices.len(), 2);
    }

    #[test]
    fn test_decode_empty_profile() {
        let yaml = "config: {}\ndescription: \"\"\ndevices: {}\nname: empty\nused_by: []\n";
        let state: ProfileState = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(state, ProfileState::default());

        let state: ProfileState =
            serde_yaml::from_str("description: null\nconfig: null\n").unwrap();
        assert_eq!(state, ProfileState::default());
    }

    #[test]
    fn test_decode_volume_show_output() {
        let yaml = r#"
config:
  size: 10GiB
  snapshots.schedule: "@daily"
description: ""
name: data
type: custom
used_by: []
location: node1
content_type: block
project: default
"#;
        let state: VolumeState = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(state.config["size"], "10GiB");
        assert_eq!(state.content_type, ContentType::Block);
        assert_eq!(state.location.as_deref(), Some("node1"));
    }

    #[test]
    fn test_device_patch_replaces_whole_device() {
        let base: DeviceMap = [(
            "eth0".to_string(),
            [("type", "nic"), ("network", "x"), ("mtu", "1500")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )]
        .into_iter()
        .collect();

        let replacement: DeviceSpec = [("type", "nic"), ("network", "y")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let merged = DevicePatch::new().put("eth0", replacement.clone()).apply(&base);
        assert_eq!(merged["eth0"], replacement);

        let removed = DevicePatch::new().remove("eth0").apply(&base);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!("iso".parse::<ContentType>().unwrap(), ContentType::Iso);
        assert!("floppy".parse::<ContentType>().is_err());
        assert_eq!(VolumeType::Block.content_type(), ContentType::Block);
    }
}
