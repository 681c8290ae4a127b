//! Desired-state builder.
//!
//! The target state of a resource is composed from, in priority order:
//! a declaration file, the live state, and explicit per-field overrides.
//! The declaration (else the live state, else an empty skeleton) forms the
//! base; overrides are layered on top. Config overrides merge key by key,
//! device overrides replace whole devices.

use crate::error::{Error, Result};
use crate::types::{DevicePatch, ProfileState, VolumeState};
use declarative::ConfigPatch;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Explicit per-field parameters for a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileOverrides {
    pub description: Option<String>,
    pub config: Option<ConfigPatch>,
    pub devices: Option<DevicePatch>,
}

/// Explicit per-field parameters for a volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeOverrides {
    pub description: Option<String>,
    pub config: Option<ConfigPatch>,
}

/// Compute the desired state of a profile.
pub fn build_profile(
    declaration: Option<ProfileState>,
    current: Option<&ProfileState>,
    overrides: &ProfileOverrides,
) -> ProfileState {
    let mut desired = declaration
        .or_else(|| current.cloned())
        .unwrap_or_default();

    if let Some(description) = &overrides.description {
        desired.description.clone_from(description);
    }
    if let Some(patch) = &overrides.config {
        desired.config = patch.apply(&desired.config);
    }
    if let Some(patch) = &overrides.devices {
        desired.devices = patch.apply(&desired.devices);
    }
    desired
}

/// Compute the desired state of a custom volume.
pub fn build_volume(
    declaration: Option<VolumeState>,
    current: Option<&VolumeState>,
    overrides: &VolumeOverrides,
) -> VolumeState {
    let mut desired = declaration
        .or_else(|| current.cloned())
        .unwrap_or_default();

    if let Some(description) = &overrides.description {
        desired.description.clone_from(description);
    }
    if let Some(patch) = &overrides.config {
        desired.config = patch.apply(&desired.config);
    }
    desired
}

/// Load a declaration file (YAML or JSON).
///
/// An empty file yields the default (empty) state.
pub fn load_declaration<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Declaration {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if content.trim().is_empty() {
        log::debug!("Declaration {} is empty", path.display());
        return Ok(T::default());
    }

    serde_yaml::from_str(&content).map_err(|e| Error::Declaration {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceMap, DeviceSpec};
    use declarative::ConfigMap;
    use std::io::Write;

    fn map(pairs: &[(&str, &str)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn nic(network: &str) -> DeviceSpec {
        map(&[("type", "nic"), ("network", network)])
    }

    fn live_profile() -> ProfileState {
        ProfileState {
            description: "live".to_string(),
            config: map(&[("a", "1"), ("b", "2")]),
            devices: DeviceMap::from([("eth0".to_string(), nic("x"))]),
        }
    }

    #[test]
    fn test_config_merge_with_null_removal() {
        let overrides = ProfileOverrides {
            config: Some(ConfigPatch::new().unset("b").set("c", "3")),
            ..Default::default()
        };
        let desired = build_profile(None, Some(&live_profile()), &overrides);
        assert_eq!(desired.config, map(&[("a", "1"), ("c", "3")]));
        assert_eq!(desired.description, "live");
    }

    #[test]
    fn test_device_override_replaces_not_merges() {
        let mut live = live_profile();
        live.devices
            .get_mut("eth0")
            .unwrap()
            .insert("mtu".to_string(), "9000".to_string());

        let overrides = ProfileOverrides {
            devices: Some(DevicePatch::new().put("eth0", nic("y"))),
            ..Default::default()
        };
        let desired = build_profile(None, Some(&live), &overrides);
        assert_eq!(desired.devices["eth0"], nic("y"));
    }

    #[test]
    fn test_declaration_wins_over_live_state() {
        let declared = ProfileState {
            description: "declared".to_string(),
            config: map(&[("z", "9")]),
            ..Default::default()
        };
        let overrides = ProfileOverrides {
            description: Some("override".to_string()),
            ..Default::default()
        };
        let desired = build_profile(Some(declared), Some(&live_profile()), &overrides);
        assert_eq!(desired.description, "override");
        assert_eq!(desired.config, map(&[("z", "9")]));
        assert!(desired.devices.is_empty());
    }

    #[test]
    fn test_skeleton_when_nothing_known() {
        let desired = build_profile(None, None, &ProfileOverrides::default());
        assert_eq!(desired, ProfileState::default());
    }

    #[test]
    fn test_build_volume_merges_config() {
        let live = VolumeState {
            config: map(&[("size", "10GiB")]),
            ..Default::default()
        };
        let overrides = VolumeOverrides {
            description: None,
            config: Some(ConfigPatch::new().set("snapshots.expiry", "2w")),
        };
        let desired = build_volume(None, Some(&live), &overrides);
        assert_eq!(
            desired.config,
            map(&[("size", "10GiB"), ("snapshots.expiry", "2w")])
        );
    }

    #[test]
    fn test_load_declaration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "description: From file\nconfig:\n  limits.memory: 2GiB\n  limits.cpu: 4\ndevices:\n  root:\n    path: /\n    pool: default\n    type: disk"
        )
        .unwrap();

        let state: ProfileState = load_declaration(file.path()).unwrap();
        assert_eq!(state.description, "From file");
        assert_eq!(state.config["limits.cpu"], "4");
        assert_eq!(state.devices["root"]["pool"], "default");
    }

    #[test]
    fn test_load_declaration_empty_and_missing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let state: VolumeState = load_declaration(file.path()).unwrap();
        assert_eq!(state, VolumeState::default());

        let err = load_declaration::<ProfileState>(Path::new("/nonexistent/web.yaml")).unwrap_err();
        assert!(matches!(err, Error::Declaration { .. }));
    }
}
