//! State differ: whole-field comparison of live and desired state.

use crate::types::{DeviceMap, ProfileState, VolumeState};
use declarative::ConfigMap;

/// One differing field, with its old and new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Description { old: String, new: String },
    Config { old: ConfigMap, new: ConfigMap },
    Devices { old: DeviceMap, new: DeviceMap },
}

impl FieldChange {
    /// Field name as shown to users.
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Description { .. } => "description",
            FieldChange::Config { .. } => "config",
            FieldChange::Devices { .. } => "devices",
        }
    }
}

/// Per-key config operation derived from a config change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigDelta<'a> {
    Set { key: &'a str, value: &'a str },
    Unset { key: &'a str },
}

/// Field-level differences between live and desired state.
///
/// An empty change set means no mutation is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(Vec<FieldChange>);

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.0.iter()
    }

    /// Names of the changed fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(FieldChange::field).collect()
    }

    /// New description, if it changed.
    pub fn description(&self) -> Option<&str> {
        self.0.iter().find_map(|c| match c {
            FieldChange::Description { new, .. } => Some(new.as_str()),
            _ => None,
        })
    }

    /// Keys to set or unset to turn the old config into the new one,
    /// in key order.
    pub fn config_delta(&self) -> Vec<ConfigDelta<'_>> {
        let Some((old, new)) = self.0.iter().find_map(|c| match c {
            FieldChange::Config { old, new } => Some((old, new)),
            _ => None,
        }) else {
            return Vec::new();
        };

        let mut delta: Vec<ConfigDelta<'_>> = new
            .iter()
            .filter(|(key, value)| old.get(*key) != Some(*value))
            .map(|(key, value)| ConfigDelta::Set { key, value })
            .collect();
        delta.extend(
            old.keys()
                .filter(|key| !new.contains_key(*key))
                .map(|key| ConfigDelta::Unset { key }),
        );
        delta.sort_by_key(|d| match d {
            ConfigDelta::Set { key, .. } | ConfigDelta::Unset { key } => *key,
        });
        delta
    }
}

/// Compare description, config and devices of two profiles.
pub fn diff_profile(current: &ProfileState, desired: &ProfileState) -> ChangeSet {
    let mut changes = Vec::new();
    if current.description != desired.description {
        changes.push(FieldChange::Description {
            old: current.description.clone(),
            new: desired.description.clone(),
        });
    }
    if current.config != desired.config {
        changes.push(FieldChange::Config {
            old: current.config.clone(),
            new: desired.config.clone(),
        });
    }
    if current.devices != desired.devices {
        changes.push(FieldChange::Devices {
            old: current.devices.clone(),
            new: desired.devices.clone(),
        });
    }
    ChangeSet(changes)
}

/// Compare description and config of two volumes.
pub fn diff_volume(current: &VolumeState, desired: &VolumeState) -> ChangeSet {
    let mut changes = Vec::new();
    if current.description != desired.description {
        changes.push(FieldChange::Description {
            old: current.description.clone(),
            new: desired.description.clone(),
        });
    }
    if current.config != desired.config {
        changes.push(FieldChange::Config {
            old: current.config.clone(),
            new: desired.config.clone(),
        });
    }
    ChangeSet(changes)
}
