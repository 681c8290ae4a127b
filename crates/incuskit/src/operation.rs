//! Operation resolution.
//!
//! One pure function per resource kind maps the requested mode, the
//! existence of the resource and the auxiliary parameters to the list of
//! operations to perform. Missing parameters are rejected here, before any
//! command runs.

use crate::command::{AttachSpec, TransferKind, TransferSpec};
use crate::error::{Error, Result};
use crate::types::ContentType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested state of a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    #[default]
    Present,
    Absent,
}

/// Requested state of a custom volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeMode {
    #[default]
    Present,
    Absent,
    Restored,
    Exported,
    Imported,
    Copied,
}

impl VolumeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeMode::Present => "present",
            VolumeMode::Absent => "absent",
            VolumeMode::Restored => "restored",
            VolumeMode::Exported => "exported",
            VolumeMode::Imported => "imported",
            VolumeMode::Copied => "copied",
        }
    }
}

impl fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileMode::Present => f.write_str("present"),
            ProfileMode::Absent => f.write_str("absent"),
        }
    }
}

impl fmt::Display for VolumeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "present" => Ok(ProfileMode::Present),
            "absent" => Ok(ProfileMode::Absent),
            other => Err(format!("invalid profile state '{other}'")),
        }
    }
}

impl FromStr for VolumeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [
            VolumeMode::Present,
            VolumeMode::Absent,
            VolumeMode::Restored,
            VolumeMode::Exported,
            VolumeMode::Imported,
            VolumeMode::Copied,
        ]
        .into_iter()
        .find(|mode| mode.as_str() == s)
        .ok_or_else(|| format!("invalid volume state '{s}'"))
    }
}

/// A resolved action and the parameters it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    /// Create the resource; for volumes, then snapshot it if named
    Create { snapshot: Option<String> },
    /// Diff live against desired state and apply the difference
    Update,
    Delete,
    /// Rename an existing profile to the requested name
    Rename { from: String },
    /// Idempotent: nothing happens if the snapshot exists
    SnapshotCreate { snapshot: String },
    SnapshotDelete { snapshot: String },
    /// Fails if the snapshot is absent
    SnapshotRestore { snapshot: String },
    /// Always runs; exports are not idempotent
    Export { path: String },
    Import { path: String, name: Option<String> },
    Copy(TransferSpec),
    Move(TransferSpec),
    /// Attach the volume unless the instance has a device of that name
    Attach(AttachSpec),
    /// Nothing to do
    Keep { message: String },
}

impl OperationRequest {
    fn keep(message: impl Into<String>) -> Self {
        OperationRequest::Keep {
            message: message.into(),
        }
    }

    fn transfer(kind: TransferKind, spec: TransferSpec) -> Self {
        match kind {
            TransferKind::Copy => OperationRequest::Copy(spec),
            TransferKind::Move => OperationRequest::Move(spec),
        }
    }
}

/// Resolve the operation for a profile.
///
/// `rename_source_exists` is only consulted when the profile is absent and
/// a rename source was given.
pub fn resolve_profile(
    mode: ProfileMode,
    exists: bool,
    rename_from: Option<&str>,
    rename_source_exists: impl FnOnce(&str) -> Result<bool>,
) -> Result<OperationRequest> {
    let request = match (mode, exists) {
        (ProfileMode::Present, true) => OperationRequest::Update,
        (ProfileMode::Present, false) => match rename_from {
            Some(from) if rename_source_exists(from)? => OperationRequest::Rename {
                from: from.to_string(),
            },
            _ => OperationRequest::Create { snapshot: None },
        },
        (ProfileMode::Absent, true) => OperationRequest::Delete,
        (ProfileMode::Absent, false) => OperationRequest::keep("Profile not found"),
    };
    Ok(request)
}

/// Auxiliary parameters of a volume request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeParams {
    pub name: Option<String>,
    pub snapshot: Option<String>,
    pub export_to: Option<String>,
    pub import_from: Option<String>,
    pub target_pool: Option<String>,
    pub target_volume: Option<String>,
    pub move_volume: bool,
    /// Source or creation cluster member
    pub target: Option<String>,
    pub destination_target: Option<String>,
    pub attach_to: Option<String>,
    pub attach_path: Option<String>,
    pub attach_device: Option<String>,
    /// Effective content type, used to decide on the mount path
    pub content_type: ContentType,
}

fn required<'a>(value: Option<&'a String>, field: &str, mode: VolumeMode) -> Result<&'a str> {
    value
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::validation(format!("'{field}' is required for state={mode}")))
}

impl VolumeParams {
    fn attach_spec(&self, name: &str) -> Option<AttachSpec> {
        self.attach_to.as_ref().map(|instance| AttachSpec {
            instance: instance.clone(),
            device: self
                .attach_device
                .clone()
                .unwrap_or_else(|| name.to_string()),
            path: self.attach_path.clone(),
            content_type: self.content_type,
        })
    }
}

/// Resolve the operations for a volume.
///
/// Parameters are validated before `exists` is called, so a rejected
/// request never reaches the gateway. The returned list holds the primary
/// operation, followed by an `Attach` when an instance was named and the
/// primary operation leaves the volume in place.
pub fn resolve_volume(
    mode: VolumeMode,
    params: &VolumeParams,
    exists: impl FnOnce() -> Result<bool>,
) -> Result<Vec<OperationRequest>> {
    let name = match mode {
        VolumeMode::Imported => params.name.as_deref().unwrap_or_default(),
        _ => required(params.name.as_ref(), "name", mode)?,
    };
    if params.attach_to.is_some() && name.is_empty() {
        return Err(Error::validation("'name' is required with 'attach_to'"));
    }

    let primary = match mode {
        VolumeMode::Present => match (exists()?, &params.snapshot) {
            (false, snapshot) => OperationRequest::Create {
                snapshot: snapshot.clone(),
            },
            (true, None) => OperationRequest::Update,
            (true, Some(snapshot)) => OperationRequest::SnapshotCreate {
                snapshot: snapshot.clone(),
            },
        },
        VolumeMode::Absent => match (exists()?, &params.snapshot) {
            (false, _) => OperationRequest::keep("Storage volume not found"),
            (true, None) => OperationRequest::Delete,
            (true, Some(snapshot)) => OperationRequest::SnapshotDelete {
                snapshot: snapshot.clone(),
            },
        },
        VolumeMode::Restored => OperationRequest::SnapshotRestore {
            snapshot: required(params.snapshot.as_ref(), "snapshot", mode)?.to_string(),
        },
        VolumeMode::Exported => {
            let path = required(params.export_to.as_ref(), "export_to", mode)?.to_string();
            if !exists()? {
                return Err(Error::not_found(format!("Volume '{name}'")));
            }
            OperationRequest::Export { path }
        }
        VolumeMode::Imported => OperationRequest::Import {
            path: required(params.import_from.as_ref(), "import_from", mode)?.to_string(),
            name: (!name.is_empty()).then(|| name.to_string()),
        },
        VolumeMode::Copied => {
            let spec = TransferSpec {
                target_pool: required(params.target_pool.as_ref(), "target_pool", mode)?
                    .to_string(),
                target_volume: required(params.target_volume.as_ref(), "target_volume", mode)?
                    .to_string(),
                target: params.target.clone(),
                destination_target: params.destination_target.clone(),
            };
            if !exists()? {
                return Err(Error::not_found(format!("Source volume '{name}'")));
            }
            let kind = if params.move_volume {
                TransferKind::Move
            } else {
                TransferKind::Copy
            };
            OperationRequest::transfer(kind, spec)
        }
    };

    let attaches = matches!(
        primary,
        OperationRequest::Create { .. } | OperationRequest::Update | OperationRequest::Import { .. }
    );
    let mut requests = vec![primary];
    if attaches {
        requests.extend(params.attach_spec(name).map(OperationRequest::Attach));
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn params(name: &str) -> VolumeParams {
        VolumeParams {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn never() -> Result<bool> {
        panic!("existence lookup must not run")
    }

    #[test]
    fn test_profile_table() {
        let no_rename = |_: &str| -> Result<bool> { panic!("no rename lookup") };
        assert_eq!(
            resolve_profile(ProfileMode::Present, true, None, no_rename).unwrap(),
            OperationRequest::Update
        );
        assert_eq!(
            resolve_profile(ProfileMode::Present, false, None, no_rename).unwrap(),
            OperationRequest::Create { snapshot: None }
        );
        assert_eq!(
            resolve_profile(ProfileMode::Absent, true, None, no_rename).unwrap(),
            OperationRequest::Delete
        );
        assert!(matches!(
            resolve_profile(ProfileMode::Absent, false, None, no_rename).unwrap(),
            OperationRequest::Keep { .. }
        ));
    }

    #[test]
    fn test_profile_rename_only_when_source_exists() {
        assert_eq!(
            resolve_profile(ProfileMode::Present, false, Some("old"), |_| Ok(true)).unwrap(),
            OperationRequest::Rename {
                from: "old".to_string()
            }
        );
        assert_eq!(
            resolve_profile(ProfileMode::Present, false, Some("old"), |_| Ok(false)).unwrap(),
            OperationRequest::Create { snapshot: None }
        );
    }

    #[test]
    fn test_volume_present_table() {
        let mut p = params("data");
        assert_eq!(
            resolve_volume(VolumeMode::Present, &p, || Ok(false)).unwrap(),
            [OperationRequest::Create { snapshot: None }]
        );
        assert_eq!(
            resolve_volume(VolumeMode::Present, &p, || Ok(true)).unwrap(),
            [OperationRequest::Update]
        );

        p.snapshot = Some("s1".to_string());
        assert_eq!(
            resolve_volume(VolumeMode::Present, &p, || Ok(false)).unwrap(),
            [OperationRequest::Create {
                snapshot: Some("s1".to_string())
            }]
        );
        assert_eq!(
            resolve_volume(VolumeMode::Present, &p, || Ok(true)).unwrap(),
            [OperationRequest::SnapshotCreate {
                snapshot: "s1".to_string()
            }]
        );
    }

    #[test]
    fn test_volume_absent_table() {
        let mut p = params("data");
        assert!(matches!(
            resolve_volume(VolumeMode::Absent, &p, || Ok(false)).unwrap().as_slice(),
            [OperationRequest::Keep { .. }]
        ));
        assert_eq!(
            resolve_volume(VolumeMode::Absent, &p, || Ok(true)).unwrap(),
            [OperationRequest::Delete]
        );
        p.snapshot = Some("s1".to_string());
        assert_eq!(
            resolve_volume(VolumeMode::Absent, &p, || Ok(true)).unwrap(),
            [OperationRequest::SnapshotDelete {
                snapshot: "s1".to_string()
            }]
        );
    }

    #[test]
    fn test_restored_requires_snapshot_before_lookup() {
        let err = resolve_volume(VolumeMode::Restored, &params("data"), never).unwrap_err();
        assert_eq!(err.to_string(), "'snapshot' is required for state=restored");
    }

    #[test]
    fn test_missing_parameters_are_validation_errors() {
        let cases = [
            (VolumeMode::Exported, "'export_to' is required for state=exported"),
            (VolumeMode::Imported, "'import_from' is required for state=imported"),
            (VolumeMode::Copied, "'target_pool' is required for state=copied"),
        ];
        for (mode, message) in cases {
            let err = resolve_volume(mode, &params("data"), never).unwrap_err();
            assert_eq!(err.to_string(), message);
        }

        let mut p = params("data");
        p.target_pool = Some("fast".to_string());
        let err = resolve_volume(VolumeMode::Copied, &p, never).unwrap_err();
        assert_eq!(err.to_string(), "'target_volume' is required for state=copied");

        let err = resolve_volume(VolumeMode::Present, &VolumeParams::default(), never).unwrap_err();
        assert_eq!(err.to_string(), "'name' is required for state=present");
    }

    #[test]
    fn test_copy_of_missing_source_is_not_found() {
        let mut p = params("data");
        p.target_pool = Some("fast".to_string());
        p.target_volume = Some("data2".to_string());

        let err = resolve_volume(VolumeMode::Copied, &p, || Ok(false)).unwrap_err();
        assert_eq!(err.to_string(), "Source volume 'data' not found");
        assert_eq!(err.category(), crate::ErrorCategory::NotFound);

        p.move_volume = true;
        assert!(matches!(
            resolve_volume(VolumeMode::Copied, &p, || Ok(true)).unwrap().as_slice(),
            [OperationRequest::Move(_)]
        ));
    }

    #[test]
    fn test_import_skips_lookup_and_allows_missing_name() {
        let p = VolumeParams {
            import_from: Some("/backups/data.tar.gz".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_volume(VolumeMode::Imported, &p, never).unwrap(),
            [OperationRequest::Import {
                path: "/backups/data.tar.gz".to_string(),
                name: None
            }]
        );
    }

    #[test]
    fn test_export_requires_existing_volume() {
        let mut p = params("data");
        p.export_to = Some("/tmp/data.tar.gz".to_string());
        let lookups = Cell::new(0);
        let err = resolve_volume(VolumeMode::Exported, &p, || {
            lookups.set(lookups.get() + 1);
            Ok(false)
        })
        .unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::NotFound);
        assert_eq!(lookups.get(), 1);
    }

    #[test]
    fn test_attach_follows_update_with_default_device() {
        let mut p = params("data");
        p.attach_to = Some("web1".to_string());
        let requests = resolve_volume(VolumeMode::Present, &p, || Ok(true)).unwrap();
        assert_eq!(
            requests,
            [
                OperationRequest::Update,
                OperationRequest::Attach(AttachSpec {
                    instance: "web1".to_string(),
                    device: "data".to_string(),
                    path: None,
                    content_type: ContentType::Filesystem,
                }),
            ]
        );

        // No attach after deletion
        let requests = resolve_volume(VolumeMode::Absent, &p, || Ok(true)).unwrap();
        assert_eq!(requests, [OperationRequest::Delete]);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("copied".parse::<VolumeMode>().unwrap(), VolumeMode::Copied);
        assert!("gone".parse::<VolumeMode>().is_err());
        assert_eq!("absent".parse::<ProfileMode>().unwrap(), ProfileMode::Absent);
    }
}
