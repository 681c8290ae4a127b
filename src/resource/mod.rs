//! Incus resources for declarative reconciliation
//!
//! Every request in incant is modeled as a [`declarative::Resource`]:
//! - [`ProfileResource`]: ensure a profile is present, absent or renamed
//! - [`VolumeResource`]: ensure a custom volume's lifecycle state
//!
//! Each reconciliation reads live state through the shared
//! [`incuskit::Client`], resolves an operation and performs at most the
//! mutations needed.

pub mod profile;
pub mod volume;

pub use profile::{ProfileResource, ProfileSpec};
pub use volume::{VolumeResource, VolumeSpec};

use crate::config::Defaults;
use declarative::ConfigPatch;
use incuskit::Scope;

/// Resolve the scope of a resource, falling back to manifest defaults.
pub fn scope_for(remote: Option<&str>, project: Option<&str>, defaults: &Defaults) -> Scope {
    Scope::new(
        remote.or(defaults.remote.as_deref()),
        project.or(defaults.project.as_deref()),
    )
}

/// Fold a list of keys to remove into a config patch.
///
/// Manifests in TOML cannot express a null value, so removals are listed
/// separately and merged here.
pub fn config_patch(config: Option<&ConfigPatch>, unset: &[String]) -> Option<ConfigPatch> {
    if unset.is_empty() {
        return config.cloned();
    }
    let patch = unset
        .iter()
        .fold(config.cloned().unwrap_or_default(), |patch, key| {
            patch.unset(key.as_str())
        });
    Some(patch)
}

/// Expand `~` and environment variables in a path parameter.
pub fn expand(path: Option<&str>) -> Option<String> {
    path.map(|p| crate::paths::expand(p).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_prefers_resource_over_defaults() {
        let defaults = Defaults {
            remote: Some("cloud".to_string()),
            project: Some("prod".to_string()),
        };
        let scope = scope_for(None, Some("dev"), &defaults);
        assert_eq!(scope.remote, "cloud");
        assert_eq!(scope.project, "dev");

        let scope = scope_for(None, None, &Defaults::default());
        assert_eq!(scope, Scope::default());
    }

    #[test]
    fn test_config_patch_folds_unset() {
        assert_eq!(config_patch(None, &[]), None);

        let patch = config_patch(
            Some(&ConfigPatch::new().set("a", "1")),
            &["b".to_string()],
        )
        .unwrap();
        let entries: Vec<_> = patch.iter().collect();
        assert_eq!(entries, vec![("a", Some("1")), ("b", None)]);
    }
}
