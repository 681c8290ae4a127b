//! Manifest loading
//!
//! A manifest declares a batch of profiles and volumes:
//!
//! ```toml
//! [defaults]
//! remote = "cloud"
//! project = "prod"
//!
//! [[profile]]
//! name = "web"
//! config = { "limits.cpu" = "2" }
//!
//! [[volume]]
//! pool = "default"
//! name = "data"
//! snapshot = "nightly"
//! ```
//!
//! The format follows the file extension: `.toml`, `.json`, `.yaml` or `.yml`.

use anyhow::{Context, Result, bail};
use declarative::ExecutionPlan;
use incuskit::Client;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::resource::{ProfileResource, ProfileSpec, VolumeResource, VolumeSpec};

/// Remote and project applied to entries that name neither
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

/// Serialization format of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
    Yaml,
}

impl ManifestFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some(other) => bail!(
                "Unsupported manifest extension '.{other}' (expected .toml, .json, .yaml or .yml)"
            ),
            None => bail!("Manifest {} has no file extension", path.display()),
        }
    }

    pub fn parse(self, content: &str) -> Result<Manifest> {
        let manifest = match self {
            Self::Toml => toml::from_str(content).context("Invalid TOML manifest")?,
            Self::Json => serde_json::from_str(content).context("Invalid JSON manifest")?,
            Self::Yaml => serde_yaml::from_str(content).context("Invalid YAML manifest")?,
        };
        Ok(manifest)
    }
}

/// A batch of declared resources
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub profile: Vec<ProfileSpec>,
    #[serde(default)]
    pub volume: Vec<VolumeSpec>,
}

impl Manifest {
    /// Load a manifest, choosing the parser by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = ManifestFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let manifest = format
            .parse(&content)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        log::debug!(
            "Loaded {} profile(s) and {} volume(s) from {}",
            manifest.profile.len(),
            manifest.volume.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Build the execution plan: profiles first, then volumes, each in
    /// declaration order.
    pub fn build_plan(&self, client: &Client) -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        for spec in &self.profile {
            plan.add_resource(Box::new(ProfileResource::new(
                spec.clone(),
                &self.defaults,
                client.clone(),
            )));
        }
        for spec in &self.volume {
            plan.add_resource(Box::new(VolumeResource::new(
                spec.clone(),
                &self.defaults,
                client.clone(),
            )));
        }
        plan
    }
}
