use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use declarative::ConfigPatch;
use declarative::patch::parse_assignment;
use incuskit::{ContentType, DevicePatch, DeviceSpec, ProfileMode, VolumeMode, VolumeType};

use crate::resource::{ProfileSpec, VolumeSpec};

#[derive(Parser)]
#[command(name = "incant")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative Incus profile and storage volume reconciliation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ensure the state of one profile
    Profile(ProfileArgs),

    /// Ensure the state of one custom storage volume
    Volume(VolumeArgs),

    /// Reconcile every resource in a manifest
    Apply(ApplyArgs),

    /// Preview what apply would change
    Diff(DiffArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared flags
// ============================================================================

#[derive(Args, Clone, Default)]
pub struct ScopeArgs {
    /// Remote the resource lives on
    #[arg(long)]
    pub remote: Option<String>,

    /// Project the resource belongs to
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Clone, Default)]
pub struct ConfigArgs {
    /// Description to set
    #[arg(long)]
    pub description: Option<String>,

    /// Config key to set (repeatable)
    #[arg(long = "config", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub config: Vec<(String, String)>,

    /// Config key to remove (repeatable)
    #[arg(long, value_name = "KEY")]
    pub unset: Vec<String>,
}

impl ConfigArgs {
    fn patch(&self) -> Option<ConfigPatch> {
        if self.config.is_empty() {
            return None;
        }
        Some(self.config.iter().cloned().map(|(k, v)| (k, Some(v))).collect())
    }
}

#[derive(Args, Clone, Default)]
pub struct OutputArgs {
    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Args, Clone)]
pub struct ProfileArgs {
    /// Profile name
    pub name: String,

    /// Desired state: present or absent
    #[arg(long, default_value = "present")]
    pub state: ProfileMode,

    /// YAML declaration used as the baseline
    #[arg(long, value_name = "FILE")]
    pub source: Option<String>,

    #[command(flatten)]
    pub settings: ConfigArgs,

    /// Device to add or replace, as NAME:key=value,key=value (repeatable)
    #[arg(long = "device", value_name = "NAME:KEY=VALUE,...", value_parser = parse_device)]
    pub devices: Vec<(String, DeviceSpec)>,

    /// Device to remove (repeatable)
    #[arg(long = "remove-device", value_name = "NAME")]
    pub remove_devices: Vec<String>,

    /// Rename this existing profile to NAME when NAME does not exist
    #[arg(long, value_name = "OLD")]
    pub rename_from: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Show a diff of the current and desired profile
    #[arg(long)]
    pub diff: bool,
}

impl ProfileArgs {
    pub fn spec(&self) -> ProfileSpec {
        let devices = if self.devices.is_empty() {
            None
        } else {
            Some(
                self.devices
                    .iter()
                    .fold(DevicePatch::new(), |patch, (name, device)| {
                        patch.put(name.as_str(), device.clone())
                    }),
            )
        };
        ProfileSpec {
            name: self.name.clone(),
            state: self.state,
            source: self.source.clone(),
            description: self.settings.description.clone(),
            config: self.settings.patch(),
            unset: self.settings.unset.clone(),
            devices,
            remove_devices: self.remove_devices.clone(),
            rename_from: self.rename_from.clone(),
            remote: self.scope.remote.clone(),
            project: self.scope.project.clone(),
        }
    }
}

/// Parse `NAME:key=value,key=value` into a device
pub fn parse_device(input: &str) -> Result<(String, DeviceSpec), String> {
    let (name, attributes) = input
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:KEY=VALUE,..., got '{input}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing device name in '{input}'"));
    }
    let device = attributes
        .split(',')
        .filter(|a| !a.trim().is_empty())
        .map(parse_assignment)
        .collect::<Result<DeviceSpec, String>>()?;
    if device.is_empty() {
        return Err(format!("device '{name}' has no attributes"));
    }
    Ok((name.to_string(), device))
}

// ============================================================================
// Volume
// ============================================================================

#[derive(Args, Clone)]
pub struct VolumeArgs {
    /// Storage pool
    pub pool: String,

    /// Volume name (optional for imports)
    pub name: Option<String>,

    /// Desired state: present, absent, restored, exported, imported or copied
    #[arg(long, default_value = "present")]
    pub state: VolumeMode,

    /// Volume type at creation: filesystem or block
    #[arg(long = "type", default_value = "filesystem")]
    pub volume_type: VolumeType,

    /// Content type: filesystem, block or iso
    #[arg(long)]
    pub content_type: Option<ContentType>,

    /// YAML declaration providing description and config
    #[arg(long, value_name = "FILE")]
    pub source: Option<String>,

    #[command(flatten)]
    pub settings: ConfigArgs,

    /// Snapshot to create, delete or restore
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Export destination (state=exported)
    #[arg(long, value_name = "FILE")]
    pub export_to: Option<String>,

    /// Import source (state=imported)
    #[arg(long, value_name = "FILE")]
    pub import_from: Option<String>,

    /// Destination pool (state=copied)
    #[arg(long)]
    pub target_pool: Option<String>,

    /// Destination volume name (state=copied)
    #[arg(long)]
    pub target_volume: Option<String>,

    /// Move instead of copy
    #[arg(long = "move")]
    pub move_volume: bool,

    /// Cluster member to create on, or to copy/move from
    #[arg(long, value_name = "MEMBER")]
    pub target: Option<String>,

    /// Cluster member to copy/move to
    #[arg(long, value_name = "MEMBER")]
    pub destination_target: Option<String>,

    /// Instance to attach the volume to
    #[arg(long, value_name = "INSTANCE")]
    pub attach_to: Option<String>,

    /// Mount path inside the instance (filesystem volumes)
    #[arg(long, value_name = "PATH")]
    pub attach_path: Option<String>,

    /// Device name on the instance (defaults to the volume name)
    #[arg(long, value_name = "DEVICE")]
    pub attach_device: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl VolumeArgs {
    pub fn spec(&self) -> VolumeSpec {
        VolumeSpec {
            pool: self.pool.clone(),
            name: self.name.clone(),
            state: self.state,
            volume_type: self.volume_type,
            content_type: self.content_type,
            source: self.source.clone(),
            description: self.settings.description.clone(),
            config: self.settings.patch(),
            unset: self.settings.unset.clone(),
            snapshot: self.snapshot.clone(),
            export_to: self.export_to.clone(),
            import_from: self.import_from.clone(),
            target_pool: self.target_pool.clone(),
            target_volume: self.target_volume.clone(),
            move_volume: self.move_volume,
            target: self.target.clone(),
            destination_target: self.destination_target.clone(),
            attach_to: self.attach_to.clone(),
            attach_path: self.attach_path.clone(),
            attach_device: self.attach_device.clone(),
            remote: self.scope.remote.clone(),
            project: self.scope.project.clone(),
        }
    }
}

// ============================================================================
// Manifest commands
// ============================================================================

#[derive(Args, Clone)]
pub struct ApplyArgs {
    /// Manifest file (default: <config dir>/incant.toml)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// Only reconcile matching resources: profile, volume, profile.<name>,
    /// volume.<pool>/<name>
    #[arg(short, long)]
    pub target: Option<String>,

    /// Preview only
    #[arg(long)]
    pub check: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Clone)]
pub struct DiffArgs {
    /// Manifest file (default: <config dir>/incant.toml)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// Only preview matching resources
    #[arg(short, long)]
    pub target: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_device() {
        let (name, device) = parse_device("eth0:type=nic,network=incusbr0").unwrap();
        assert_eq!(name, "eth0");
        assert_eq!(device.get("type").map(String::as_str), Some("nic"));
        assert_eq!(device.get("network").map(String::as_str), Some("incusbr0"));

        assert!(parse_device("eth0").is_err());
        assert!(parse_device(":type=nic").is_err());
        assert!(parse_device("eth0:").is_err());
        assert!(parse_device("eth0:type").is_err());
    }

    #[test]
    fn test_profile_args_to_spec() {
        let cli = Cli::try_parse_from([
            "incant",
            "profile",
            "web",
            "--config",
            "limits.cpu=2",
            "--unset",
            "limits.memory",
            "--device",
            "root:type=disk,pool=default,path=/",
            "--remove-device",
            "eth1",
            "--project",
            "prod",
            "--check",
        ])
        .unwrap();
        let Command::Profile(args) = cli.command else {
            panic!("expected profile command");
        };
        assert!(args.output.check);

        let spec = args.spec();
        assert_eq!(spec.project.as_deref(), Some("prod"));
        let overrides = spec.overrides();
        let config: Vec<_> = overrides.config.as_ref().unwrap().iter().collect();
        assert_eq!(
            config,
            vec![("limits.cpu", Some("2")), ("limits.memory", None)]
        );
        assert!(!overrides.devices.unwrap().is_empty());
    }

    #[test]
    fn test_volume_args_to_spec() {
        let cli = Cli::try_parse_from([
            "incant",
            "volume",
            "default",
            "data",
            "--state",
            "copied",
            "--target-pool",
            "fast",
            "--target-volume",
            "data2",
            "--move",
            "--type",
            "block",
        ])
        .unwrap();
        let Command::Volume(args) = cli.command else {
            panic!("expected volume command");
        };
        let spec = args.spec();
        assert_eq!(spec.state, VolumeMode::Copied);
        assert!(spec.move_volume);
        assert_eq!(spec.volume_type, VolumeType::Block);
        assert_eq!(spec.effective_content_type(), ContentType::Block);
    }

    #[test]
    fn test_invalid_state_is_rejected() {
        let args = ["incant", "volume", "default", "data", "--state", "gone"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
