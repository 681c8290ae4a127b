//! State reader: fetches live resource state through `show` commands.
//!
//! A lookup that exits non-zero yields `None`: the CLI does not separate
//! "not found" from other show failures. Undecodable output is surfaced as
//! [`Error::Decode`] by the `decode_*` functions; the `fetch_*` methods
//! choose to treat it as absent as well. Only failing to run `incus` at
//! all is an error.

use crate::Client;
use crate::command;
use crate::error::{Error, Result};
use crate::types::{DeviceMap, ProfileState, ResourceIdentity, Scope, VolumeState, device_map};
use serde::Deserialize;
use serde::de::DeserializeOwned;

fn decode<T: DeserializeOwned>(what: &str, text: &str) -> Result<T> {
    serde_yaml::from_str(text).map_err(|e| Error::Decode {
        what: what.to_string(),
        message: e.to_string(),
    })
}

/// Decode `profile show` output.
pub fn decode_profile(text: &str) -> Result<ProfileState> {
    decode("profile", text)
}

/// Decode `storage volume show` output.
pub fn decode_volume(text: &str) -> Result<VolumeState> {
    decode("storage volume", text)
}

#[derive(Deserialize)]
struct InstanceConfig {
    #[serde(default, deserialize_with = "device_map")]
    devices: DeviceMap,
}

/// Decode the `devices` section of `config show` output.
pub fn decode_instance_devices(text: &str) -> Result<DeviceMap> {
    decode::<InstanceConfig>("instance config", text).map(|c| c.devices)
}

/// Treat a decode failure as an absent resource.
fn absent_on_decode<T>(subject: &str, decoded: Result<T>) -> Result<Option<T>> {
    match decoded {
        Ok(value) => Ok(Some(value)),
        Err(err @ Error::Decode { .. }) => {
            log::debug!("{subject}: {err}; treating as absent");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

impl Client {
    /// Run a show command; `None` when it exits non-zero.
    fn show(&self, scope: &Scope, args: &[String], subject: &str) -> Result<Option<String>> {
        let output = self.run(scope, args, None)?;
        if output.success() {
            Ok(Some(output.stdout))
        } else {
            log::debug!("{subject} not found: {}", output.stderr.trim());
            Ok(None)
        }
    }

    /// Fetch the live state of a profile.
    pub fn fetch_profile(&self, id: &ResourceIdentity) -> Result<Option<ProfileState>> {
        let subject = format!("profile '{}'", id.qualified_name());
        match self.show(id.scope(), &command::profile_show(id), &subject)? {
            Some(text) => absent_on_decode(&subject, decode_profile(&text)),
            None => Ok(None),
        }
    }

    /// Fetch the live state of a custom volume.
    pub fn fetch_volume(&self, id: &ResourceIdentity) -> Result<Option<VolumeState>> {
        let subject = format!("volume '{id}'");
        match self.show(id.scope(), &command::volume_show(id, None), &subject)? {
            Some(text) => absent_on_decode(&subject, decode_volume(&text)),
            None => Ok(None),
        }
    }

    /// Whether `snapshot` exists on the volume.
    pub fn snapshot_exists(&self, id: &ResourceIdentity, snapshot: &str) -> Result<bool> {
        let subject = format!("snapshot '{id}/{snapshot}'");
        let found = self.show(id.scope(), &command::volume_show(id, Some(snapshot)), &subject)?;
        Ok(found.is_some())
    }

    /// Devices configured on an instance; `None` if the instance is unreadable.
    pub fn instance_devices(&self, scope: &Scope, instance: &str) -> Result<Option<DeviceMap>> {
        let subject = format!("instance '{}'", scope.qualify(instance));
        match self.show(scope, &command::instance_config_show(scope, instance), &subject)? {
            Some(text) => absent_on_decode(&subject, decode_instance_devices(&text)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;
    use crate::types::CommandOutput;
    use std::sync::Arc;

    fn client() -> (Arc<ScriptedBackend>, Client) {
        let backend = Arc::new(ScriptedBackend::new());
        (backend.clone(), Client::with_backend(backend))
    }

    #[test]
    fn test_fetch_profile_present() {
        let (backend, client) = client();
        backend.respond(
            &["profile", "show", "web"],
            CommandOutput::ok("config:\n  limits.cpu: \"2\"\ndescription: Web\ndevices: {}\n"),
        );

        let id = ResourceIdentity::profile("web", Scope::default());
        let profile = client.fetch_profile(&id).unwrap().unwrap();
        assert_eq!(profile.description, "Web");
        assert_eq!(profile.config["limits.cpu"], "2");
    }

    #[test]
    fn test_fetch_profile_nonzero_is_absent() {
        let (_, client) = client();
        let id = ResourceIdentity::profile("web", Scope::default());
        assert!(client.fetch_profile(&id).unwrap().is_none());
    }

    #[test]
    fn test_undecodable_output_is_absent() {
        let (backend, client) = client();
        backend.respond(&["storage", "volume", "show"], CommandOutput::ok("config: [unclosed\n"));

        let id = ResourceIdentity::volume("default", "data", Scope::default());
        assert!(client.fetch_volume(&id).unwrap().is_none());
        assert!(matches!(
            decode_volume("config: [unclosed\n"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_snapshot_exists_uses_slash_path() {
        let (backend, client) = client();
        backend.respond(
            &["storage", "volume", "show", "default", "data/s1"],
            CommandOutput::ok("name: s1\n"),
        );

        let id = ResourceIdentity::volume("default", "data", Scope::default());
        assert!(client.snapshot_exists(&id, "s1").unwrap());
        assert!(!client.snapshot_exists(&id, "s2").unwrap());
    }

    #[test]
    fn test_instance_devices() {
        let (backend, client) = client();
        backend.respond(
            &["config", "show", "web1"],
            CommandOutput::ok(
                "architecture: x86_64\nconfig: {}\ndevices:\n  data:\n    pool: default\n    source: data\n    type: disk\nephemeral: false\n",
            ),
        );

        let devices = client
            .instance_devices(&Scope::default(), "web1")
            .unwrap()
            .unwrap();
        assert_eq!(devices["data"]["source"], "data");
    }
}
