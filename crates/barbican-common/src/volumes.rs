//! Volume and mount building blocks shared by Barbican components
//!
//! Each helper returns a fresh typed k8s_openapi value. Volume names are fixed
//! so that a mount built here always pairs with the volume built next to it.

use k8s_openapi::api::core::v1::{
    EmptyDirVolumeSource, SecretVolumeSource, Volume, VolumeMount,
};

use crate::crd::Pkcs11Spec;
use crate::LOG_PATH;

/// Mode for config files projected from secrets (rw-r--r--)
pub const CONFIG_FILE_MODE: i32 = 0o644;

/// Volume holding the rendered per-instance configuration
pub const CONFIG_DATA_VOLUME: &str = "config-data";

/// Volume the services write their logs into
pub const LOG_VOLUME: &str = "logs";

/// Volume holding the HSM client data
pub const HSM_CLIENT_DATA_VOLUME: &str = "hsm-client-data";

/// Where the rendered default configuration is mounted
pub const CONFIG_DATA_MOUNT_PATH: &str = "/var/lib/config-data/default";

/// Directory custom config secrets are mounted under, one sub-directory each
pub const CUSTOM_CONFIG_MOUNT_DIR: &str = "/var/lib/config-data/custom";

/// Path kolla_start reads its copy instructions from
pub const KOLLA_CONFIG_PATH: &str = "/var/lib/kolla/config_files/config.json";

/// Name of the secret carrying an instance's rendered configuration
pub fn config_secret_name(instance_name: &str) -> String {
    format!("{}-config-data", instance_name)
}

/// Log file an instance writes (`<LOG_PATH><name>.log`)
pub fn log_file_path(instance_name: &str) -> String {
    format!("{}{}.log", LOG_PATH, instance_name)
}

/// Build a secret-backed volume
pub fn secret_volume(name: &str, secret_name: &str, default_mode: i32) -> Volume {
    Volume {
        name: name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name.to_string()),
            default_mode: Some(default_mode),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build a read-only mount of a whole volume
pub fn readonly_mount(name: &str, mount_path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: mount_path.to_string(),
        read_only: Some(true),
        ..Default::default()
    }
}

/// Per-instance configuration volume, backed by `<name>-config-data`
pub fn config_data_volume(instance_name: &str) -> Volume {
    secret_volume(
        CONFIG_DATA_VOLUME,
        &config_secret_name(instance_name),
        CONFIG_FILE_MODE,
    )
}

/// Read-only mount of the rendered default configuration
pub fn config_data_mount() -> VolumeMount {
    readonly_mount(CONFIG_DATA_VOLUME, CONFIG_DATA_MOUNT_PATH)
}

/// Mount of the instance's kolla `config.json` out of the config volume.
///
/// The key in `<name>-config-data` is `<name>-config.json`.
pub fn kolla_config_mount(instance_name: &str) -> VolumeMount {
    VolumeMount {
        name: CONFIG_DATA_VOLUME.to_string(),
        mount_path: KOLLA_CONFIG_PATH.to_string(),
        sub_path: Some(format!("{}-config.json", instance_name)),
        read_only: Some(true),
        ..Default::default()
    }
}

/// Pod-local log volume
pub fn log_volume() -> Volume {
    Volume {
        name: LOG_VOLUME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}

/// Writable mount of the log volume at [`LOG_PATH`]
pub fn log_volume_mount() -> VolumeMount {
    VolumeMount {
        name: LOG_VOLUME.to_string(),
        mount_path: LOG_PATH.trim_end_matches('/').to_string(),
        read_only: Some(false),
        ..Default::default()
    }
}

/// One secret volume per custom config secret, named after the secret
pub fn custom_config_volumes(secret_names: &[String]) -> Vec<Volume> {
    secret_names
        .iter()
        .map(|secret| secret_volume(secret, secret, CONFIG_FILE_MODE))
        .collect()
}

/// Read-only mounts matching [`custom_config_volumes`]
pub fn custom_config_mounts(secret_names: &[String]) -> Vec<VolumeMount> {
    secret_names
        .iter()
        .map(|secret| readonly_mount(secret, &format!("{}/{}", CUSTOM_CONFIG_MOUNT_DIR, secret)))
        .collect()
}

/// Volumes needed to talk to an HSM
pub fn hsm_volumes(pkcs11: &Pkcs11Spec) -> Vec<Volume> {
    vec![secret_volume(
        HSM_CLIENT_DATA_VOLUME,
        &pkcs11.client_data_secret,
        CONFIG_FILE_MODE,
    )]
}

/// Mounts matching [`hsm_volumes`]
pub fn hsm_volume_mounts(pkcs11: &Pkcs11Spec) -> Vec<VolumeMount> {
    vec![readonly_mount(
        HSM_CLIENT_DATA_VOLUME,
        &pkcs11.client_data_path,
    )]
}
