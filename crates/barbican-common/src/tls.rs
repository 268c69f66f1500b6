//! CA trust bundle volume and mount
//!
//! The bundle secret carries a single `tls-ca-bundle.pem` key which is
//! mounted over the distro's extracted trust store.

use k8s_openapi::api::core::v1::{Volume, VolumeMount};

use crate::crd::TlsSpec;
use crate::volumes::secret_volume;

/// Volume name for the CA bundle
pub const CA_BUNDLE_VOLUME: &str = "combined-ca-bundle";

/// Key of the bundle inside the secret
pub const CA_BUNDLE_KEY: &str = "tls-ca-bundle.pem";

/// Where the bundle lands in the container
pub const CA_BUNDLE_MOUNT_PATH: &str = "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem";

/// Mode for the bundle file (r--r--r--)
pub const CA_BUNDLE_MODE: i32 = 0o444;

/// CA bundle volume, or `None` when no bundle secret is configured
pub fn ca_bundle_volume(tls: &TlsSpec) -> Option<Volume> {
    tls.has_ca_bundle().then(|| {
        secret_volume(
            CA_BUNDLE_VOLUME,
            &tls.ca_bundle_secret_name,
            CA_BUNDLE_MODE,
        )
    })
}

/// Mounts matching [`ca_bundle_volume`]; empty when no bundle is configured
pub fn ca_bundle_mounts(tls: &TlsSpec) -> Vec<VolumeMount> {
    if !tls.has_ca_bundle() {
        return vec![];
    }
    vec![VolumeMount {
        name: CA_BUNDLE_VOLUME.to_string(),
        mount_path: CA_BUNDLE_MOUNT_PATH.to_string(),
        sub_path: Some(CA_BUNDLE_KEY.to_string()),
        read_only: Some(true),
        ..Default::default()
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bundle_secret_means_no_volume() {
        let tls = TlsSpec::default();

        assert!(ca_bundle_volume(&tls).is_none());
        assert!(ca_bundle_mounts(&tls).is_empty());
    }

    #[test]
    fn bundle_secret_produces_readonly_volume_and_mount() {
        let tls = TlsSpec {
            ca_bundle_secret_name: "combined-ca-bundle".to_string(),
        };

        let vol = ca_bundle_volume(&tls).expect("volume should be created");
        let mounts = ca_bundle_mounts(&tls);

        let secret = vol.secret.expect("should be secret-backed");
        assert_eq!(secret.default_mode, Some(0o444));
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].name, vol.name);
        assert_eq!(mounts[0].sub_path.as_deref(), Some(CA_BUNDLE_KEY));
        assert_eq!(mounts[0].read_only, Some(true));
    }
}
