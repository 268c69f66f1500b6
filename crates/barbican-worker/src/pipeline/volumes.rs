//! Volume assembly
//!
//! Worker volumes come from an ordered list of contributors. Each contributor
//! looks at the instance and returns zero or more bindings (a volume plus the
//! worker mounts that reference it). Custom config secrets go in front of the
//! worker bindings. Folding keeps volumes and mounts consistent by name: every
//! mount has a volume and every volume has a mount.

use std::collections::BTreeSet;

use barbican_common::crd::{BarbicanWorker, SecretStore};
use barbican_common::{tls, volumes};
use k8s_openapi::api::core::v1::{Volume, VolumeMount};
use kube::ResourceExt;
use tracing::{debug, warn};

/// A volume together with the worker container mounts that use it
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VolumeBinding {
    pub(crate) volume: Volume,
    pub(crate) mounts: Vec<VolumeMount>,
}

impl VolumeBinding {
    pub(crate) fn new(volume: Volume, mounts: Vec<VolumeMount>) -> Self {
        Self { volume, mounts }
    }
}

type Contributor = fn(&BarbicanWorker) -> Vec<VolumeBinding>;

/// Worker contributors, applied in order
const WORKER_CONTRIBUTORS: &[Contributor] = &[base_bindings, ca_bundle_bindings, hsm_bindings];

/// Final pod volumes and worker container mounts
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WorkerVolumes {
    pub(crate) volumes: Vec<Volume>,
    pub(crate) mounts: Vec<VolumeMount>,
}

impl WorkerVolumes {
    fn push(mut self, binding: VolumeBinding) -> Self {
        self.volumes.push(binding.volume);
        self.mounts.extend(binding.mounts);
        self
    }
}

/// Config volume (plus kolla config.json mount) and the log volume
pub(crate) fn base_bindings(instance: &BarbicanWorker) -> Vec<VolumeBinding> {
    let name = instance.name_any();
    vec![
        VolumeBinding::new(
            volumes::config_data_volume(&name),
            vec![
                volumes::config_data_mount(),
                volumes::kolla_config_mount(&name),
            ],
        ),
        VolumeBinding::new(volumes::log_volume(), vec![volumes::log_volume_mount()]),
    ]
}

/// CA trust bundle, when a bundle secret is configured
pub(crate) fn ca_bundle_bindings(instance: &BarbicanWorker) -> Vec<VolumeBinding> {
    let tls = &instance.spec.tls;
    tls::ca_bundle_volume(tls)
        .map(|vol| VolumeBinding::new(vol, tls::ca_bundle_mounts(tls)))
        .into_iter()
        .collect()
}

/// HSM client data, only when pkcs11 is enabled and configured
pub(crate) fn hsm_bindings(instance: &BarbicanWorker) -> Vec<VolumeBinding> {
    let Some(pkcs11) = instance.spec.active_pkcs11() else {
        if instance.spec.pkcs11.is_some() != instance.spec.is_enabled(SecretStore::Pkcs11) {
            debug!(
                worker = %instance.name_any(),
                "pkcs11 backend and config must both be set, skipping HSM volumes"
            );
        }
        return vec![];
    };

    volumes::hsm_volumes(pkcs11)
        .into_iter()
        .zip(volumes::hsm_volume_mounts(pkcs11))
        .map(|(vol, mount)| VolumeBinding::new(vol, vec![mount]))
        .collect()
}

/// One binding per custom config secret
pub(crate) fn custom_config_bindings(instance: &BarbicanWorker) -> Vec<VolumeBinding> {
    let secrets = &instance.spec.custom_service_config_secrets;
    volumes::custom_config_volumes(secrets)
        .into_iter()
        .zip(volumes::custom_config_mounts(secrets))
        .map(|(vol, mount)| VolumeBinding::new(vol, vec![mount]))
        .collect()
}

/// Assemble the pod volumes and worker mounts for an instance.
///
/// Custom secrets whose name repeats, or collides with a worker volume, are
/// dropped so the pod never carries two volumes of the same name.
pub(crate) fn compile(instance: &BarbicanWorker) -> WorkerVolumes {
    let worker: Vec<VolumeBinding> = WORKER_CONTRIBUTORS
        .iter()
        .flat_map(|contribute| contribute(instance))
        .collect();

    let reserved: BTreeSet<String> = worker.iter().map(|b| b.volume.name.clone()).collect();
    let mut seen = BTreeSet::new();
    let custom = custom_config_bindings(instance)
        .into_iter()
        .filter(|binding| {
            let name = &binding.volume.name;
            if reserved.contains(name) || !seen.insert(name.clone()) {
                warn!(
                    worker = %instance.name_any(),
                    volume = %name,
                    "skipping custom config secret with duplicate volume name"
                );
                return false;
            }
            true
        })
        .collect::<Vec<_>>();

    custom
        .into_iter()
        .chain(worker)
        .fold(WorkerVolumes::default(), WorkerVolumes::push)
}
