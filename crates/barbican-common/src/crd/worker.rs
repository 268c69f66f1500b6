//! BarbicanWorker Custom Resource Definition
//!
//! The worker consumes queued key-management tasks. Its Deployment is compiled
//! by the `barbican-worker` crate from this spec.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::resources::ResourceRequirements;
use crate::{Error, Result};

/// Mount path for HSM client data when `clientDataPath` is not set
pub const DEFAULT_HSM_CLIENT_DATA_PATH: &str = "/var/lib/config-data/hsm";

/// Secret store backends Barbican can be configured with
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SecretStore {
    /// Software-only store, keys wrapped by a KEK held in the config
    SimpleCrypto,
    /// Hardware security module reached through a PKCS#11 library
    Pkcs11,
}

impl std::fmt::Display for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SimpleCrypto => write!(f, "simple_crypto"),
            Self::Pkcs11 => write!(f, "pkcs11"),
        }
    }
}

impl std::str::FromStr for SecretStore {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "simple_crypto" => Ok(Self::SimpleCrypto),
            "pkcs11" => Ok(Self::Pkcs11),
            _ => Err(Error::validation(format!(
                "invalid secret store: {s}, expected one of: simple_crypto, pkcs11"
            ))),
        }
    }
}

/// PKCS#11 (HSM) client configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pkcs11Spec {
    /// Secret holding the HSM client certificates and vendor config files
    pub client_data_secret: String,

    /// Where the client data secret is mounted in the worker container
    #[serde(default = "default_hsm_client_data_path")]
    pub client_data_path: String,

    /// Secret holding the HSM partition password
    #[serde(default)]
    pub login_secret: String,

    /// Vendor PKCS#11 library path inside the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<String>,

    /// HSM slot identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,

    /// HSM token label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_label: Option<String>,
}

fn default_hsm_client_data_path() -> String {
    DEFAULT_HSM_CLIENT_DATA_PATH.to_string()
}

impl Pkcs11Spec {
    /// Create a PKCS#11 config that mounts `client_data_secret` at the default path
    pub fn new(client_data_secret: impl Into<String>) -> Self {
        Self {
            client_data_secret: client_data_secret.into(),
            client_data_path: default_hsm_client_data_path(),
            login_secret: String::new(),
            library_path: None,
            slot_id: None,
            token_label: None,
        }
    }
}

/// TLS settings for outbound connections
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// Secret holding the combined CA bundle (`tls-ca-bundle.pem`); empty disables it
    #[serde(default)]
    pub ca_bundle_secret_name: String,
}

impl TlsSpec {
    /// True when a CA bundle secret is configured
    pub fn has_ca_bundle(&self) -> bool {
        !self.ca_bundle_secret_name.is_empty()
    }
}

/// Reference to a Topology resource that governs pod placement
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopologyRef {
    /// Topology name
    pub name: String,
    /// Topology namespace (defaults to the worker's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Specification for a Barbican worker
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "barbican.openstack.org",
    version = "v1beta1",
    kind = "BarbicanWorker",
    plural = "barbicanworkers",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BarbicanWorkerSpec {
    /// Worker container image
    pub container_image: String,

    /// Number of worker pods
    #[serde(default = "default_replicas")]
    pub replicas: Option<i32>,

    /// Resource requests/limits applied to both containers
    #[serde(default)]
    pub resources: ResourceRequirements,

    /// Service account the pods run as
    #[serde(default)]
    pub service_account: String,

    /// Node selector copied verbatim onto the pod spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    /// Secret store backends enabled for this deployment
    #[serde(default)]
    pub enabled_secret_stores: Vec<SecretStore>,

    /// HSM client configuration, only used when `pkcs11` is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkcs11: Option<Pkcs11Spec>,

    /// TLS settings
    #[serde(default)]
    pub tls: TlsSpec,

    /// Extra secrets carrying config snippets mounted into the worker
    #[serde(default)]
    pub custom_service_config_secrets: Vec<String>,

    /// Topology the controller resolves and hands to the compiler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_ref: Option<TopologyRef>,
}

fn default_replicas() -> Option<i32> {
    Some(1)
}

impl Default for BarbicanWorkerSpec {
    fn default() -> Self {
        Self {
            container_image: String::new(),
            replicas: default_replicas(),
            resources: ResourceRequirements::default(),
            service_account: String::new(),
            node_selector: None,
            enabled_secret_stores: Vec::new(),
            pkcs11: None,
            tls: TlsSpec::default(),
            custom_service_config_secrets: Vec::new(),
            topology_ref: None,
        }
    }
}

impl BarbicanWorkerSpec {
    /// True when the given secret store backend is enabled
    pub fn is_enabled(&self, store: SecretStore) -> bool {
        self.enabled_secret_stores.contains(&store)
    }

    /// PKCS#11 config, but only when the backend is also enabled.
    ///
    /// Either half alone means the HSM is not in use.
    pub fn active_pkcs11(&self) -> Option<&Pkcs11Spec> {
        self.pkcs11
            .as_ref()
            .filter(|_| self.is_enabled(SecretStore::Pkcs11))
    }

    /// Admission-style checks for hard configuration errors.
    ///
    /// Soft combinations (backend enabled without config and vice versa) are
    /// accepted; the compiler omits the feature instead.
    pub fn validate(&self, worker: &str) -> Result<()> {
        if self.container_image.trim().is_empty() {
            return Err(Error::validation_for_field(
                worker,
                "spec.containerImage",
                "container image must not be empty",
            ));
        }

        if let Some(replicas) = self.replicas {
            if replicas < 0 {
                return Err(Error::validation_for_field(
                    worker,
                    "spec.replicas",
                    format!("replicas must be >= 0, got {replicas}"),
                ));
            }
        }

        if let Some(pkcs11) = &self.pkcs11 {
            if pkcs11.client_data_secret.is_empty() {
                return Err(Error::validation_for_field(
                    worker,
                    "spec.pkcs11.clientDataSecret",
                    "client data secret must not be empty",
                ));
            }
            if !pkcs11.client_data_path.starts_with('/') {
                return Err(Error::validation_for_field(
                    worker,
                    "spec.pkcs11.clientDataPath",
                    format!("'{}' is not an absolute path", pkcs11.client_data_path),
                ));
            }
        }

        for secret in &self.custom_service_config_secrets {
            if !is_dns_label(secret) {
                return Err(Error::validation_for_field(
                    worker,
                    "spec.customServiceConfigSecrets",
                    format!("'{secret}' is not a valid DNS label"),
                ));
            }
        }

        Ok(())
    }
}

/// DNS labels: `[a-z0-9]([-a-z0-9]*[a-z0-9])?`, max 63 chars.
fn is_dns_label(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 63
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}
