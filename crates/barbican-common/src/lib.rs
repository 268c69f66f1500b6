//! Common types for the Barbican worker: CRDs, errors, and pod building blocks

#![deny(missing_docs)]

use std::collections::BTreeMap;

pub mod affinity;
pub mod crd;
pub mod error;
pub mod hash;
pub mod telemetry;
pub mod tls;
pub mod volumes;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Service name shared by every Barbican component
pub const SERVICE_NAME: &str = "barbican";

/// Component name of the worker (label value and container name)
pub const COMPONENT_WORKER: &str = "barbican-worker";

/// Directory the services write their log files into (trailing slash included)
pub const LOG_PATH: &str = "/var/log/barbican/";

/// Label key carrying the service name
pub const LABEL_SERVICE: &str = "service";

/// Label key carrying the component name, used by the default anti-affinity
pub const LABEL_COMPONENT: &str = "component";

/// Label key carrying the owning instance name
pub const LABEL_OWNER: &str = "owner";

/// Canonical label set for a worker instance.
///
/// The `component` label is what [`affinity::distribute_pods`] selects on,
/// so Deployments built with these labels spread across nodes by default.
pub fn worker_labels(instance_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_SERVICE.to_string(), SERVICE_NAME.to_string()),
        (LABEL_COMPONENT.to_string(), COMPONENT_WORKER.to_string()),
        (LABEL_OWNER.to_string(), instance_name.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_labels_carry_component_selector() {
        let labels = worker_labels("barbican");

        assert_eq!(labels.len(), 3);
        assert_eq!(labels[LABEL_SERVICE], "barbican");
        assert_eq!(labels[LABEL_COMPONENT], COMPONENT_WORKER);
        assert_eq!(labels[LABEL_OWNER], "barbican");
    }
}
