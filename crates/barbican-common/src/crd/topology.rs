//! Topology Custom Resource Definition
//!
//! A Topology is a shared placement policy: topology spread constraints and/or
//! an affinity block that services reference by name. When a worker has one,
//! it fully owns the placement fields of the pod template.

use k8s_openapi::api::core::v1::{Affinity, PodSpec, PodTemplateSpec, TopologySpreadConstraint};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a Topology
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "topology.openstack.org",
    version = "v1beta1",
    kind = "Topology",
    plural = "topologies",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct TopologySpec {
    /// Spread constraints copied onto the pod spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_spread_constraints: Option<Vec<TopologySpreadConstraint>>,

    /// Affinity copied onto the pod spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
}

impl Topology {
    /// Apply this topology to a pod template.
    ///
    /// Only the fields the topology sets are written; the rest of the pod spec
    /// is carried over untouched.
    pub fn apply_to(&self, mut template: PodTemplateSpec) -> PodTemplateSpec {
        let spec = template.spec.get_or_insert_with(PodSpec::default);
        if let Some(constraints) = &self.spec.topology_spread_constraints {
            spec.topology_spread_constraints = Some(constraints.clone());
        }
        if let Some(affinity) = &self.spec.affinity {
            spec.affinity = Some(affinity.clone());
        }
        template
    }
}
