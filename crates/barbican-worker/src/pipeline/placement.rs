//! Pod placement
//!
//! Exactly one policy owns the affinity and topology spread fields of the pod
//! template: an explicit [`Topology`] when the caller resolved one, otherwise
//! the default per-component anti-affinity. The two are never merged.

use barbican_common::affinity::component_pod_affinity;
use barbican_common::crd::Topology;
use barbican_common::COMPONENT_WORKER;
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};

/// A placement policy rewrites the scheduling fields of a pod template
pub trait PlacementPolicy {
    /// Return `template` with this policy's placement applied
    fn apply_to(&self, template: PodTemplateSpec) -> PodTemplateSpec;
}

impl PlacementPolicy for Topology {
    fn apply_to(&self, template: PodTemplateSpec) -> PodTemplateSpec {
        Topology::apply_to(self, template)
    }
}

/// Spread pods of one component across nodes when capacity allows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultAntiAffinity {
    component: String,
}

impl DefaultAntiAffinity {
    /// Anti-affinity keyed on the given component label value
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl Default for DefaultAntiAffinity {
    fn default() -> Self {
        Self::new(COMPONENT_WORKER)
    }
}

impl PlacementPolicy for DefaultAntiAffinity {
    fn apply_to(&self, mut template: PodTemplateSpec) -> PodTemplateSpec {
        let spec = template.spec.get_or_insert_with(PodSpec::default);
        spec.affinity = Some(component_pod_affinity(&self.component));
        template
    }
}

/// The placement policy selected for one compilation
#[derive(Clone, Debug, PartialEq)]
pub enum Placement<'a> {
    /// Caller-supplied topology
    Topology(&'a Topology),
    /// No topology: fall back to component anti-affinity
    DefaultAntiAffinity(DefaultAntiAffinity),
}

impl<'a> Placement<'a> {
    /// Topology wins whenever one is supplied
    pub fn select(topology: Option<&'a Topology>) -> Self {
        match topology {
            Some(topology) => Self::Topology(topology),
            None => Self::DefaultAntiAffinity(DefaultAntiAffinity::default()),
        }
    }
}

impl PlacementPolicy for Placement<'_> {
    fn apply_to(&self, template: PodTemplateSpec) -> PodTemplateSpec {
        match self {
            Self::Topology(topology) => PlacementPolicy::apply_to(*topology, template),
            Self::DefaultAntiAffinity(policy) => policy.apply_to(template),
        }
    }
}
