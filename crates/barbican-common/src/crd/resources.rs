//! Container resource requirements as written in the CRD

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1 as k8s;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CPU and memory quantities (Kubernetes quantity strings, e.g. "500m", "1Gi")
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceQuantity {
    /// CPU quantity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Memory quantity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl ResourceQuantity {
    fn to_k8s(&self) -> Option<BTreeMap<String, Quantity>> {
        let mut out = BTreeMap::new();
        if let Some(cpu) = &self.cpu {
            out.insert("cpu".to_string(), Quantity(cpu.clone()));
        }
        if let Some(memory) = &self.memory {
            out.insert("memory".to_string(), Quantity(memory.clone()));
        }
        (!out.is_empty()).then_some(out)
    }
}

/// Resource requests and limits applied to every container of the pod
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceRequirements {
    /// Minimum resources the scheduler reserves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceQuantity>,
    /// Hard caps enforced by the kubelet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceQuantity>,
}

impl ResourceRequirements {
    /// True when neither requests nor limits carry a quantity
    pub fn is_empty(&self) -> bool {
        self.requests.as_ref().and_then(ResourceQuantity::to_k8s).is_none()
            && self.limits.as_ref().and_then(ResourceQuantity::to_k8s).is_none()
    }
}

impl From<&ResourceRequirements> for k8s::ResourceRequirements {
    fn from(rr: &ResourceRequirements) -> Self {
        Self {
            requests: rr.requests.as_ref().and_then(ResourceQuantity::to_k8s),
            limits: rr.limits.as_ref().and_then(ResourceQuantity::to_k8s),
            ..Default::default()
        }
    }
}
