//! Default pod anti-affinity for Barbican components

use k8s_openapi::api::core::v1::{
    Affinity, PodAffinityTerm, PodAntiAffinity, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};

use crate::LABEL_COMPONENT;

/// Node-level topology key
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

/// Weight of the preferred anti-affinity term (maximum allowed)
pub const ANTI_AFFINITY_WEIGHT: i32 = 100;

/// Prefer spreading pods whose `selector_key` is one of `values` across
/// `topology_key` domains.
///
/// The term is a preference: when there are not enough nodes the scheduler
/// still co-locates pods.
pub fn distribute_pods(selector_key: &str, values: &[&str], topology_key: &str) -> Affinity {
    Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![
                WeightedPodAffinityTerm {
                    weight: ANTI_AFFINITY_WEIGHT,
                    pod_affinity_term: PodAffinityTerm {
                        label_selector: Some(LabelSelector {
                            match_expressions: Some(vec![LabelSelectorRequirement {
                                key: selector_key.to_string(),
                                operator: "In".to_string(),
                                values: Some(values.iter().map(|v| v.to_string()).collect()),
                            }]),
                            ..Default::default()
                        }),
                        topology_key: topology_key.to_string(),
                        ..Default::default()
                    },
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Anti-affinity spreading pods of one component across nodes
pub fn component_pod_affinity(component: &str) -> Affinity {
    distribute_pods(LABEL_COMPONENT, &[component], HOSTNAME_TOPOLOGY_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::COMPONENT_WORKER;

    #[test]
    fn component_affinity_is_preferred_not_required() {
        let affinity = component_pod_affinity(COMPONENT_WORKER);

        let anti = affinity.pod_anti_affinity.expect("anti-affinity should be set");
        assert!(anti
            .required_during_scheduling_ignored_during_execution
            .is_none());
        let terms = anti
            .preferred_during_scheduling_ignored_during_execution
            .expect("preferred terms should be set");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].weight, 100);
        assert_eq!(terms[0].pod_affinity_term.topology_key, HOSTNAME_TOPOLOGY_KEY);
    }

    #[test]
    fn component_affinity_selects_on_component_label() {
        let affinity = component_pod_affinity(COMPONENT_WORKER);

        let expr = affinity
            .pod_anti_affinity
            .and_then(|a| a.preferred_during_scheduling_ignored_during_execution)
            .and_then(|t| t.into_iter().next())
            .and_then(|t| t.pod_affinity_term.label_selector)
            .and_then(|s| s.match_expressions)
            .and_then(|e| e.into_iter().next())
            .expect("match expression should be set");
        assert_eq!(expr.key, "component");
        assert_eq!(expr.operator, "In");
        assert_eq!(expr.values, Some(vec!["barbican-worker".to_string()]));
    }

    #[test]
    fn no_pod_affinity_or_node_affinity_is_set() {
        let affinity = distribute_pods("app", &["a", "b"], "topology.kubernetes.io/zone");

        assert!(affinity.pod_affinity.is_none());
        assert!(affinity.node_affinity.is_none());
    }
}
