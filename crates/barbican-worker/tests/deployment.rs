//! End-to-end compilation of worker manifests into Deployments

use std::collections::BTreeMap;

use barbican_common::crd::{BarbicanWorker, Topology};
use barbican_common::hash::config_hash;
use barbican_common::tls::{CA_BUNDLE_MOUNT_PATH, CA_BUNDLE_VOLUME};
use barbican_common::volumes::{CONFIG_DATA_VOLUME, HSM_CLIENT_DATA_VOLUME, LOG_VOLUME};
use barbican_common::{worker_labels, yaml};
use barbican_worker::{deployment, DeploymentCompiler, CONFIG_HASH, KOLLA_COPY_ALWAYS};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PodSpec;
use kube::ResourceExt;
use rstest::rstest;

const CA_BUNDLE_WORKER: &str = include_str!("fixtures/worker-ca-bundle.yaml");
const PKCS11_WORKER: &str = include_str!("fixtures/worker-pkcs11.yaml");
const ZONE_TOPOLOGY: &str = include_str!("fixtures/topology-zones.yaml");

fn load_worker(manifest: &str) -> BarbicanWorker {
    yaml::from_yaml(manifest).expect("worker fixture should parse")
}

fn rendered_hash() -> String {
    config_hash(&BTreeMap::from([
        ("00-default.conf".to_string(), "[DEFAULT]\n".to_string()),
        ("barbican-worker-config.json".to_string(), "{}".to_string()),
    ]))
}

fn compile(worker: &BarbicanWorker, topology: Option<&Topology>) -> Deployment {
    DeploymentCompiler::new(worker, &rendered_hash())
        .with_labels(&worker_labels(&worker.name_any()))
        .with_topology(topology)
        .compile()
}

fn pod(d: &Deployment) -> &PodSpec {
    d.spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .expect("pod spec should be set")
}

fn volume_names(d: &Deployment) -> Vec<&str> {
    pod(d)
        .volumes
        .iter()
        .flatten()
        .map(|v| v.name.as_str())
        .collect()
}

#[test]
fn ca_bundle_worker_compiles_to_three_volumes() {
    let worker = load_worker(CA_BUNDLE_WORKER);
    worker.spec.validate(&worker.name_any()).expect("fixture is valid");

    let d = compile(&worker, None);

    assert_eq!(
        volume_names(&d),
        vec![CONFIG_DATA_VOLUME, LOG_VOLUME, CA_BUNDLE_VOLUME]
    );
    assert_eq!(d.spec.as_ref().and_then(|s| s.replicas), Some(2));
    assert!(pod(&d).node_selector.is_none());
    let anti = pod(&d)
        .affinity
        .as_ref()
        .and_then(|a| a.pod_anti_affinity.as_ref())
        .expect("default anti-affinity should be applied");
    assert_eq!(
        anti.preferred_during_scheduling_ignored_during_execution
            .as_ref()
            .map(|terms| terms[0].weight),
        Some(100)
    );

    let worker_container = &pod(&d).containers[1];
    assert!(worker_container
        .volume_mounts
        .iter()
        .flatten()
        .any(|m| m.mount_path == CA_BUNDLE_MOUNT_PATH));
}

#[test]
fn pkcs11_worker_with_topology() {
    let worker = load_worker(PKCS11_WORKER);
    let topology: Topology = yaml::from_yaml(ZONE_TOPOLOGY).expect("topology fixture should parse");
    assert_eq!(
        worker.spec.topology_ref.as_ref().map(|r| r.name.as_str()),
        Some(topology.name_any().as_str())
    );

    let d = compile(&worker, Some(&topology));

    assert_eq!(
        volume_names(&d),
        vec![
            "barbican-extra-conf",
            CONFIG_DATA_VOLUME,
            LOG_VOLUME,
            CA_BUNDLE_VOLUME,
            HSM_CLIENT_DATA_VOLUME
        ]
    );
    assert!(pod(&d).affinity.is_none(), "topology owns placement");
    assert_eq!(
        pod(&d).topology_spread_constraints.as_ref().map(Vec::len),
        Some(1)
    );
    assert_eq!(
        pod(&d)
            .node_selector
            .as_ref()
            .map(|s| s.contains_key("node-role.kubernetes.io/worker")),
        Some(true)
    );

    let resources = pod(&d).containers[1]
        .resources
        .as_ref()
        .expect("resources should be set");
    assert!(resources.requests.as_ref().is_some_and(|r| r.contains_key("cpu")));
    assert!(resources.limits.as_ref().is_some_and(|l| l.contains_key("memory")));
}

#[rstest]
#[case::ca_bundle(CA_BUNDLE_WORKER)]
#[case::pkcs11(PKCS11_WORKER)]
fn both_containers_receive_the_config_hash(#[case] manifest: &str) {
    let worker = load_worker(manifest);

    let d = compile(&worker, None);

    let expected = rendered_hash();
    for c in &pod(&d).containers {
        let env: BTreeMap<_, _> = c
            .env
            .iter()
            .flatten()
            .map(|e| (e.name.as_str(), e.value.as_deref()))
            .collect();
        assert_eq!(env.get(CONFIG_HASH), Some(&Some(expected.as_str())));
        assert_eq!(
            env.get("KOLLA_CONFIG_STRATEGY"),
            Some(&Some(KOLLA_COPY_ALWAYS))
        );
    }
}

#[rstest]
#[case::ca_bundle(CA_BUNDLE_WORKER)]
#[case::pkcs11(PKCS11_WORKER)]
fn compilation_is_deterministic(#[case] manifest: &str) {
    let worker = load_worker(manifest);
    let labels = worker_labels(&worker.name_any());
    let annotations = BTreeMap::new();

    let first = deployment(&worker, "abc", &labels, &annotations, None);
    let second = deployment(&worker, "abc", &labels, &annotations, None);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("deployment serializes"),
        serde_json::to_string(&second).expect("deployment serializes")
    );
}

#[test]
fn deployment_serializes_as_apps_v1() {
    let worker = load_worker(CA_BUNDLE_WORKER);

    let value = serde_json::to_value(compile(&worker, None)).expect("deployment serializes");

    assert_eq!(value["apiVersion"], "apps/v1");
    assert_eq!(value["kind"], "Deployment");
    assert_eq!(value["metadata"]["name"], "barbican-worker");
    assert_eq!(
        value["spec"]["template"]["spec"]["containers"][0]["securityContext"]["runAsUser"],
        0
    );
}
