//! DeploymentCompiler: assembles the worker Deployment
//!
//! Runs the pipeline stages in a fixed order: env -> volumes -> containers ->
//! pod template -> placement. Compilation is pure and cannot fail; optional
//! features that are not fully configured are left out.

use std::collections::BTreeMap;

use barbican_common::crd::{BarbicanWorker, Topology};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::ResourceExt;
use tracing::debug;

use crate::pipeline::containers::{self, ContainerBase};
use crate::pipeline::placement::{Placement, PlacementPolicy};
use crate::pipeline::{env, volumes};

/// Compiles a `BarbicanWorker` into a Kubernetes Deployment.
///
/// ```rust,ignore
/// let deployment = DeploymentCompiler::new(&worker, &config_hash)
///     .with_labels(&labels)
///     .with_annotations(&annotations)
///     .with_topology(topology.as_ref())
///     .compile();
/// ```
pub struct DeploymentCompiler<'a> {
    instance: &'a BarbicanWorker,
    config_hash: &'a str,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    topology: Option<&'a Topology>,
}

impl<'a> DeploymentCompiler<'a> {
    /// Create a compiler for `instance` whose rendered config hashes to `config_hash`
    pub fn new(instance: &'a BarbicanWorker, config_hash: &'a str) -> Self {
        Self {
            instance,
            config_hash,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            topology: None,
        }
    }

    /// Labels for the Deployment, its selector and the pod template
    pub fn with_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        self.labels = labels.clone();
        self
    }

    /// Annotations for the pod template
    pub fn with_annotations(mut self, annotations: &BTreeMap<String, String>) -> Self {
        self.annotations = annotations.clone();
        self
    }

    /// Topology that owns pod placement; `None` selects the default anti-affinity
    pub fn with_topology(mut self, topology: Option<&'a Topology>) -> Self {
        self.topology = topology;
        self
    }

    /// Build the Deployment
    pub fn compile(self) -> Deployment {
        let name = self.instance.name_any();
        let spec = &self.instance.spec;

        // 1. Env shared by both containers
        let env = env::worker_env(self.config_hash).resolve();

        // 2. Volumes and worker mounts
        let compiled_volumes = volumes::compile(self.instance);

        // 3. Containers
        let resources = (!spec.resources.is_empty())
            .then(|| ResourceRequirements::from(&spec.resources));
        let base = ContainerBase {
            image: &spec.container_image,
            resources,
            env,
        };
        let pod_containers = vec![
            containers::log_container(&name, &base),
            containers::worker_container(&base, compiled_volumes.mounts),
        ];

        // 4. Pod template
        let template = PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: non_empty(&self.labels),
                annotations: non_empty(&self.annotations),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                service_account_name: (!spec.service_account.is_empty())
                    .then(|| spec.service_account.clone()),
                containers: pod_containers,
                volumes: Some(compiled_volumes.volumes),
                node_selector: spec.node_selector.clone(),
                ..Default::default()
            }),
        };

        // 5. Placement: topology if supplied, default anti-affinity otherwise
        let placement = Placement::select(self.topology);
        let template = placement.apply_to(template);

        debug!(
            worker = %name,
            replicas = ?spec.replicas,
            volumes = template
                .spec
                .as_ref()
                .and_then(|s| s.volumes.as_ref())
                .map_or(0, Vec::len),
            topology = self.topology.is_some(),
            "compiled worker deployment"
        );

        Deployment {
            metadata: ObjectMeta {
                name: self.instance.metadata.name.clone(),
                namespace: self.instance.metadata.namespace.clone(),
                labels: non_empty(&self.labels),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: spec.replicas,
                selector: LabelSelector {
                    match_labels: Some(self.labels),
                    ..Default::default()
                },
                template,
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// Compile the worker Deployment in one call.
///
/// Equivalent to the [`DeploymentCompiler`] builder with every input set.
pub fn deployment(
    instance: &BarbicanWorker,
    config_hash: &str,
    labels: &BTreeMap<String, String>,
    annotations: &BTreeMap<String, String>,
    topology: Option<&Topology>,
) -> Deployment {
    DeploymentCompiler::new(instance, config_hash)
        .with_labels(labels)
        .with_annotations(annotations)
        .with_topology(topology)
        .compile()
}

fn non_empty(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}
