//! Container compilation: log follower and worker

use barbican_common::{volumes, COMPONENT_WORKER};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, ResourceRequirements, SecurityContext, VolumeMount,
};

/// Init wrapper the log follower runs under
pub const DUMB_INIT: &str = "/usr/bin/dumb-init";

/// Binary the log follower tails the log file with
pub const TAIL: &str = "/usr/bin/tail";

/// Shell the worker start command runs through
pub const SHELL: &str = "/bin/bash";

/// Entry point of the kolla-based worker image
pub const SERVICE_COMMAND: &str = "/usr/local/bin/kolla_start";

/// UID both containers run as.
///
/// The kolla images expect to start as root and drop privileges themselves.
pub const RUN_AS_USER: i64 = 0;

/// Suffix appended to the instance name for the log follower container
pub const LOG_CONTAINER_SUFFIX: &str = "-log";

/// Inputs shared by both containers
pub(crate) struct ContainerBase<'a> {
    pub(crate) image: &'a str,
    pub(crate) resources: Option<ResourceRequirements>,
    pub(crate) env: Vec<EnvVar>,
}

fn security_context() -> SecurityContext {
    SecurityContext {
        run_as_user: Some(RUN_AS_USER),
        ..Default::default()
    }
}

/// Sidecar that streams `<name>.log` to stdout; mounts only the log volume
pub(crate) fn log_container(instance_name: &str, base: &ContainerBase<'_>) -> Container {
    Container {
        name: format!("{}{}", instance_name, LOG_CONTAINER_SUFFIX),
        image: Some(base.image.to_string()),
        command: Some(vec![DUMB_INIT.to_string()]),
        args: Some(vec![
            "--single-child".to_string(),
            "--".to_string(),
            TAIL.to_string(),
            "-n+1".to_string(),
            "-F".to_string(),
            volumes::log_file_path(instance_name),
        ]),
        env: Some(base.env.clone()),
        resources: base.resources.clone(),
        volume_mounts: Some(vec![volumes::log_volume_mount()]),
        security_context: Some(security_context()),
        ..Default::default()
    }
}

/// Worker container running kolla_start with every compiled mount
pub(crate) fn worker_container(base: &ContainerBase<'_>, mounts: Vec<VolumeMount>) -> Container {
    Container {
        name: COMPONENT_WORKER.to_string(),
        image: Some(base.image.to_string()),
        command: Some(vec![SHELL.to_string()]),
        args: Some(vec!["-c".to_string(), SERVICE_COMMAND.to_string()]),
        env: Some(base.env.clone()),
        resources: base.resources.clone(),
        volume_mounts: Some(mounts),
        security_context: Some(security_context()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barbican_common::volumes::LOG_VOLUME;

    fn base() -> ContainerBase<'static> {
        ContainerBase {
            image: "worker:1",
            resources: None,
            env: vec![EnvVar {
                name: "CONFIG_HASH".to_string(),
                value: Some("h1".to_string()),
                value_from: None,
            }],
        }
    }

    #[test]
    fn log_container_tails_instance_log() {
        let c = log_container("barbican-worker", &base());

        assert_eq!(c.name, "barbican-worker-log");
        assert_eq!(c.command, Some(vec!["/usr/bin/dumb-init".to_string()]));
        let args = c.args.expect("args should be set");
        assert_eq!(
            args,
            vec![
                "--single-child",
                "--",
                "/usr/bin/tail",
                "-n+1",
                "-F",
                "/var/log/barbican/barbican-worker.log"
            ]
        );
    }

    #[test]
    fn log_container_mounts_only_logs() {
        let c = log_container("barbican-worker", &base());

        let mounts = c.volume_mounts.expect("mounts should be set");
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].name, LOG_VOLUME);
    }

    #[test]
    fn worker_container_runs_kolla_start_through_bash() {
        let c = worker_container(&base(), vec![]);

        assert_eq!(c.name, "barbican-worker");
        assert_eq!(c.command, Some(vec!["/bin/bash".to_string()]));
        assert_eq!(
            c.args,
            Some(vec!["-c".to_string(), "/usr/local/bin/kolla_start".to_string()])
        );
        assert_eq!(c.image.as_deref(), Some("worker:1"));
    }

    #[test]
    fn both_containers_run_as_root() {
        let log = log_container("w", &base());
        let worker = worker_container(&base(), vec![]);

        for c in [log, worker] {
            let sc = c.security_context.expect("security context should be set");
            assert_eq!(sc.run_as_user, Some(0));
        }
    }
}
