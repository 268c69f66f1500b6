//! Barbican worker Deployment compilation
//!
//! Compiles a `BarbicanWorker` into the `apps/v1` Deployment that runs it: a
//! log follower plus the kolla-started worker container, the config, log, CA
//! bundle and HSM volumes the worker enables, and exactly one placement policy.
//!
//! # Usage
//!
//! ```rust,ignore
//! let deployment = DeploymentCompiler::new(&worker, &config_hash)
//!     .with_labels(&worker_labels(&worker.name_any()))
//!     .with_annotations(&annotations)
//!     .with_topology(topology.as_ref())
//!     .compile();
//! ```

mod compiler;
mod pipeline;

pub use compiler::{deployment, DeploymentCompiler};
pub use pipeline::containers::{
    DUMB_INIT, LOG_CONTAINER_SUFFIX, RUN_AS_USER, SERVICE_COMMAND, SHELL, TAIL,
};
pub use pipeline::env::{CONFIG_HASH, KOLLA_CONFIG_STRATEGY, KOLLA_COPY_ALWAYS};
pub use pipeline::placement::{DefaultAntiAffinity, Placement, PlacementPolicy};
