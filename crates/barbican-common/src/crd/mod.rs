//! Custom Resource Definitions consumed by the worker compiler

mod resources;
mod topology;
mod worker;

pub use resources::{ResourceQuantity, ResourceRequirements};
pub use topology::{Topology, TopologySpec};
pub use worker::{
    BarbicanWorker, BarbicanWorkerSpec, Pkcs11Spec, SecretStore, TlsSpec, TopologyRef,
    DEFAULT_HSM_CLIENT_DATA_PATH,
};
