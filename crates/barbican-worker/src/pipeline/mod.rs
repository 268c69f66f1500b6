//! Internal compilation pipeline stages

pub(crate) mod containers;
pub(crate) mod env;
pub(crate) mod placement;
pub(crate) mod volumes;
