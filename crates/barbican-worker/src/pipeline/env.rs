//! Environment variable assembly
//!
//! Variables are collected into a name-keyed map and resolved into a list
//! sorted by name, so two compilations of the same input never differ in env
//! ordering.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::EnvVar;

/// Env var telling kolla_start how to place config files
pub const KOLLA_CONFIG_STRATEGY: &str = "KOLLA_CONFIG_STRATEGY";

/// Copy config files on every container start
pub const KOLLA_COPY_ALWAYS: &str = "COPY_ALWAYS";

/// Env var carrying the rendered config hash
pub const CONFIG_HASH: &str = "CONFIG_HASH";

/// Ordered set of environment variables, last write wins per name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub(crate) fn set_value(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Resolve into container env vars, sorted by name
    pub(crate) fn resolve(&self) -> Vec<EnvVar> {
        self.0
            .iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                value_from: None,
            })
            .collect()
    }
}

/// Env shared by the log follower and the worker container
pub(crate) fn worker_env(config_hash: &str) -> EnvVars {
    let mut env = EnvVars::default();
    env.set_value(KOLLA_CONFIG_STRATEGY, KOLLA_COPY_ALWAYS)
        .set_value(CONFIG_HASH, config_hash);
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_env_is_sorted_by_name() {
        let env = worker_env("abc123").resolve();

        let names: Vec<_> = env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![CONFIG_HASH, KOLLA_CONFIG_STRATEGY]);
        assert_eq!(env[0].value.as_deref(), Some("abc123"));
        assert_eq!(env[1].value.as_deref(), Some("COPY_ALWAYS"));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = EnvVars::default();
        a.set_value("B", "2").set_value("A", "1");
        let mut b = EnvVars::default();
        b.set_value("A", "1").set_value("B", "2");

        assert_eq!(a.resolve(), b.resolve());
    }

    #[test]
    fn later_value_replaces_earlier() {
        let mut env = EnvVars::default();
        env.set_value(CONFIG_HASH, "old").set_value(CONFIG_HASH, "new");

        let resolved = env.resolve();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value.as_deref(), Some("new"));
    }

    #[test]
    fn worker_env_is_literal_only() {
        let env = worker_env("abc123").resolve();

        assert!(env.iter().all(|e| e.value.is_some() && e.value_from.is_none()));
    }
}
