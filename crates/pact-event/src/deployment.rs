//! Deployment descriptions passed through the governance core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-service container configuration.
///
/// Opaque to the governance core: it is produced by the agreement
/// proposal and consumed by the container subsystem. The core only
/// stores and forwards it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Raw service configuration as agreed in the proposal.
    pub config: serde_json::Value,
}

impl ServiceConfig {
    /// Wraps a raw configuration document.
    #[must_use]
    pub fn new(config: serde_json::Value) -> Self {
        Self { config }
    }
}

/// Mapping from service name to its configuration for one agreement.
pub type Deployment = BTreeMap<String, ServiceConfig>;

/// Returns the sorted service names of a deployment.
///
/// Log lines mention deployments by name only; the full configuration
/// is large and may embed secrets.
#[must_use]
pub fn service_config_names(deployment: &Deployment) -> Vec<String> {
    deployment.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_sorted() {
        let mut deployment = Deployment::new();
        deployment.insert("zeta".into(), ServiceConfig::new(json!({"image": "z"})));
        deployment.insert("alpha".into(), ServiceConfig::new(json!({"image": "a"})));

        assert_eq!(service_config_names(&deployment), vec!["alpha", "zeta"]);
    }

    #[test]
    fn config_roundtrip() {
        let config = ServiceConfig::new(json!({"image": "registry/svc:1", "ports": [80]}));
        let json = serde_json::to_string(&config).unwrap();
        let restored: ServiceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
