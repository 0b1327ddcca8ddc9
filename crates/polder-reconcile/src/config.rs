//! Engine settings.
//!
//! Everything that used to be ambient process state (notably the operator
//! namespace) is an explicit value passed into reconciler constructors.

use serde::Deserialize;

/// Default operator namespace.
pub const DEFAULT_NAMESPACE: &str = "polder-system";
/// Fixed name of the persisted topology snapshot record.
pub const DEFAULT_SNAPSHOT_NAME: &str = "topology";
/// Fixed name of the generated authorization engine instance.
pub const DEFAULT_BACKEND_NAME: &str = "auth-engine";
/// Discovery label set on the topology snapshot record.
pub const TOPOLOGY_LABEL: &str = "polder.io/topology";

/// Settings for the reconciliation engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace the operator's own objects live in.
    pub namespace: String,
    /// Name of the topology snapshot record.
    pub snapshot_name: String,
    /// Name of the generated authorization engine instance.
    pub backend_name: String,
}

impl Settings {
    /// Settings with the given operator namespace and default names.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            snapshot_name: DEFAULT_SNAPSHOT_NAME.to_owned(),
            backend_name: DEFAULT_BACKEND_NAME.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let settings = Settings::default();
        assert_eq!(settings.namespace, "polder-system");
        assert_eq!(settings.snapshot_name, "topology");
        assert_eq!(settings.backend_name, "auth-engine");
    }

    #[test]
    fn deserializes_with_partial_overrides() {
        let settings: Settings =
            serde_json::from_str(r#"{"namespace": "custom-system"}"#).unwrap();
        assert_eq!(settings.namespace, "custom-system");
        assert_eq!(settings.snapshot_name, "topology");
    }
}
