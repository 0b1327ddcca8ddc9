//! Singleton backend ensurer.
//!
//! Guarantees exactly one authorization engine instance exists, owned by
//! the unique policy root. The instance is created lazily, only once, and
//! never under a root that is being deleted. Subscribed to root creation
//! and engine deletion only, so unrelated topology changes never wake it.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::json;

use polder_core::object::{kinds, Object};

use crate::config::Settings;
use crate::error::Error;
use crate::events::{EventType, ResourceEvent};
use crate::metrics::{labels, names};
use crate::store::{CreateResult, ObjectStore};
use crate::subscription::{EventMatcher, Subscription};
use crate::topology::Topology;
use crate::workflow::Reconcile;

/// Ensures the singleton authorization engine instance exists.
pub struct BackendEnsurer {
    store: Arc<dyn ObjectStore>,
    backend_name: String,
}

impl BackendEnsurer {
    /// Creates an ensurer using the configured backend instance name.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, settings: &Settings) -> Self {
        Self {
            store,
            backend_name: settings.backend_name.clone(),
        }
    }

    /// The two event shapes this reconciler reacts to.
    #[must_use]
    pub fn subscription() -> Subscription {
        Subscription::new(vec![
            EventMatcher::new(kinds::POLICY_ROOT, EventType::Create),
            EventMatcher::new(kinds::AUTH_ENGINE, EventType::Delete),
        ])
    }

    /// Builds the desired engine instance under the given root.
    ///
    /// Cluster-wide scope and host-subset superseding are enabled; listener
    /// and OIDC server encryption start disabled and are left for other
    /// policies to enable.
    fn desired_engine(&self, root: &Object) -> Object {
        Object::new(kinds::AUTH_ENGINE, &*root.meta.namespace, &*self.backend_name)
            .owned_by(root)
            .with_spec(json!({
                "clusterWide": true,
                "supersedingHostSubsets": true,
                "listener": { "tls": { "enabled": false } },
                "oidcServer": { "tls": { "enabled": false } },
            }))
    }
}

#[async_trait]
impl Reconcile for BackendEnsurer {
    async fn reconcile(
        &self,
        _events: &[ResourceEvent],
        topology: &Topology,
        _upstream: Option<&Error>,
    ) {
        tracing::info!(status = "started", "reconciling auth engine resource");

        let roots: Vec<&Object> = topology
            .roots()
            .into_iter()
            .filter(|o| o.is_kind(kinds::POLICY_ROOT))
            .collect();

        let Some(root) = roots.first() else {
            tracing::info!(status = "skipping", "no policy root found");
            return;
        };
        if roots.len() > 1 {
            tracing::error!(
                count = roots.len(),
                status = "error",
                "multiple policy roots found, cannot select one cleanly; continuing with the first"
            );
        }

        if root.is_deleting() {
            tracing::info!(status = "skipping", "policy root marked for deletion");
            return;
        }

        let engines = topology.matching(|o| o.is_kind(kinds::AUTH_ENGINE));
        if !engines.is_empty() {
            tracing::info!(
                status = "skipping",
                "auth engine resource already exists, no need to create"
            );
            return;
        }

        let engine = self.desired_engine(root);
        tracing::info!(status = "processing", engine = %engine.object_ref(), "creating auth engine resource");
        match self.store.create(&engine).await {
            Ok(CreateResult::Created { .. }) => {
                counter!(
                    names::STORE_WRITES_TOTAL,
                    labels::RECONCILER => "backend_ensurer".to_string(),
                    labels::OUTCOME => "created".to_string(),
                )
                .increment(1);
            }
            Ok(CreateResult::AlreadyExists) => {
                tracing::info!(status = "acceptable", "already created auth engine resource");
            }
            Err(err) => {
                tracing::error!(error = %err, status = "error", "failed to create auth engine resource");
            }
        }

        tracing::info!(status = "completed", "reconciling auth engine resource");
    }
}
