//! Topology snapshot synchronizer.
//!
//! Persists the serialized topology into a well-known config record, once
//! per pass and idempotently: an unchanged topology produces no write at
//! all. Failures at this layer are logged and contained; they never block
//! later workflow steps.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::json;

use polder_core::object::{kinds, Object};

use crate::config::{Settings, TOPOLOGY_LABEL};
use crate::error::Error;
use crate::events::ResourceEvent;
use crate::metrics::{labels, names, TimingGuard};
use crate::store::{CreateResult, ObjectStore, WriteResult};
use crate::topology::Topology;
use crate::workflow::Reconcile;

/// Key of the serialized graph within the record's spec document.
const SNAPSHOT_FIELD: &str = "topology";

/// Persists the current topology into a config record.
pub struct TopologySnapshotReconciler {
    store: Arc<dyn ObjectStore>,
    namespace: String,
    snapshot_name: String,
}

impl TopologySnapshotReconciler {
    /// Creates a snapshot reconciler writing into the operator namespace.
    ///
    /// # Panics
    ///
    /// Panics if the configured namespace is blank; running without an
    /// explicit namespace would scatter snapshot records.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, settings: &Settings) -> Self {
        assert!(
            !settings.namespace.trim().is_empty(),
            "operator namespace must not be blank"
        );
        Self {
            store,
            namespace: settings.namespace.clone(),
            snapshot_name: settings.snapshot_name.clone(),
        }
    }

    /// Builds the desired snapshot record for the given topology.
    fn desired_record(&self, topology: &Topology) -> Object {
        Object::new(kinds::CONFIG_RECORD, &*self.namespace, &*self.snapshot_name)
            .with_label(TOPOLOGY_LABEL, "true")
            .with_spec(json!({ SNAPSHOT_FIELD: topology.to_dot() }))
    }

    async fn create_record(&self, desired: &Object) {
        match self.store.create(desired).await {
            Ok(CreateResult::Created { .. }) => {
                tracing::debug!(record = %desired.object_ref(), "created topology snapshot record");
                counter!(
                    names::STORE_WRITES_TOTAL,
                    labels::RECONCILER => "topology_snapshot".to_string(),
                    labels::OUTCOME => "created".to_string(),
                )
                .increment(1);
            }
            Ok(CreateResult::AlreadyExists) => {
                // Happens at startup when the create event for the record
                // has not been folded into the topology yet.
                tracing::info!(
                    record = %desired.object_ref(),
                    "topology snapshot record already created, must not be in topology yet"
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create topology snapshot record");
            }
        }
    }

    async fn update_record(&self, existing: &Object, desired: &Object) {
        let mut record = desired.clone();
        record.meta.uid = existing.meta.uid;
        record.meta.resource_version = existing.meta.resource_version;

        match self.store.update(&record).await {
            Ok(WriteResult::Applied { .. }) => {
                tracing::debug!(record = %record.object_ref(), "updated topology snapshot record");
                counter!(
                    names::STORE_WRITES_TOTAL,
                    labels::RECONCILER => "topology_snapshot".to_string(),
                    labels::OUTCOME => "updated".to_string(),
                )
                .increment(1);
            }
            Ok(WriteResult::Conflict { current }) => {
                // Someone else wrote first; the next pass sees their version.
                tracing::info!(
                    record = %record.object_ref(),
                    current,
                    "topology snapshot record changed concurrently, retrying on next event"
                );
            }
            Ok(WriteResult::NotFound) => {
                tracing::warn!(
                    record = %record.object_ref(),
                    "topology snapshot record vanished between read and write"
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to update topology snapshot record");
            }
        }
    }
}

#[async_trait]
impl Reconcile for TopologySnapshotReconciler {
    async fn reconcile(
        &self,
        _events: &[ResourceEvent],
        topology: &Topology,
        _upstream: Option<&Error>,
    ) {
        let _guard = TimingGuard::new(|duration| {
            histogram!(
                names::RECONCILE_DURATION_SECONDS,
                labels::RECONCILER => "topology_snapshot".to_string(),
            )
            .record(duration.as_secs_f64());
        });

        let desired = self.desired_record(topology);

        let existing = topology.matching(|o| {
            o.is_kind(kinds::CONFIG_RECORD)
                && o.meta.name == self.snapshot_name
                && o.meta.namespace == self.namespace
        });

        if existing.is_empty() {
            self.create_record(&desired).await;
            return;
        }

        if existing.len() > 1 {
            tracing::warn!(
                count = existing.len(),
                "multiple topology snapshot records found, continuing with the first"
            );
        }
        let current = existing[0];

        let stored_text = current
            .spec
            .get(SNAPSHOT_FIELD)
            .and_then(serde_json::Value::as_str);
        let desired_text = desired
            .spec
            .get(SNAPSHOT_FIELD)
            .and_then(serde_json::Value::as_str);

        if stored_text != desired_text {
            self.update_record(current, &desired).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use polder_core::object::ObjectRef;

    fn reconciler(store: &Arc<InMemoryStore>) -> TopologySnapshotReconciler {
        TopologySnapshotReconciler::new(
            Arc::clone(store) as Arc<dyn ObjectStore>,
            &Settings::default(),
        )
    }

    fn record_ref() -> ObjectRef {
        ObjectRef::new(kinds::CONFIG_RECORD, "polder-system", "topology")
    }

    fn gateway() -> Object {
        Object::new(kinds::GATEWAY, "default", "public")
    }

    #[tokio::test]
    async fn creates_record_when_absent() {
        let store = Arc::new(InMemoryStore::new());
        let topology = Topology::new(vec![gateway()]);

        reconciler(&store).reconcile(&[], &topology, None).await;

        let stored = store.get(&record_ref()).await.unwrap().unwrap();
        assert_eq!(
            stored.meta.labels.get(TOPOLOGY_LABEL).map(String::as_str),
            Some("true")
        );
        let text = stored.spec["topology"].as_str().unwrap();
        assert!(text.contains("Gateway/default/public"));
    }

    #[tokio::test]
    async fn unchanged_topology_produces_no_write() {
        let store = Arc::new(InMemoryStore::new());
        let sync = reconciler(&store);

        let first_pass = Topology::new(vec![gateway()]);
        sync.reconcile(&[], &first_pass, None).await;
        let record = store.get(&record_ref()).await.unwrap().unwrap();
        let version_after_create = record.meta.resource_version;
        let writes_after_create = store.write_count();

        // Second pass: same topology, now including the record itself.
        let second_pass = Topology::new(vec![gateway(), record]);
        // The record's own presence changes the serialized graph once.
        sync.reconcile(&[], &second_pass, None).await;
        let record = store.get(&record_ref()).await.unwrap().unwrap();
        assert!(record.meta.resource_version > version_after_create);

        // Third pass: topology identical to what was just persisted... but
        // the stored text was computed from the second pass topology, so
        // rebuild with the refreshed record and run twice to settle.
        let third_pass = Topology::new(vec![gateway(), record.clone()]);
        sync.reconcile(&[], &third_pass, None).await;
        let settled = store.get(&record_ref()).await.unwrap().unwrap();
        let settled_topology = Topology::new(vec![gateway(), settled.clone()]);

        let writes_before = store.write_count();
        sync.reconcile(&[], &settled_topology, None).await;
        sync.reconcile(&[], &settled_topology, None).await;

        assert_eq!(store.write_count(), writes_before);
        assert!(writes_before >= writes_after_create);
        let unchanged = store.get(&record_ref()).await.unwrap().unwrap();
        assert_eq!(
            unchanged.meta.resource_version,
            settled.meta.resource_version
        );
    }

    #[tokio::test]
    async fn updates_record_when_topology_changed() {
        let store = Arc::new(InMemoryStore::new());
        let sync = reconciler(&store);

        sync.reconcile(&[], &Topology::new(vec![gateway()]), None)
            .await;
        let record = store.get(&record_ref()).await.unwrap().unwrap();

        let grown = Topology::new(vec![
            gateway(),
            Object::new(kinds::ROUTE, "default", "checkout"),
            record,
        ]);
        sync.reconcile(&[], &grown, None).await;

        let stored = store.get(&record_ref()).await.unwrap().unwrap();
        let text = stored.spec["topology"].as_str().unwrap();
        assert!(text.contains("Route/default/checkout"));
    }

    #[tokio::test]
    async fn already_exists_race_is_contained() {
        let store = Arc::new(InMemoryStore::new());
        // The record exists in the store but not yet in the topology.
        store
            .seed(
                Object::new(kinds::CONFIG_RECORD, "polder-system", "topology")
                    .with_spec(json!({"topology": "stale"})),
            )
            .unwrap();

        let sync = reconciler(&store);
        sync.reconcile(&[], &Topology::new(vec![gateway()]), None)
            .await;

        // No panic, no overwrite: the record still holds the racer's text.
        let stored = store.get(&record_ref()).await.unwrap().unwrap();
        assert_eq!(stored.spec["topology"], "stale");
    }

    #[tokio::test]
    async fn stale_version_conflict_is_contained() {
        let store = Arc::new(InMemoryStore::new());
        let sync = reconciler(&store);

        sync.reconcile(&[], &Topology::new(vec![gateway()]), None)
            .await;
        let mut stale_record = store.get(&record_ref()).await.unwrap().unwrap();

        // Another writer bumps the record after our topology snapshot was taken.
        let mut racer = store.get(&record_ref()).await.unwrap().unwrap();
        racer.spec = json!({"topology": "racer wins"});
        store.update(&racer).await.unwrap();

        // Our pass still sees the stale record in its topology.
        stale_record.spec = json!({"topology": "stale view"});
        let topology = Topology::new(vec![gateway(), stale_record]);
        sync.reconcile(&[], &topology, None).await;

        let stored = store.get(&record_ref()).await.unwrap().unwrap();
        assert_eq!(stored.spec["topology"], "racer wins");
    }

    #[test]
    #[should_panic(expected = "namespace must not be blank")]
    fn blank_namespace_is_a_contract_violation() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemoryStore::new());
        let _ = TopologySnapshotReconciler::new(store, &Settings::new("  "));
    }
}
