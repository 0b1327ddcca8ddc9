//! Cross-cutting event recorder.
//!
//! Logs every incoming change event before any other workflow step runs.
//! Purely observational: reads nothing from the store, writes nothing, and
//! never raises. An upstream error is logged alongside the events but not
//! suppressed; sibling steps still receive it.

use async_trait::async_trait;
use metrics::counter;
use tracing::Level;

use crate::diff;
use crate::error::Error;
use crate::events::{EventType, ResourceEvent};
use crate::metrics::{labels, names};
use crate::topology::Topology;
use crate::workflow::Reconcile;

/// Logs one structured line per change event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogger;

impl EventLogger {
    /// Creates an event logger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Reconcile for EventLogger {
    async fn reconcile(
        &self,
        events: &[ResourceEvent],
        _topology: &Topology,
        upstream: Option<&Error>,
    ) {
        for event in events {
            let object = event.object();

            if event.event_type == EventType::Update && tracing::enabled!(Level::DEBUG) {
                tracing::info!(
                    r#type = %event.event_type,
                    kind = %object.kind,
                    namespace = %object.meta.namespace,
                    name = %object.meta.name,
                    diff = %update_diff(event),
                    "new event"
                );
            } else {
                tracing::info!(
                    r#type = %event.event_type,
                    kind = %object.kind,
                    namespace = %object.meta.namespace,
                    name = %object.meta.name,
                    "new event"
                );
            }

            if let Some(err) = upstream {
                tracing::error!(error = %err, "error passed to reconcile");
            }
        }

        let count = u64::try_from(events.len()).unwrap_or(0);
        counter!(
            names::RECONCILE_PASSES_TOTAL,
            labels::RECONCILER => "event_logger".to_string(),
        )
        .increment(1);
        counter!(names::EVENTS_LOGGED_TOTAL).increment(count);
    }
}

/// Structural diff between the old and new side of an update event.
fn update_diff(event: &ResourceEvent) -> String {
    let (Some(old), Some(new)) = (&event.old_object, &event.new_object) else {
        return String::new();
    };
    match (serde_json::to_value(old), serde_json::to_value(new)) {
        (Ok(old_value), Ok(new_value)) => diff::render(&diff::diff_values(&old_value, &new_value)),
        (Err(err), _) | (_, Err(err)) => format!("<diff unavailable: {err}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polder_core::object::{kinds, Object};
    use serde_json::json;

    #[tokio::test]
    async fn never_raises_even_with_upstream_error() {
        let logger = EventLogger::new();
        let events = vec![
            ResourceEvent::create(Object::new(kinds::POLICY_ROOT, "ns", "polder")),
            ResourceEvent::delete(Object::new(kinds::AUTH_ENGINE, "ns", "auth-engine")),
        ];

        let err = Error::storage("upstream failure");
        logger
            .reconcile(&events, &Topology::default(), Some(&err))
            .await;
    }

    #[test]
    fn update_diff_shows_changed_paths() {
        let old = Object::new(kinds::GATEWAY, "ns", "gw").with_spec(json!({"listeners": 1}));
        let new = old.clone().with_spec(json!({"listeners": 2}));
        let event = ResourceEvent::update(old, new);

        let rendered = update_diff(&event);
        assert!(rendered.contains("spec.listeners"));
        assert!(rendered.contains("1 => 2"));
    }

    #[test]
    fn update_diff_empty_for_non_update_shapes() {
        let event = ResourceEvent::create(Object::new(kinds::GATEWAY, "ns", "gw"));
        assert_eq!(update_diff(&event), "");
    }
}
