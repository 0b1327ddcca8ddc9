//! Reconcilers composing the control loop.
//!
//! Each reconciler is a stateless step over `(events, topology, upstream
//! error)`. They share two rules:
//!
//! 1. **Idempotent**: Re-running a step against unchanged state produces
//!    no store writes
//! 2. **Contained failures**: Steps log their own errors; only the status
//!    reconciler, which runs outside the workflow tree, surfaces hard
//!    failures to its caller

pub mod backend_ensurer;
pub mod event_logger;
pub mod policy_status;
pub mod spec_merge;
pub mod topology_snapshot;

use std::sync::Arc;

pub use backend_ensurer::BackendEnsurer;
pub use event_logger::EventLogger;
pub use policy_status::{
    auth_scheme_ref, calculate_status, PolicyStatusReconciler, StatusOutcome,
    AVAILABLE_CONDITION, RECONCILIATION_ERROR_REASON, SCHEME_NOT_READY_REASON,
};
pub use spec_merge::{merge_limit_engine, MANAGED_FIELDS};
pub use topology_snapshot::TopologySnapshotReconciler;

use crate::config::Settings;
use crate::store::ObjectStore;
use crate::workflow::{Step, Subscribed, Workflow};

/// Builds the shipped reconciler composition.
///
/// The outer workflow's precondition is itself a workflow: log every
/// event, then persist the topology snapshot. Its only task is the
/// backend ensurer, gated on its subscription. In short: always log, then
/// always persist the topology, then, only for matching events, ensure
/// the backend instance.
#[must_use]
pub fn build_reconciler(store: Arc<dyn ObjectStore>, settings: &Settings) -> Step {
    let logging_and_snapshot = Workflow::new(vec![Step::leaf(TopologySnapshotReconciler::new(
        Arc::clone(&store),
        settings,
    ))])
    .with_precondition(Step::leaf(EventLogger::new()));

    let workflow = Workflow::new(vec![Step::leaf(Subscribed::new(
        BackendEnsurer::subscription(),
        BackendEnsurer::new(store, settings),
    ))])
    .with_precondition(Step::workflow(logging_and_snapshot));

    Step::workflow(workflow)
}
