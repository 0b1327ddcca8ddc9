//! # polder-reconcile
//!
//! Reconciliation workflow engine for the Polder policy control plane.
//!
//! This crate keeps a set of dependent backend resources synchronized with
//! the current shape of the configuration topology:
//!
//! - **Workflow composition**: Recursive precondition/task trees of
//!   independently-failing reconcile steps
//! - **Event subscriptions**: Pure kind/event-type matching, independent of
//!   the dispatcher that delivers event batches
//! - **Idempotent writes**: Every store mutation is safe under
//!   already-exists races and optimistic-concurrency conflicts
//! - **Status conditions**: Availability computed with change detection so
//!   unchanged state never produces a write
//!
//! ## Guarantees
//!
//! - **Re-runnable**: No step depends on uncommitted local state; an
//!   aborted pass is simply retried on the next triggering event
//! - **Degraded-mode continuation**: Cardinality anomalies (multiple root
//!   owners, multiple snapshot records) are logged, never fatal
//! - **Independent fault domains**: A failure inside one workflow task
//!   never prevents sibling tasks from running
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use polder_reconcile::config::Settings;
//! use polder_reconcile::reconcilers::build_reconciler;
//! use polder_reconcile::store::memory::InMemoryStore;
//! use polder_reconcile::topology::Topology;
//! use polder_reconcile::workflow::Reconcile;
//!
//! # async fn run() {
//! let store = Arc::new(InMemoryStore::new());
//! let reconciler = build_reconciler(store, &Settings::default());
//!
//! // The dispatcher delivers an event batch and the current topology.
//! let topology = Topology::new(vec![]);
//! reconciler.reconcile(&[], &topology, None).await;
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod diff;
pub mod error;
pub mod events;
pub mod metrics;
pub mod reconcilers;
pub mod store;
pub mod subscription;
pub mod topology;
pub mod workflow;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventType, ResourceEvent};
    pub use crate::reconcilers::{
        build_reconciler, calculate_status, merge_limit_engine, BackendEnsurer, EventLogger,
        PolicyStatusReconciler, StatusOutcome, TopologySnapshotReconciler,
    };
    pub use crate::store::memory::InMemoryStore;
    pub use crate::store::{CreateResult, ObjectStore, WriteResult};
    pub use crate::subscription::{EventMatcher, Subscription};
    pub use crate::topology::Topology;
    pub use crate::workflow::{Reconcile, Step, Subscribed, Workflow};
}
