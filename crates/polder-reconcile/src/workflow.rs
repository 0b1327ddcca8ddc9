//! Workflow composition for reconcile steps.
//!
//! A workflow is a state-free composition primitive: an optional
//! precondition step followed by an ordered list of task steps. Steps are a
//! recursive tagged union, so a workflow can itself serve as another
//! workflow's precondition, nesting to arbitrary depth.
//!
//! ## Fault domains
//!
//! Reconcilers do not return errors to the orchestrator. Any failure a step
//! encounters is its own responsibility to log and contain, and every
//! sibling task still runs. The `upstream` error argument exists so an
//! error raised *outside* the workflow (by the dispatcher) can be observed
//! by every step without being suppressed for its siblings.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::events::ResourceEvent;
use crate::subscription::Subscription;
use crate::topology::Topology;

/// A reconcile step.
///
/// Implementations log and contain their own failures; the orchestrator
/// never short-circuits on a step's behalf.
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Runs one reconcile pass over an event batch and topology snapshot.
    async fn reconcile(
        &self,
        events: &[ResourceEvent],
        topology: &Topology,
        upstream: Option<&Error>,
    );
}

/// A node in a workflow tree: a leaf reconciler or a nested workflow.
pub enum Step {
    /// A single reconciler.
    Leaf(Arc<dyn Reconcile>),
    /// A nested precondition/task composition.
    Workflow(Workflow),
}

impl Step {
    /// Wraps a reconciler as a leaf step.
    #[must_use]
    pub fn leaf(reconciler: impl Reconcile + 'static) -> Self {
        Self::Leaf(Arc::new(reconciler))
    }

    /// Wraps a workflow as a step.
    #[must_use]
    pub fn workflow(workflow: Workflow) -> Self {
        Self::Workflow(workflow)
    }
}

#[async_trait]
impl Reconcile for Step {
    async fn reconcile(
        &self,
        events: &[ResourceEvent],
        topology: &Topology,
        upstream: Option<&Error>,
    ) {
        match self {
            Self::Leaf(reconciler) => reconciler.reconcile(events, topology, upstream).await,
            Self::Workflow(workflow) => workflow.reconcile(events, topology, upstream).await,
        }
    }
}

/// An optional precondition followed by an ordered list of tasks.
#[derive(Default)]
pub struct Workflow {
    /// Step that fully completes before any task starts.
    pub precondition: Option<Box<Step>>,
    /// Tasks, run in order. Each task is an independent fault domain.
    pub tasks: Vec<Step>,
}

impl Workflow {
    /// Creates a workflow with the given tasks and no precondition.
    #[must_use]
    pub fn new(tasks: Vec<Step>) -> Self {
        Self {
            precondition: None,
            tasks,
        }
    }

    /// Sets the precondition step.
    #[must_use]
    pub fn with_precondition(mut self, step: Step) -> Self {
        self.precondition = Some(Box::new(step));
        self
    }
}

#[async_trait]
impl Reconcile for Workflow {
    /// Runs the precondition to completion, then every task in list order
    /// with the same arguments, regardless of what earlier tasks logged.
    async fn reconcile(
        &self,
        events: &[ResourceEvent],
        topology: &Topology,
        upstream: Option<&Error>,
    ) {
        if let Some(precondition) = &self.precondition {
            precondition.reconcile(events, topology, upstream).await;
        }
        for task in &self.tasks {
            task.reconcile(events, topology, upstream).await;
        }
    }
}

/// Runs an inner reconciler only when an event batch matches its
/// subscription.
///
/// Workflow preconditions carry no subscription and run unconditionally;
/// tasks that declare one are skipped for unrelated batches.
pub struct Subscribed<R> {
    subscription: Subscription,
    inner: R,
}

impl<R: Reconcile> Subscribed<R> {
    /// Wraps a reconciler with its subscription.
    #[must_use]
    pub fn new(subscription: Subscription, inner: R) -> Self {
        Self {
            subscription,
            inner,
        }
    }
}

#[async_trait]
impl<R: Reconcile> Reconcile for Subscribed<R> {
    async fn reconcile(
        &self,
        events: &[ResourceEvent],
        topology: &Topology,
        upstream: Option<&Error>,
    ) {
        if self.subscription.matches_any(events) {
            self.inner.reconcile(events, topology, upstream).await;
        } else {
            tracing::debug!("no matching events, skipping reconciler");
        }
    }
}
