//! Availability status for access policies.
//!
//! Derives a single `Available` condition per policy from the reconcile
//! outcome and the readiness of the policy's auth scheme, then persists it
//! with change detection: when the semantic condition set and the
//! observed-generation watermark both match, no write happens at all.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use polder_core::condition::{Condition, ConditionStatus, ObjectStatus};
use polder_core::object::{kinds, Object, ObjectRef};

use crate::error::{Error, Result};
use crate::metrics::{labels, names};
use crate::store::{ObjectStore, WriteResult};

/// Condition type carrying policy availability.
pub const AVAILABLE_CONDITION: &str = "Available";

/// Reason reported when the reconcile pass itself failed.
pub const RECONCILIATION_ERROR_REASON: &str = "ReconciliationError";

/// Reason reported while the auth scheme is not ready.
pub const SCHEME_NOT_READY_REASON: &str = "AuthSchemeNotReady";

/// Fallback target kind when a policy spec omits its target reference.
const UNKNOWN_TARGET_KIND: &str = "Target";

/// Outcome of a status reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Status already matched; no write was issued.
    UpToDate,
    /// The status block was written.
    Updated,
    /// The policy changed concurrently; retry on the next trigger.
    Conflict,
}

/// Computes the new status block for a policy.
///
/// Availability precedence, evaluated in order: a reconcile error wins,
/// then scheme readiness, then the protected state. All other conditions
/// on the policy are preserved; only the `Available` condition is
/// upserted. The observed-generation watermark is left for the caller to
/// stamp once it decides a write is needed.
#[must_use]
pub fn calculate_status(
    policy: &Object,
    spec_err: Option<&Error>,
    scheme_ready: bool,
) -> ObjectStatus {
    let mut status = policy.status.clone().unwrap_or_default();

    let target_kind = target_kind(policy);
    let condition = if let Some(err) = spec_err {
        Condition::new(
            AVAILABLE_CONDITION,
            ConditionStatus::False,
            RECONCILIATION_ERROR_REASON,
            err.to_string(),
        )
    } else if scheme_ready {
        Condition::new(
            AVAILABLE_CONDITION,
            ConditionStatus::True,
            format!("{target_kind}Protected"),
            format!("{target_kind} is protected"),
        )
    } else {
        Condition::new(
            AVAILABLE_CONDITION,
            ConditionStatus::False,
            SCHEME_NOT_READY_REASON,
            "AuthScheme is not ready yet",
        )
    };
    status.set_condition(condition);
    status
}

/// The kind of the network object the policy protects.
fn target_kind(policy: &Object) -> &str {
    policy
        .spec
        .get("targetRef")
        .and_then(|t| t.get("kind"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or(UNKNOWN_TARGET_KIND)
}

/// Name of the auth scheme derived from a policy.
#[must_use]
pub fn auth_scheme_ref(policy: &Object) -> ObjectRef {
    ObjectRef::new(
        kinds::AUTH_SCHEME,
        policy.meta.namespace.clone(),
        format!("ap-{}-{}", policy.meta.namespace, policy.meta.name),
    )
}

/// Keeps the status block of access policies up to date.
pub struct PolicyStatusReconciler {
    store: Arc<dyn ObjectStore>,
}

impl PolicyStatusReconciler {
    /// Creates a status reconciler over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Reconciles the availability condition of one policy.
    ///
    /// # Errors
    ///
    /// Propagates failures fetching the policy's auth scheme and any
    /// status write failure other than an optimistic-concurrency conflict;
    /// both mean the whole pass for this policy must be retried later.
    pub async fn reconcile_status(
        &self,
        policy: &Object,
        spec_err: Option<&Error>,
    ) -> Result<StatusOutcome> {
        // Skip fetching the scheme when the pass already failed; the error
        // condition wins regardless of readiness.
        let scheme_ready = if spec_err.is_some() {
            true
        } else {
            self.scheme_ready(policy).await?
        };

        let mut new_status = calculate_status(policy, spec_err, scheme_ready);

        let current = policy.status.clone().unwrap_or_default();
        let unchanged = current.same_conditions(&new_status);
        tracing::debug!(
            policy = %policy.object_ref(),
            status_changed = !unchanged,
            generation_changed = policy.meta.generation != current.observed_generation,
            scheme_ready,
            "reconciling access policy status"
        );
        if unchanged && policy.meta.generation == current.observed_generation {
            return Ok(StatusOutcome::UpToDate);
        }

        // Record the generation we acted on; otherwise a retry would look
        // like an unseen spec update.
        new_status.observed_generation = policy.meta.generation;

        let mut updated = policy.clone();
        updated.status = Some(new_status);
        match self.store.update_status(&updated).await? {
            WriteResult::Applied { .. } => {
                counter!(
                    names::STORE_WRITES_TOTAL,
                    labels::RECONCILER => "policy_status".to_string(),
                    labels::OUTCOME => "updated".to_string(),
                )
                .increment(1);
                Ok(StatusOutcome::Updated)
            }
            WriteResult::Conflict { .. } => {
                tracing::info!(
                    policy = %policy.object_ref(),
                    "failed to update status: resource might just be outdated"
                );
                Ok(StatusOutcome::Conflict)
            }
            WriteResult::NotFound => Err(Error::storage(format!(
                "failed to update status: {} not found",
                policy.object_ref()
            ))),
        }
    }

    /// Whether the policy's auth scheme reports ready.
    ///
    /// A scheme that does not exist yet counts as not ready; its absence is
    /// exactly what the `AuthSchemeNotReady` reason describes.
    async fn scheme_ready(&self, policy: &Object) -> Result<bool> {
        let scheme = self.store.get(&auth_scheme_ref(policy)).await?;
        Ok(scheme
            .and_then(|s| s.status)
            .is_some_and(|status| status.is_ready()))
    }
}
