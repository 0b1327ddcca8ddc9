//! Status conditions with an observed-generation watermark.
//!
//! A condition is a typed, reason-coded boolean fact attached to an object.
//! Status blocks are compared semantically: transition timestamps and the
//! observed-generation watermark are ignored, so a reconciler can detect
//! "nothing actually changed" and skip a redundant write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type used for dependency readiness checks.
pub const READY_CONDITION: &str = "Ready";

/// The truth value of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition cannot be determined.
    Unknown,
}

/// A typed, reason-coded status fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, unique within a status block.
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Truth value.
    pub status: ConditionStatus,
    /// Machine-readable reason code.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
    /// When the truth value last changed.
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Creates a condition with the transition time set to now.
    #[must_use]
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Semantic equality: same type, status, reason, and message.
    ///
    /// Transition timestamps are deliberately ignored; they change on every
    /// upsert that flips the status and would defeat change detection.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// The status block attached to an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStatus {
    /// Conditions, at most one per type.
    pub conditions: Vec<Condition>,
    /// Generation of the spec the status was computed from.
    pub observed_generation: i64,
}

impl ObjectStatus {
    /// Returns the condition of the given type, if present.
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Upserts a condition by type, preserving all others.
    ///
    /// The transition time of an existing condition is kept when the truth
    /// value did not change, so repeated reconciles do not churn timestamps.
    pub fn set_condition(&mut self, condition: Condition) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) => {
                let keep_time = existing.status == condition.status;
                let previous_time = existing.last_transition_time;
                *existing = condition;
                if keep_time {
                    existing.last_transition_time = previous_time;
                }
            }
            None => self.conditions.push(condition),
        }
    }

    /// Whether the `Ready` condition is present and true.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.condition(READY_CONDITION)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Semantic equality over the condition set.
    ///
    /// Ignores transition timestamps and the observed-generation watermark.
    /// Condition order is irrelevant; each side must match the other by type.
    #[must_use]
    pub fn same_conditions(&self, other: &Self) -> bool {
        if self.conditions.len() != other.conditions.len() {
            return false;
        }
        self.conditions.iter().all(|c| {
            other
                .condition(&c.condition_type)
                .is_some_and(|o| c.same_as(o))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available(status: ConditionStatus, reason: &str) -> Condition {
        Condition::new("Available", status, reason, "msg")
    }

    #[test]
    fn set_condition_upserts_by_type() {
        let mut status = ObjectStatus::default();
        status.set_condition(available(ConditionStatus::True, "Protected"));
        status.set_condition(Condition::new(
            READY_CONDITION,
            ConditionStatus::True,
            "AllGood",
            "",
        ));
        status.set_condition(available(ConditionStatus::False, "ReconciliationError"));

        assert_eq!(status.conditions.len(), 2);
        let cond = status.condition("Available").unwrap();
        assert_eq!(cond.status, ConditionStatus::False);
        assert_eq!(cond.reason, "ReconciliationError");
        // The unrelated condition is preserved.
        assert!(status.is_ready());
    }

    #[test]
    fn transition_time_kept_when_status_unchanged() {
        let mut status = ObjectStatus::default();
        status.set_condition(available(ConditionStatus::True, "Protected"));
        let first = status.condition("Available").unwrap().last_transition_time;

        status.set_condition(available(ConditionStatus::True, "StillProtected"));
        assert_eq!(
            status.condition("Available").unwrap().last_transition_time,
            first
        );

        status.set_condition(available(ConditionStatus::False, "ReconciliationError"));
        assert!(status.condition("Available").unwrap().last_transition_time >= first);
    }

    #[test]
    fn same_conditions_ignores_watermark_and_times() {
        let mut a = ObjectStatus::default();
        a.set_condition(available(ConditionStatus::True, "Protected"));
        a.observed_generation = 3;

        let mut b = ObjectStatus::default();
        b.set_condition(available(ConditionStatus::True, "Protected"));
        b.observed_generation = 7;
        if let Some(cond) = b.conditions.first_mut() {
            cond.last_transition_time = cond.last_transition_time - chrono::Duration::hours(1);
        }

        assert!(a.same_conditions(&b));
    }

    #[test]
    fn same_conditions_detects_reason_change() {
        let mut a = ObjectStatus::default();
        a.set_condition(available(ConditionStatus::False, "ReconciliationError"));
        let mut b = ObjectStatus::default();
        b.set_condition(available(ConditionStatus::False, "AuthSchemeNotReady"));
        assert!(!a.same_conditions(&b));
    }
}
