//! Event subscriptions: pure kind/event-type matching.
//!
//! The dispatcher decides *when* a reconcile function runs; a subscription
//! only decides *whether* a given event is interesting. Matching is a pure
//! function over `(kind, event type)` pairs so it can be tested without a
//! live watch mechanism.

use polder_core::object::Kind;

use crate::events::{EventType, ResourceEvent};

/// A single `(kind, event type)` filter. `None` matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMatcher {
    /// Kind to match, or any kind when `None`.
    pub kind: Option<Kind>,
    /// Event type to match, or any type when `None`.
    pub event_type: Option<EventType>,
}

impl EventMatcher {
    /// Creates a matcher for a specific kind and event type.
    #[must_use]
    pub fn new(kind: impl Into<Kind>, event_type: EventType) -> Self {
        Self {
            kind: Some(kind.into()),
            event_type: Some(event_type),
        }
    }

    /// Whether this matcher accepts the event.
    #[must_use]
    pub fn matches(&self, event: &ResourceEvent) -> bool {
        let kind_ok = self
            .kind
            .as_ref()
            .is_none_or(|k| event.object().kind == *k);
        let type_ok = self.event_type.is_none_or(|t| event.event_type == t);
        kind_ok && type_ok
    }
}

/// A reconcile function's declared interest in events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    /// Matchers; an event is interesting if any matcher accepts it.
    pub matchers: Vec<EventMatcher>,
}

impl Subscription {
    /// Creates a subscription from matchers.
    #[must_use]
    pub fn new(matchers: Vec<EventMatcher>) -> Self {
        Self { matchers }
    }

    /// Whether any matcher accepts the event.
    #[must_use]
    pub fn matches(&self, event: &ResourceEvent) -> bool {
        self.matchers.iter().any(|m| m.matches(event))
    }

    /// Whether any event in the batch is accepted.
    #[must_use]
    pub fn matches_any(&self, events: &[ResourceEvent]) -> bool {
        events.iter().any(|e| self.matches(e))
    }
}
