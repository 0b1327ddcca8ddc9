//! Change events delivered to reconcile functions.
//!
//! The watch subsystem (external to this crate) observes the store and
//! delivers batches of `ResourceEvent`s together with the topology snapshot
//! they produced. Within one batch the topology is immutable.

use std::fmt;

use serde::{Deserialize, Serialize};

use polder_core::object::Object;

/// The type of change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An object was created.
    Create,
    /// An object was updated.
    Update,
    /// An object was deleted.
    Delete,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A single observed change to a stored object.
///
/// At least one of `old_object`/`new_object` is present; updates carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEvent {
    /// What happened.
    pub event_type: EventType,
    /// The object before the change (absent for creates).
    pub old_object: Option<Object>,
    /// The object after the change (absent for deletes).
    pub new_object: Option<Object>,
}

impl ResourceEvent {
    /// Creates a creation event.
    #[must_use]
    pub fn create(object: Object) -> Self {
        Self {
            event_type: EventType::Create,
            old_object: None,
            new_object: Some(object),
        }
    }

    /// Creates an update event.
    #[must_use]
    pub fn update(old: Object, new: Object) -> Self {
        Self {
            event_type: EventType::Update,
            old_object: Some(old),
            new_object: Some(new),
        }
    }

    /// Creates a deletion event.
    #[must_use]
    pub fn delete(object: Object) -> Self {
        Self {
            event_type: EventType::Delete,
            old_object: Some(object),
            new_object: None,
        }
    }

    /// The most representative object for this event: the old object when
    /// present, otherwise the new one.
    ///
    /// # Panics
    ///
    /// Panics if neither object is set, which violates the event contract.
    #[must_use]
    pub fn object(&self) -> &Object {
        self.old_object
            .as_ref()
            .or(self.new_object.as_ref())
            .expect("resource event must carry at least one object")
    }
}
