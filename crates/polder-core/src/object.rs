//! Dynamic object model for topology members.
//!
//! Polder reconciles a heterogeneous set of configuration objects. Rather
//! than one Rust type per kind, objects are kind-tagged envelopes around a
//! JSON spec document, mirroring how the store itself represents them.
//! Typed accessors live with the reconcilers that own the fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::ObjectStatus;
use crate::id::Uid;

/// Well-known kind names used by the control plane.
pub mod kinds {
    /// The root policy owner. At most one live instance may exist.
    pub const POLICY_ROOT: &str = "Polder";
    /// Generated authorization engine instance.
    pub const AUTH_ENGINE: &str = "AuthEngine";
    /// Generated rate-limit engine instance.
    pub const LIMIT_ENGINE: &str = "LimitEngine";
    /// Plain configuration record (topology snapshot carrier).
    pub const CONFIG_RECORD: &str = "ConfigRecord";
    /// User-authored access policy.
    pub const ACCESS_POLICY: &str = "AccessPolicy";
    /// Authorization scheme derived from an access policy.
    pub const AUTH_SCHEME: &str = "AuthScheme";
    /// Network gateway.
    pub const GATEWAY: &str = "Gateway";
    /// Route attached to a gateway.
    pub const ROUTE: &str = "Route";
}

/// The kind of a topology object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    /// Creates a kind from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the kind name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference uniquely identifying an object within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object kind.
    pub kind: Kind,
    /// Object namespace.
    pub namespace: String,
    /// Object name.
    pub name: String,
}

impl ObjectRef {
    /// Creates a reference from its parts.
    #[must_use]
    pub fn new(kind: impl Into<Kind>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// A reference from an owned object back to its owner.
///
/// Owners are assumed to live in the same namespace as the objects they
/// own. The `controller` flag marks the single agent responsible for the
/// child's lifecycle; `block_owner_deletion` delays owner removal until
/// the child is collectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    /// Owner kind.
    pub kind: Kind,
    /// Owner name.
    pub name: String,
    /// Owner UID at the time the reference was taken.
    pub uid: Option<Uid>,
    /// Whether the referencing controller manages the child's lifecycle.
    pub controller: bool,
    /// Whether owner deletion is blocked until the child is removable.
    pub block_owner_deletion: bool,
}

/// Metadata common to every stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name, unique per kind and namespace.
    pub name: String,
    /// Object namespace.
    pub namespace: String,
    /// Store-assigned unique identifier. `None` until first persisted.
    pub uid: Option<Uid>,
    /// Opaque generation counter, bumped by the store on spec changes.
    pub generation: i64,
    /// Version token for optimistic-concurrency writes.
    pub resource_version: u64,
    /// Discovery labels.
    pub labels: BTreeMap<String, String>,
    /// Ownership references anchoring garbage collection.
    pub owner_references: Vec<OwnerReference>,
    /// Deletion marker; set when the object is being torn down.
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

/// A kind-tagged object with a dynamic spec document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Object kind.
    pub kind: Kind,
    /// Object metadata.
    pub meta: ObjectMeta,
    /// Kind-specific spec document.
    pub spec: Value,
    /// Status block, if the object carries one.
    pub status: Option<ObjectStatus>,
}

impl Object {
    /// Creates a bare object of the given kind.
    #[must_use]
    pub fn new(kind: impl Into<Kind>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            meta: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                generation: 1,
                ..ObjectMeta::default()
            },
            spec: Value::Null,
            status: None,
        }
    }

    /// Sets the spec document.
    #[must_use]
    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = spec;
        self
    }

    /// Adds a discovery label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.labels.insert(key.into(), value.into());
        self
    }

    /// Adds a controller ownership reference to the given owner.
    #[must_use]
    pub fn owned_by(mut self, owner: &Object) -> Self {
        self.meta.owner_references.push(OwnerReference {
            kind: owner.kind.clone(),
            name: owner.meta.name.clone(),
            uid: owner.meta.uid,
            controller: true,
            block_owner_deletion: true,
        });
        self
    }

    /// Returns the store reference for this object.
    #[must_use]
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: self.kind.clone(),
            namespace: self.meta.namespace.clone(),
            name: self.meta.name.clone(),
        }
    }

    /// Whether the object carries a deletion marker.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.meta.deletion_timestamp.is_some()
    }

    /// Whether the object is of the named kind.
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_str() == kind
    }
}
