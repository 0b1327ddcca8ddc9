//! Pluggable object storage for reconciliation.
//!
//! The `ObjectStore` trait is the boundary between the engine and the
//! shared, concurrently-mutating external store. All mutations follow
//! optimistic-concurrency rules:
//!
//! - Creates are idempotent against already-exists races; a concurrent
//!   duplicate create is a normal result, never an error
//! - Updates carry the resource version the writer last read; a mismatch
//!   is a normal result meaning "state changed since read, retry later"
//!
//! Only genuine I/O failures surface as `Err`.

pub mod memory;

use async_trait::async_trait;

use polder_core::object::{Kind, Object, ObjectRef};

use crate::error::Result;

/// Result of a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResult {
    /// The object was created.
    Created {
        /// Version token assigned by the store.
        resource_version: u64,
    },
    /// An object with the same reference already exists (a concurrent
    /// create race). Treated as success by every reconciler.
    AlreadyExists,
}

impl CreateResult {
    /// Returns true if this call created the object.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Result of a version-conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The write was applied.
    Applied {
        /// The new version token after the write.
        resource_version: u64,
    },
    /// The object changed since it was read. Retry on the next trigger.
    Conflict {
        /// The version currently in the store.
        current: u64,
    },
    /// The object does not exist.
    NotFound,
}

impl WriteResult {
    /// Returns true if the write was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Storage abstraction for configuration objects.
///
/// Implementations must provide atomic per-object writes and version
/// tokens suitable for optimistic concurrency. All methods are `Send +
/// Sync` so independently-dispatched workflows can share one client.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Gets an object by reference.
    ///
    /// Returns `None` if the object does not exist.
    async fn get(&self, object_ref: &ObjectRef) -> Result<Option<Object>>;

    /// Lists objects, optionally narrowed by kind and namespace.
    ///
    /// Results are in deterministic `(kind, namespace, name)` order.
    async fn list(&self, kind: Option<&Kind>, namespace: Option<&str>) -> Result<Vec<Object>>;

    /// Creates an object.
    ///
    /// The store assigns the UID and initial resource version. A concurrent
    /// duplicate create returns `CreateResult::AlreadyExists`, never `Err`.
    async fn create(&self, object: &Object) -> Result<CreateResult>;

    /// Updates an object's spec and metadata, conditional on
    /// `object.meta.resource_version` matching the stored version.
    ///
    /// The stored status block is untouched. A successful spec change bumps
    /// the generation counter.
    async fn update(&self, object: &Object) -> Result<WriteResult>;

    /// Updates only an object's status block, conditional on
    /// `object.meta.resource_version` matching the stored version.
    async fn update_status(&self, object: &Object) -> Result<WriteResult>;
}
