//! In-memory store implementation for testing.
//!
//! This module provides [`InMemoryStore`], a simple in-memory
//! implementation of the [`ObjectStore`] trait suitable for testing and
//! development.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No durability, no cross-process
//!   coordination
//! - **Single-process only**: State is not shared across process boundaries

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use polder_core::id::Uid;
use polder_core::object::{Kind, Object, ObjectRef};

use super::{CreateResult, ObjectStore, WriteResult};
use crate::error::{Error, Result};

/// In-memory store for testing.
///
/// Thread-safe via `RwLock`. Resource versions are monotonic across the
/// whole store, like a real version token sequence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: RwLock<HashMap<ObjectRef, Object>>,
    next_version: AtomicU64,
    writes: AtomicU64,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("lock poisoned")
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of objects currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn object_count(&self) -> Result<usize> {
        let count = {
            let objects = self.objects.read().map_err(poison_err)?;
            objects.len()
        };
        Ok(count)
    }

    /// Number of applied writes (creates and updates) since construction.
    ///
    /// Useful for asserting that an idempotent pass produced no writes.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seeds an object directly, bypassing version checks.
    ///
    /// Assigns a UID and resource version as `create` would, but accepts
    /// pre-set generations. Intended for test setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn seed(&self, mut object: Object) -> Result<Object> {
        if object.meta.uid.is_none() {
            object.meta.uid = Some(Uid::generate());
        }
        object.meta.resource_version = self.bump_version();
        {
            let mut objects = self.objects.write().map_err(poison_err)?;
            objects.insert(object.object_ref(), object.clone());
        }
        Ok(object)
    }

    fn bump_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, object_ref: &ObjectRef) -> Result<Option<Object>> {
        let result = {
            let objects = self.objects.read().map_err(poison_err)?;
            objects.get(object_ref).cloned()
        };
        Ok(result)
    }

    async fn list(&self, kind: Option<&Kind>, namespace: Option<&str>) -> Result<Vec<Object>> {
        let mut result: Vec<Object> = {
            let objects = self.objects.read().map_err(poison_err)?;
            objects
                .values()
                .filter(|o| kind.is_none_or(|k| o.kind == *k))
                .filter(|o| namespace.is_none_or(|ns| o.meta.namespace == ns))
                .cloned()
                .collect()
        };
        result.sort_by_key(Object::object_ref);
        Ok(result)
    }

    async fn create(&self, object: &Object) -> Result<CreateResult> {
        let mut objects = self.objects.write().map_err(poison_err)?;
        let key = object.object_ref();
        if objects.contains_key(&key) {
            drop(objects);
            return Ok(CreateResult::AlreadyExists);
        }

        let mut stored = object.clone();
        if stored.meta.uid.is_none() {
            stored.meta.uid = Some(Uid::generate());
        }
        if stored.meta.generation == 0 {
            stored.meta.generation = 1;
        }
        let version = self.bump_version();
        stored.meta.resource_version = version;
        objects.insert(key, stored);
        drop(objects);

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(CreateResult::Created {
            resource_version: version,
        })
    }

    async fn update(&self, object: &Object) -> Result<WriteResult> {
        let mut objects = self.objects.write().map_err(poison_err)?;
        let key = object.object_ref();
        let Some(stored) = objects.get_mut(&key) else {
            drop(objects);
            return Ok(WriteResult::NotFound);
        };

        if stored.meta.resource_version != object.meta.resource_version {
            let current = stored.meta.resource_version;
            drop(objects);
            return Ok(WriteResult::Conflict { current });
        }

        if stored.spec != object.spec {
            stored.meta.generation += 1;
        }
        stored.spec = object.spec.clone();
        stored.meta.labels = object.meta.labels.clone();
        stored.meta.owner_references = object.meta.owner_references.clone();
        stored.meta.deletion_timestamp = object.meta.deletion_timestamp;
        let version = self.bump_version();
        stored.meta.resource_version = version;
        drop(objects);

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(WriteResult::Applied {
            resource_version: version,
        })
    }

    async fn update_status(&self, object: &Object) -> Result<WriteResult> {
        let mut objects = self.objects.write().map_err(poison_err)?;
        let key = object.object_ref();
        let Some(stored) = objects.get_mut(&key) else {
            drop(objects);
            return Ok(WriteResult::NotFound);
        };

        if stored.meta.resource_version != object.meta.resource_version {
            let current = stored.meta.resource_version;
            drop(objects);
            return Ok(WriteResult::Conflict { current });
        }

        stored.status = object.status.clone();
        let version = self.bump_version();
        stored.meta.resource_version = version;
        drop(objects);

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(WriteResult::Applied {
            resource_version: version,
        })
    }
}
