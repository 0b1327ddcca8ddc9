//! # polder-core
//!
//! Core abstractions for the Polder policy control plane.
//!
//! This crate provides the foundational types used across all Polder
//! components:
//!
//! - **Identifiers**: Strongly-typed, ULID-backed unique IDs for stored objects
//! - **Object Model**: A dynamic, kind-tagged object representation with
//!   metadata, ownership references, and an opaque generation counter
//! - **Conditions**: Typed, reason-coded status facts with an
//!   observed-generation watermark
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `polder-core` is the only crate allowed to define shared primitives.
//! The reconciliation engine (`polder-reconcile`) builds on these contracts
//! without redefining them.
//!
//! ## Example
//!
//! ```rust
//! use polder_core::prelude::*;
//!
//! let root = Object::new(kinds::POLICY_ROOT, "polder-system", "polder");
//! assert_eq!(root.object_ref().to_string(), "Polder/polder-system/polder");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod condition;
pub mod error;
pub mod id;
pub mod object;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use polder_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::condition::{Condition, ConditionStatus, ObjectStatus, READY_CONDITION};
    pub use crate::error::{Error, Result};
    pub use crate::id::Uid;
    pub use crate::object::{kinds, Kind, Object, ObjectMeta, ObjectRef, OwnerReference};
}
