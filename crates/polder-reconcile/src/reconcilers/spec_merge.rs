//! Selective spec merge for the rate-limit engine.
//!
//! The engine's spec is shared territory: defaulting logic and other
//! controllers own most of it. This mutator manages an explicit allow-list
//! of fields and copies only those, so a reconcile never clobbers fields it
//! does not own.

use serde_json::{Map, Value};

use polder_core::object::{kinds, Kind, Object};

use crate::error::{Error, Result};

/// Spec fields managed by this controller. Everything else belongs to
/// defaulting logic or other agents and must not be overwritten.
pub const MANAGED_FIELDS: &[&str] = &[
    "affinity",
    "podDisruptionBudget",
    "replicas",
    "resourceRequirements",
    "storage",
];

/// Copies the managed field subset of `desired` onto `existing` when the
/// subsets differ.
///
/// Returns `true` when `existing` was modified. Untouched means untouched:
/// a difference confined to fields outside [`MANAGED_FIELDS`] leaves
/// `existing` byte-identical to its pre-call state.
///
/// # Errors
///
/// Returns [`Error::KindMismatch`] when either object is not a
/// `LimitEngine`; passing the wrong kind is a programming-contract
/// violation, not a condition to paper over.
pub fn merge_limit_engine(existing: &mut Object, desired: &Object) -> Result<bool> {
    expect_limit_engine(existing)?;
    expect_limit_engine(desired)?;

    let existing_subset = managed_subset(&existing.spec);
    let desired_subset = managed_subset(&desired.spec);
    if existing_subset == desired_subset {
        return Ok(false);
    }

    if !existing.spec.is_object() {
        existing.spec = Value::Object(Map::new());
    }
    if let Value::Object(spec) = &mut existing.spec {
        for field in MANAGED_FIELDS {
            match desired.spec.get(*field) {
                Some(value) => {
                    spec.insert((*field).to_owned(), value.clone());
                }
                None => {
                    spec.remove(*field);
                }
            }
        }
    }
    Ok(true)
}

fn expect_limit_engine(object: &Object) -> Result<()> {
    if object.is_kind(kinds::LIMIT_ENGINE) {
        Ok(())
    } else {
        Err(Error::KindMismatch {
            expected: Kind::new(kinds::LIMIT_ENGINE),
            actual: object.kind.clone(),
        })
    }
}

/// Extracts the managed field subset of a spec document.
fn managed_subset(spec: &Value) -> Map<String, Value> {
    let mut subset = Map::new();
    for field in MANAGED_FIELDS {
        if let Some(value) = spec.get(*field) {
            subset.insert((*field).to_owned(), value.clone());
        }
    }
    subset
}
