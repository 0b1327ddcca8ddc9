//! Structural diffs between JSON documents.
//!
//! Used by the event logger to show what actually changed in an update
//! event when verbose logging is enabled. The diff is path-wise and
//! deterministic; it is a debugging aid, not a patch format.

use std::fmt;

use serde_json::Value;

/// A single changed leaf between two documents.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Dotted path to the changed leaf.
    pub path: String,
    /// Value on the old side, `None` when added.
    pub old: Option<Value>,
    /// Value on the new side, `None` when removed.
    pub new: Option<Value>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old.as_ref().map_or_else(|| "<absent>".to_owned(), Value::to_string);
        let new = self.new.as_ref().map_or_else(|| "<absent>".to_owned(), Value::to_string);
        write!(f, "{}: {old} => {new}", self.path)
    }
}

/// Computes the changed leaves between two JSON documents.
///
/// Objects are compared key-wise over the union of keys; arrays are
/// compared element-wise when their lengths match and wholesale otherwise;
/// scalars are compared directly.
#[must_use]
pub fn diff_values(old: &Value, new: &Value) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    diff_at("", old, new, &mut changes);
    changes
}

/// Renders a diff as one line per change, for log attachment.
#[must_use]
pub fn render(changes: &[FieldChange]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn diff_at(path: &str, old: &Value, new: &Value, changes: &mut Vec<FieldChange>) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut keys: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child = join(path, key);
                match (old_map.get(key), new_map.get(key)) {
                    (Some(o), Some(n)) => diff_at(&child, o, n, changes),
                    (Some(o), None) => changes.push(FieldChange {
                        path: child,
                        old: Some(o.clone()),
                        new: None,
                    }),
                    (None, Some(n)) => changes.push(FieldChange {
                        path: child,
                        old: None,
                        new: Some(n.clone()),
                    }),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items))
            if old_items.len() == new_items.len() =>
        {
            for (index, (o, n)) in old_items.iter().zip(new_items).enumerate() {
                let child = join(path, &index.to_string());
                diff_at(&child, o, n, changes);
            }
        }
        _ => changes.push(FieldChange {
            path: path.to_owned(),
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}
