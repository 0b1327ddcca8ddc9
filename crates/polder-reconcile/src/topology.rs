//! Immutable topology snapshots.
//!
//! A `Topology` is the graph of interrelated configuration objects at a
//! point in time: policies, routes, gateways, and their owning root object.
//! It is produced externally once per event batch and never mutated during
//! a reconcile pass, so reconcilers can query it without locking.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use polder_core::object::{Object, ObjectRef};

/// A read-only snapshot of the object graph.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    objects: Vec<Object>,
}

impl Topology {
    /// Creates a snapshot from a set of objects.
    ///
    /// Members are ordered deterministically by `(kind, namespace, name)`
    /// so that every query and the serialized form are order-stable.
    #[must_use]
    pub fn new(mut objects: Vec<Object>) -> Self {
        objects.sort_by_key(Object::object_ref);
        Self { objects }
    }

    /// All members, in deterministic order.
    #[must_use]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Members satisfying the predicate, in deterministic order.
    pub fn matching<P>(&self, predicate: P) -> Vec<&Object>
    where
        P: Fn(&Object) -> bool,
    {
        self.objects.iter().filter(|o| predicate(o)).collect()
    }

    /// Looks up a member by reference.
    #[must_use]
    pub fn get(&self, object_ref: &ObjectRef) -> Option<&Object> {
        self.objects.iter().find(|o| o.object_ref() == *object_ref)
    }

    /// Root objects: members with no incoming ownership edge.
    #[must_use]
    pub fn roots(&self) -> Vec<&Object> {
        self.objects
            .iter()
            .filter(|o| o.meta.owner_references.is_empty())
            .collect()
    }

    /// Serializes the graph to a deterministic DOT representation.
    ///
    /// Every member becomes a node line; every ownership reference becomes
    /// an `owner -> child` edge line. Both sets are sorted, so two
    /// topologies with the same shape always serialize identically.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut edges = BTreeSet::new();
        for object in &self.objects {
            let child = object.object_ref().to_string();
            for owner in &object.meta.owner_references {
                let owner_ref = ObjectRef::new(
                    owner.kind.clone(),
                    object.meta.namespace.clone(),
                    owner.name.clone(),
                );
                edges.insert(format!("  \"{owner_ref}\" -> \"{child}\"\n"));
            }
        }

        let mut dot = String::from("strict digraph topology {\n");
        for object in &self.objects {
            let _ = writeln!(dot, "  \"{}\"", object.object_ref());
        }
        for edge in edges {
            dot.push_str(&edge);
        }
        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polder_core::id::Uid;
    use polder_core::object::kinds;

    fn fixture() -> Vec<Object> {
        let mut root = Object::new(kinds::POLICY_ROOT, "system", "polder");
        root.meta.uid = Some(Uid::generate());
        let engine = Object::new(kinds::AUTH_ENGINE, "system", "auth-engine").owned_by(&root);
        let gateway = Object::new(kinds::GATEWAY, "default", "public");
        vec![engine, gateway, root]
    }

    #[test]
    fn roots_have_no_owner_references() {
        let topology = Topology::new(fixture());
        let roots = topology.roots();
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|o| o.meta.owner_references.is_empty()));
    }

    #[test]
    fn matching_filters_by_kind() {
        let topology = Topology::new(fixture());
        let engines = topology.matching(|o| o.is_kind(kinds::AUTH_ENGINE));
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].meta.name, "auth-engine");
    }

    #[test]
    fn to_dot_is_order_stable() {
        let mut shuffled = fixture();
        shuffled.reverse();

        let a = Topology::new(fixture()).to_dot();
        let b = Topology::new(shuffled).to_dot();
        assert_eq!(a, b);
    }

    #[test]
    fn to_dot_draws_ownership_edges() {
        let dot = Topology::new(fixture()).to_dot();
        assert!(dot.contains("\"AuthEngine/system/auth-engine\""));
        assert!(dot.contains("\"Polder/system/polder\" -> \"AuthEngine/system/auth-engine\""));
        assert!(!dot.contains("-> \"Gateway/default/public\""));
    }

    #[test]
    fn get_finds_member_by_ref() {
        let topology = Topology::new(fixture());
        let found = topology.get(&ObjectRef::new(kinds::GATEWAY, "default", "public"));
        assert!(found.is_some());
        let missing = topology.get(&ObjectRef::new(kinds::GATEWAY, "default", "private"));
        assert!(missing.is_none());
    }
}
