//! Host identities
//!
//! Binding hosts are tracked in a side table keyed by node handle, so the
//! walk never writes bookkeeping attributes into the tree it compiles.

use std::collections::HashMap;

use crate::compiled::Reference;
use crate::dom::NodeId;

/// Identity of a binding host within one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct HostId(usize);

impl HostId {
    pub(crate) fn new(id: usize) -> Self {
        HostId(id)
    }

    pub(crate) fn as_usize(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct HostTable {
    ids: HashMap<NodeId, HostId>,
    nodes: Vec<NodeId>,
    slots: Vec<Vec<Reference>>,
}

impl HostTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Identity of `node`, allocated on first use.
    pub(crate) fn host_for(&mut self, node: NodeId) -> HostId {
        if let Some(id) = self.ids.get(&node) {
            return *id;
        }
        let id = HostId::new(self.nodes.len());
        self.ids.insert(node, id);
        self.nodes.push(node);
        self.slots.push(Vec::new());
        id
    }

    fn get(&self, node: NodeId) -> Option<HostId> {
        self.ids.get(&node).copied()
    }

    pub(crate) fn push(&mut self, host: HostId, reference: Reference) {
        self.slots[host.as_usize()].push(reference);
    }

    /// Move the identity of `old` (and its references) to `new`.
    pub(crate) fn rekey(&mut self, old: NodeId, new: NodeId) -> Option<HostId> {
        let id = self.ids.remove(&old)?;
        self.ids.insert(new, id);
        self.nodes[id.as_usize()] = new;
        Some(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Take the references of `node`, leaving its slot empty.
    pub(crate) fn take_slot(&mut self, node: NodeId) -> Option<Vec<Reference>> {
        let id = self.get(node)?;
        Some(std::mem::take(&mut self.slots[id.as_usize()]))
    }
}
