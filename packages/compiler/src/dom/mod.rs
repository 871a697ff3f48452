//! Document Provider
//!
//! The compiler and the runtime reach node trees only through the
//! [`Document`] trait. Nodes are addressed by [`NodeId`] handles owned by the
//! document; nothing in the core holds provider node objects directly.
//!
//! [`ArenaDocument`] is the default provider: an in-memory arena with its own
//! markup lexer, tree builder and serializer.

pub mod arena;
pub mod lexer;
pub mod parser;
pub mod serializer;
pub mod tags;

pub use arena::ArenaDocument;

use thiserror::Error;

use crate::runtime::Value;

/// Handle of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    /// Detached list of nodes; appending a fragment moves its children.
    Fragment,
    Doctype,
}

/// Failures of node-tree operations. These are fatal to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} cannot hold children")]
    NotAContainer(NodeId),

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0:?} has no text value")]
    NotText(NodeId),

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Inserting {child:?} into {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Node-tree capabilities the compiler and the runtime rely on.
pub trait Document {
    fn create_element(&mut self, tag_name: &str) -> NodeId;

    fn create_text_node(&mut self, text: &str) -> NodeId;

    /// Parse markup into a new detached fragment node.
    fn parse_markup(&mut self, markup: &str) -> Result<NodeId, DomError>;

    /// Outer markup of `node` (children only for fragments).
    fn serialize(&self, node: NodeId) -> Result<String, DomError>;

    fn inner_markup(&self, node: NodeId) -> Result<String, DomError>;

    fn kind(&self, node: NodeId) -> Result<NodeKind, DomError>;

    fn tag_name(&self, node: NodeId) -> Result<String, DomError>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError>;

    /// Attribute names in insertion order.
    fn attribute_names(&self, node: NodeId) -> Result<Vec<String>, DomError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;

    fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool, DomError> {
        Ok(self.attribute(node, name)?.is_some())
    }

    /// Assign a runtime value as-is. Providers without value-typed
    /// attributes store its text form.
    fn set_attribute_value(
        &mut self,
        node: NodeId,
        name: &str,
        value: &Value,
    ) -> Result<(), DomError> {
        self.set_attribute(node, name, &value.to_text())
    }

    fn attribute_value(&self, node: NodeId, name: &str) -> Result<Option<Value>, DomError> {
        Ok(self.attribute(node, name)?.map(Value::String))
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    fn first_child(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.children(node)?.first().copied())
    }

    /// Append `child`, detaching it from its current parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError>;

    /// Value of a text or comment node, text content of anything else.
    fn text(&self, node: NodeId) -> Result<String, DomError>;

    /// Set the value of a text node, or replace all children of a container
    /// with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Replace all children with the parsed `markup`.
    fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), DomError>;

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError>;

    /// Detach `node` and give up it and its whole subtree. Their ids must not
    /// be used afterwards. Providers whose nodes are reclaimed elsewhere keep
    /// this a no-op.
    fn release(&mut self, _node: NodeId) -> Result<(), DomError> {
        Ok(())
    }
}

/// Remove every child of `node`.
pub fn clear_children(doc: &mut dyn Document, node: NodeId) -> Result<(), DomError> {
    for child in doc.children(node)? {
        doc.remove_child(node, child)?;
    }
    Ok(())
}

/// Remove every child of `node` and release the removed subtrees.
pub fn discard_children(doc: &mut dyn Document, node: NodeId) -> Result<(), DomError> {
    for child in doc.children(node)? {
        doc.release(child)?;
    }
    Ok(())
}

/// Move every child of `from` to the end of `to`.
pub fn move_children(doc: &mut dyn Document, from: NodeId, to: NodeId) -> Result<(), DomError> {
    for child in doc.children(from)? {
        doc.append_child(to, child)?;
    }
    Ok(())
}

/// First element child of `node`, skipping text, comments and doctypes.
pub fn first_element_child(doc: &dyn Document, node: NodeId) -> Result<Option<NodeId>, DomError> {
    for child in doc.children(node)? {
        if doc.kind(child)? == NodeKind::Element {
            return Ok(Some(child));
        }
    }
    Ok(None)
}
