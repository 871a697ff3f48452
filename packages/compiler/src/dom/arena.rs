//! Arena Document
//!
//! Default [`Document`] provider. Nodes live in a growable arena; released
//! slots go on a free list and are handed out again by later allocations.

use crate::runtime::Value;

use super::parser::TreeBuilder;
use super::serializer;
use super::{Document, DomError, NodeId, NodeKind};

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element {
        name: String,
        attrs: Vec<(String, Value)>,
    },
    Text(String),
    Comment(String),
    Fragment,
    Doctype(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// In-memory node tree.
#[derive(Debug, Clone, Default)]
pub struct ArenaDocument {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    url: String,
    strict: bool,
}

impl ArenaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported in markup error positions.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Fail `parse_markup` on recoverable markup errors instead of repairing.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Number of live (allocated and not released) nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DomError::UnknownNode(id))
    }

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    pub(crate) fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    pub(crate) fn create_doctype(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Doctype(text.to_string()))
    }

    pub(crate) fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    fn ensure_container(&self, id: NodeId) -> Result<(), DomError> {
        match self.node(id)?.data {
            NodeData::Element { .. } | NodeData::Fragment => Ok(()),
            _ => Err(DomError::NotAContainer(id)),
        }
    }

    fn attrs(&self, id: NodeId) -> Result<&Vec<(String, Value)>, DomError> {
        match &self.node(id)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Result<&mut Vec<(String, Value)>, DomError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> Result<bool, DomError> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            current = self.node(id)?.parent;
        }
        Ok(false)
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Nodes to insert for `child`: the children of a fragment, or the node itself.
    fn take_insertable(&mut self, parent: NodeId, child: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.ensure_container(parent)?;
        let is_fragment = matches!(self.node(child)?.data, NodeData::Fragment);
        let moved = if is_fragment {
            std::mem::take(&mut self.node_mut(child)?.children)
        } else {
            if self.is_ancestor_or_self(child, parent)? {
                return Err(DomError::Cycle { parent, child });
            }
            self.detach(child)?;
            vec![child]
        };
        for id in &moved {
            self.node_mut(*id)?.parent = Some(parent);
        }
        Ok(moved)
    }

    fn position_of(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<(), DomError> {
        let node = self.node(id)?;
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } | NodeData::Fragment => {
                for child in &node.children {
                    self.collect_text(*child, out)?;
                }
            }
            NodeData::Comment(_) | NodeData::Doctype(_) => {}
        }
        Ok(())
    }
}

impl Document for ArenaDocument {
    fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.alloc(NodeData::Element {
            name: tag_name.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    fn parse_markup(&mut self, markup: &str) -> Result<NodeId, DomError> {
        let url = self.url.clone();
        let result = TreeBuilder::new(self).build(markup, &url);
        if self.strict && !result.errors.is_empty() {
            let messages: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
            return Err(DomError::Markup(messages.join("\n")));
        }
        Ok(result.root)
    }

    fn serialize(&self, node: NodeId) -> Result<String, DomError> {
        serializer::serialize_node(self, node)
    }

    fn inner_markup(&self, node: NodeId) -> Result<String, DomError> {
        serializer::serialize_children(self, node)
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, DomError> {
        Ok(match self.node(node)?.data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Doctype(_) => NodeKind::Doctype,
        })
    }

    fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        match &self.node(node)?.data {
            NodeData::Element { name, .. } => Ok(name.clone()),
            _ => Err(DomError::NotAnElement(node)),
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self
            .attrs(node)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.to_text()))
    }

    fn attribute_names(&self, node: NodeId) -> Result<Vec<String>, DomError> {
        Ok(self.attrs(node)?.iter().map(|(n, _)| n.clone()).collect())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.set_attribute_value(node, name, &Value::String(value.to_string()))
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.attrs_mut(node)?.retain(|(n, _)| n != name);
        Ok(())
    }

    fn set_attribute_value(
        &mut self,
        node: NodeId,
        name: &str,
        value: &Value,
    ) -> Result<(), DomError> {
        let attrs = self.attrs_mut(node)?;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.clone(),
            None => attrs.push((name.to_string(), value.clone())),
        }
        Ok(())
    }

    fn attribute_value(&self, node: NodeId, name: &str) -> Result<Option<Value>, DomError> {
        Ok(self
            .attrs(node)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone()))
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        Ok(self.node(node)?.children.clone())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.node(node)?.parent)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let moved = self.take_insertable(parent, child)?;
        self.node_mut(parent)?.children.extend(moved);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        if child == reference {
            return Ok(());
        }
        self.position_of(parent, reference)?;
        let moved = self.take_insertable(parent, child)?;
        // Detaching `child` may have shifted the reference.
        let at = self.position_of(parent, reference)?;
        self.node_mut(parent)?.children.splice(at..at, moved);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let at = self.position_of(parent, child)?;
        self.node_mut(parent)?.children.remove(at);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        if new_child == old_child {
            return Ok(());
        }
        self.insert_before(parent, new_child, old_child)?;
        self.remove_child(parent, old_child)
    }

    fn text(&self, node: NodeId) -> Result<String, DomError> {
        match &self.node(node)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Ok(text.clone()),
            NodeData::Doctype(_) => Err(DomError::NotText(node)),
            NodeData::Element { .. } | NodeData::Fragment => {
                let mut out = String::new();
                self.collect_text(node, &mut out)?;
                Ok(out)
            }
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(value) | NodeData::Comment(value) => {
                *value = text.to_string();
                return Ok(());
            }
            NodeData::Doctype(_) => return Err(DomError::NotText(node)),
            NodeData::Element { .. } | NodeData::Fragment => {}
        }
        super::discard_children(self, node)?;
        if !text.is_empty() {
            let text_node = self.create_text_node(text);
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        self.ensure_container(node)?;
        let fragment = self.parse_markup(markup)?;
        super::discard_children(self, node)?;
        self.append_child(node, fragment)?;
        self.release(fragment)
    }

    fn release(&mut self, node: NodeId) -> Result<(), DomError> {
        self.detach(node)?;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(released) = self.nodes.get_mut(id.0).and_then(Option::take) {
                stack.extend(released.children);
                self.free.push(id.0);
            }
        }
        Ok(())
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let data = self.node(node)?.data.clone();
        let copy = self.alloc(data);
        if deep {
            for child in self.node(node)?.children.clone() {
                let child_copy = self.clone_node(child, true)?;
                self.node_mut(child_copy)?.parent = Some(copy);
                self.node_mut(copy)?.children.push(child_copy);
            }
        }
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_move_fragment_children_on_append() {
        let mut doc = ArenaDocument::new();
        let fragment = doc.parse_markup("<b>1</b><i>2</i>").unwrap();
        let div = doc.create_element("div");
        doc.append_child(div, fragment).unwrap();
        assert_eq!(doc.serialize(div).unwrap(), "<div><b>1</b><i>2</i></div>");
        assert!(doc.children(fragment).unwrap().is_empty());
    }

    #[test]
    fn should_detach_before_reparenting() {
        let mut doc = ArenaDocument::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let t = doc.create_text_node("x");
        doc.append_child(a, t).unwrap();
        doc.append_child(b, t).unwrap();
        assert!(doc.children(a).unwrap().is_empty());
        assert_eq!(doc.parent(t).unwrap(), Some(b));
    }

    #[test]
    fn should_reject_cycles() {
        let mut doc = ArenaDocument::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("p");
        doc.append_child(outer, inner).unwrap();
        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::Cycle {
                parent: inner,
                child: outer
            })
        );
    }

    #[test]
    fn should_insert_before_sibling() {
        let mut doc = ArenaDocument::new();
        let ul = doc.create_element("ul");
        let first = doc.create_element("li");
        let second = doc.create_element("li");
        doc.append_child(ul, second).unwrap();
        doc.insert_before(ul, first, second).unwrap();
        assert_eq!(doc.children(ul).unwrap(), vec![first, second]);
        // moving an existing child in front of its right-hand sibling
        doc.insert_before(ul, second, first).unwrap();
        assert_eq!(doc.children(ul).unwrap(), vec![second, first]);
    }

    #[test]
    fn should_keep_function_values_on_attributes() {
        let mut doc = ArenaDocument::new();
        let button = doc.create_element("button");
        let handler = Value::function(|| Value::from("clicked"));
        doc.set_attribute_value(button, "onclick", &handler).unwrap();
        let stored = doc.attribute_value(button, "onclick").unwrap().unwrap();
        assert!(stored.is_function());
        assert_eq!(doc.attribute(button, "onclick").unwrap().as_deref(), Some("function"));
    }

    #[test]
    fn should_deep_clone_detached() {
        let mut doc = ArenaDocument::new();
        let fragment = doc.parse_markup("<p class=\"a\"><b>x</b></p>").unwrap();
        let p = doc.children(fragment).unwrap()[0];
        let copy = doc.clone_node(p, true).unwrap();
        assert_eq!(doc.parent(copy).unwrap(), None);
        assert_eq!(doc.serialize(copy).unwrap(), doc.serialize(p).unwrap());
        let shallow = doc.clone_node(p, false).unwrap();
        assert_eq!(doc.serialize(shallow).unwrap(), "<p class=\"a\"></p>");
    }

    #[test]
    fn should_set_text_on_containers() {
        let mut doc = ArenaDocument::new();
        let fragment = doc.parse_markup("<p><b>x</b>y</p>").unwrap();
        let p = doc.children(fragment).unwrap()[0];
        doc.set_text(p, "a < b").unwrap();
        assert_eq!(doc.serialize(p).unwrap(), "<p>a &lt; b</p>");
        assert_eq!(doc.text(p).unwrap(), "a < b");
    }

    #[test]
    fn should_reuse_released_slots() {
        let mut doc = ArenaDocument::new();
        let fragment = doc.parse_markup("<ul><li>a</li><li>b</li></ul>").unwrap();
        let ul = doc.children(fragment).unwrap()[0];
        let first_li = doc.children(ul).unwrap()[0];
        let live = doc.len();

        doc.release(first_li).unwrap();
        assert_eq!(doc.len(), live - 2);
        assert_eq!(doc.serialize(ul).unwrap(), "<ul><li>b</li></ul>");
        assert!(matches!(doc.kind(first_li), Err(DomError::UnknownNode(_))));

        doc.create_element("em");
        doc.create_text_node("z");
        assert_eq!(doc.len(), live);
    }

    #[test]
    fn should_release_replaced_children() {
        let mut doc = ArenaDocument::new();
        let div = doc.create_element("div");
        doc.set_inner_markup(div, "<b>1</b><i>2</i>").unwrap();
        let live = doc.len();
        doc.set_inner_markup(div, "<b>3</b><i>4</i>").unwrap();
        assert_eq!(doc.len(), live);
        doc.set_text(div, "").unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn should_report_markup_errors_in_strict_mode() {
        let mut doc = ArenaDocument::new().with_strict(true);
        assert!(matches!(
            doc.parse_markup("<div></span>"),
            Err(DomError::Markup(_))
        ));
        let mut lenient = ArenaDocument::new();
        assert!(lenient.parse_markup("<div></span>").is_ok());
    }
}
