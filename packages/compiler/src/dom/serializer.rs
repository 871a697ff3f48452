//! Markup Serializer
//!
//! Writes arena nodes back to markup. Empty attributes are written as
//! `name=""`; raw-text element content is written verbatim.

use super::arena::{ArenaDocument, NodeData};
use super::tags::{get_html_tag_definition, TagContentType};
use super::{DomError, NodeId};

pub fn serialize_node(doc: &ArenaDocument, id: NodeId) -> Result<String, DomError> {
    let mut out = String::new();
    write_node(doc, id, false, &mut out)?;
    Ok(out)
}

pub fn serialize_children(doc: &ArenaDocument, id: NodeId) -> Result<String, DomError> {
    let node = doc.node(id)?;
    let raw = is_raw_text_parent(&node.data);
    let mut out = String::new();
    for child in &node.children {
        write_node(doc, *child, raw, &mut out)?;
    }
    Ok(out)
}

fn is_raw_text_parent(data: &NodeData) -> bool {
    match data {
        NodeData::Element { name, .. } => {
            get_html_tag_definition(name).content_type == TagContentType::RawText
        }
        _ => false,
    }
}

fn write_node(doc: &ArenaDocument, id: NodeId, raw: bool, out: &mut String) -> Result<(), DomError> {
    let node = doc.node(id)?;
    match &node.data {
        NodeData::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for (attr_name, value) in attrs {
                out.push(' ');
                out.push_str(attr_name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(&value.to_text()));
                out.push('"');
            }
            out.push('>');
            if get_html_tag_definition(name).is_void {
                return Ok(());
            }
            let raw_children = is_raw_text_parent(&node.data);
            for child in &node.children {
                write_node(doc, *child, raw_children, out)?;
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => {
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Doctype(text) => {
            out.push_str("<!");
            out.push_str(text);
            out.push('>');
        }
        NodeData::Fragment => {
            for child in &node.children {
                write_node(doc, *child, raw, out)?;
            }
        }
    }
    Ok(())
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
