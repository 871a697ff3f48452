//! Compiled Template Form
//!
//! What the compiler produces and the runtime consumes: per-host reference
//! lists, the rewritten markup and, for sub-templates, the iteration
//! expression. The serde field names are the compact artifact names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::config::HOST_MARKER_ATTR;

/// How a resolved value is written into its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderKind {
    Escaped,
    Literal,
    Numeral,
    Function,
    Fragment,
    /// Host-registered kind.
    Custom(String),
}

impl RenderKind {
    pub fn tag(&self) -> &str {
        match self {
            RenderKind::Escaped => "",
            RenderKind::Literal => "L",
            RenderKind::Numeral => "N",
            RenderKind::Function => "!",
            RenderKind::Fragment => "F",
            RenderKind::Custom(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "" => RenderKind::Escaped,
            "L" => RenderKind::Literal,
            "N" => RenderKind::Numeral,
            "!" => RenderKind::Function,
            "F" => RenderKind::Fragment,
            other => RenderKind::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for RenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderKind::Escaped => write!(f, "escaped"),
            RenderKind::Literal => write!(f, "literal"),
            RenderKind::Numeral => write!(f, "numeral"),
            RenderKind::Function => write!(f, "function"),
            RenderKind::Fragment => write!(f, "fragment"),
            RenderKind::Custom(tag) => write!(f, "custom '{}'", tag),
        }
    }
}

impl Serialize for RenderKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for RenderKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(RenderKind::from_tag(&tag))
    }
}

/// One interpolation site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDescriptor {
    #[serde(rename = "tp")]
    pub kind: RenderKind,
    pub key: String,
    #[serde(rename = "at", default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(rename = "bn", default, skip_serializing_if = "Option::is_none")]
    pub block_name: Option<String>,
}

impl BindingDescriptor {
    pub fn new(kind: RenderKind, key: impl Into<String>) -> Self {
        BindingDescriptor {
            kind,
            key: key.into(),
            attribute: None,
            block_name: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    pub fn with_block_name(mut self, name: impl Into<String>) -> Self {
        self.block_name = Some(name.into());
        self
    }
}

/// Entry of a host's reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Binding(BindingDescriptor),
    Template(Arc<CompiledTemplate>),
}

/// Rewritten markup, optionally split on the host marker token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Markup {
    Plain(String),
    Split(Vec<String>),
}

impl Markup {
    /// Pick the split form only when it encodes shorter than the plain string.
    pub fn compact(html: &str) -> Markup {
        let plain = Markup::Plain(html.to_string());
        if !html.contains(HOST_MARKER_ATTR) {
            return plain;
        }
        let split = Markup::Split(html.split(HOST_MARKER_ATTR).map(str::to_string).collect());
        match (serde_json::to_string(&plain), serde_json::to_string(&split)) {
            (Ok(p), Ok(s)) if s.len() < p.len() => split,
            _ => plain,
        }
    }

    pub fn html(&self) -> Cow<'_, str> {
        match self {
            Markup::Plain(html) => Cow::Borrowed(html),
            Markup::Split(parts) => Cow::Owned(parts.join(HOST_MARKER_ATTR)),
        }
    }
}

/// A compiled template or sub-template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledTemplate {
    /// One slot per host node, in document order.
    #[serde(rename = "refs")]
    pub references: Vec<Vec<Reference>>,
    #[serde(rename = "html")]
    pub markup: Markup,
    /// `"<source> <alias>"` for iteration sub-templates.
    #[serde(rename = "expr", default, skip_serializing_if = "Option::is_none")]
    pub block_expr: Option<String>,
}

impl CompiledTemplate {
    pub fn new(references: Vec<Vec<Reference>>, html: &str, block_expr: Option<String>) -> Self {
        CompiledTemplate {
            references,
            markup: Markup::compact(html),
            block_expr,
        }
    }

    pub fn html(&self) -> Cow<'_, str> {
        self.markup.html()
    }

    pub fn host_count(&self) -> usize {
        self.references.len()
    }

    /// Leaf bindings of this template, excluding nested sub-templates.
    pub fn bindings(&self) -> impl Iterator<Item = &BindingDescriptor> {
        self.references.iter().flatten().filter_map(|r| match r {
            Reference::Binding(b) => Some(b),
            Reference::Template(_) => None,
        })
    }

    pub fn sub_templates(&self) -> impl Iterator<Item = &CompiledTemplate> {
        self.references.iter().flatten().filter_map(|r| match r {
            Reference::Template(t) => Some(t.as_ref()),
            Reference::Binding(_) => None,
        })
    }
}
