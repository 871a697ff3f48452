//! Render-Kind Handlers
//!
//! Maps a render-kind tag to the function that writes a resolved value into
//! its target. Tags are add-only: registering an existing tag fails.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::compiled::RenderKind;
use crate::dom::{Document, DomError, NodeId, NodeKind};
use crate::error::{CompilerError, Result};

use super::value::{format_number, Value};

/// Where a binding writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Content of the host node.
    Content(NodeId),
    /// Named attribute of the host node.
    Attribute { node: NodeId, name: String },
}

impl Target {
    pub fn node(&self) -> NodeId {
        match self {
            Target::Content(node) | Target::Attribute { node, .. } => *node,
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, Target::Attribute { .. })
    }
}

/// Render-time failure of one binding.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Value of type {0} is not invokable")]
    NotInvokable(&'static str),

    #[error("{0}")]
    Custom(String),

    /// Provider failures are not recoverable.
    #[error(transparent)]
    Dom(#[from] DomError),
}

pub type Handler =
    Arc<dyn Fn(&mut dyn Document, &Target, &Value) -> std::result::Result<(), HandlerError> + Send + Sync>;

/// Handlers keyed by render-kind tag.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Handler>,
}

impl HandlerRegistry {
    /// Registry without any handler.
    pub fn empty() -> Self {
        HandlerRegistry {
            handlers: IndexMap::new(),
        }
    }

    pub fn register<F>(&mut self, tag: impl Into<String>, handler: F) -> Result<&mut Self>
    where
        F: Fn(&mut dyn Document, &Target, &Value) -> std::result::Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        let tag = tag.into();
        if self.handlers.contains_key(&tag) {
            return Err(CompilerError::HandlerExists(tag));
        }
        self.handlers.insert(tag, Arc::new(handler));
        Ok(self)
    }

    pub fn get(&self, tag: &str) -> Option<&Handler> {
        self.handlers.get(tag)
    }

    pub fn handler_for(&self, kind: &RenderKind) -> Option<Handler> {
        self.handlers.get(kind.tag()).cloned()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut handlers: IndexMap<String, Handler> = IndexMap::new();
        handlers.insert(RenderKind::Function.tag().to_string(), Arc::new(render_function));
        handlers.insert(RenderKind::Escaped.tag().to_string(), Arc::new(render_escaped));
        handlers.insert(RenderKind::Literal.tag().to_string(), Arc::new(render_literal));
        handlers.insert(RenderKind::Numeral.tag().to_string(), Arc::new(render_numeral));
        handlers.insert(RenderKind::Fragment.tag().to_string(), Arc::new(render_literal));
        HandlerRegistry { handlers }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tags", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn assign_attribute(
    doc: &mut dyn Document,
    node: NodeId,
    name: &str,
    value: &Value,
) -> std::result::Result<(), HandlerError> {
    doc.set_attribute_value(node, name, value)?;
    Ok(())
}

/// Invoke, then escape the result. Attributes receive the function itself.
pub fn render_function(
    doc: &mut dyn Document,
    target: &Target,
    value: &Value,
) -> std::result::Result<(), HandlerError> {
    match target {
        Target::Attribute { node, name } => assign_attribute(doc, *node, name, value),
        Target::Content(_) => {
            let result = value
                .invoke()
                .ok_or(HandlerError::NotInvokable(value.type_name()))?;
            render_escaped(doc, target, &result)
        }
    }
}

/// Text content: update the existing text child in place or append one.
pub fn render_escaped(
    doc: &mut dyn Document,
    target: &Target,
    value: &Value,
) -> std::result::Result<(), HandlerError> {
    match target {
        Target::Attribute { node, name } => assign_attribute(doc, *node, name, value),
        Target::Content(node) => {
            let text = value.to_text();
            match doc.first_child(*node)? {
                Some(child) if doc.kind(child)? == NodeKind::Text => doc.set_text(child, &text)?,
                _ => {
                    let text_node = doc.create_text_node(&text);
                    doc.append_child(*node, text_node)?;
                }
            }
            Ok(())
        }
    }
}

/// Raw markup content.
pub fn render_literal(
    doc: &mut dyn Document,
    target: &Target,
    value: &Value,
) -> std::result::Result<(), HandlerError> {
    match target {
        Target::Attribute { node, name } => assign_attribute(doc, *node, name, value),
        Target::Content(node) => {
            doc.set_inner_markup(*node, &value.to_text())?;
            Ok(())
        }
    }
}

/// Finite numbers as written; anything else becomes `NaN`.
pub fn render_numeral(
    doc: &mut dyn Document,
    target: &Target,
    value: &Value,
) -> std::result::Result<(), HandlerError> {
    let numeral = match value.as_finite_number() {
        Some(n) => Value::String(format_number(n)),
        None => Value::String("NaN".to_string()),
    };
    render_literal(doc, target, &numeral)
}
