//! Iteration regions
//!
//! A sub-template bound to a container node is re-rendered once per element
//! of its source sequence. Every render discards the container's previous
//! children first.

use crate::dom::{discard_children, move_children, Document, NodeId};
use crate::error::{CompilerError, Result};

use super::context::Scope;
use super::template::Template;
use super::value::Value;
use super::Environment;

/// Parsed `"<source> <alias>"` iteration expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    pub source: String,
    pub alias: Option<String>,
}

impl Iteration {
    pub fn parse(expr: &str) -> Result<Self> {
        let mut parts = expr.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(source), alias, None) => Ok(Iteration {
                source: source.to_string(),
                alias: alias.map(str::to_string),
            }),
            _ => Err(CompilerError::IterationExpression(expr.to_string())),
        }
    }
}

/// Sub-template attached to an iteration container.
#[derive(Debug)]
pub(crate) struct ChildTemplate {
    pub template: std::sync::Arc<Template>,
    pub container: NodeId,
    pub iteration: Iteration,
}

impl ChildTemplate {
    pub(crate) fn render_iter_sub_template(
        &self,
        doc: &mut dyn Document,
        scope: &Scope<'_>,
        env: &Environment,
    ) -> Result<()> {
        let Some(source) = scope.resolve(&self.iteration.source) else {
            return Ok(());
        };
        let items = match source {
            Value::Array(items) => items,
            Value::Null => {
                discard_children(doc, self.container)?;
                return Ok(());
            }
            other => {
                env.logger.error(&format!(
                    "Failed to render iteration '{}': expected an array, found {:?}",
                    self.iteration.source, other
                ));
                return Ok(());
            }
        };

        discard_children(doc, self.container)?;
        for item in items {
            let instance = self.template.clone_sub(doc)?;
            match &self.iteration.alias {
                Some(alias) => instance.render_scope(doc, &scope.with_alias(alias, item))?,
                None => instance.render_scope(doc, &scope.with_overlay(item))?,
            };
            move_children(doc, instance.root(), self.container)?;
            doc.release(instance.root())?;
        }
        Ok(())
    }
}
