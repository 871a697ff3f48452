//! Runtime Template
//!
//! Materializes compiled markup, resolves every reference slot to its host
//! node once, and re-applies the bindings on each `render` call.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::compiled::{BindingDescriptor, CompiledTemplate, Reference};
use crate::config::{BLOCK_MARKER_ATTR, HOST_MARKER_ATTR};
use crate::dom::{first_element_child, Document, DomError, NodeId, NodeKind};
use crate::error::{CompilerError, Result};

use super::context::Scope;
use super::handlers::{Handler, HandlerError, Target};
use super::iteration::{ChildTemplate, Iteration};
use super::value::Value;
use super::Environment;

/// A binding resolved against the live tree.
#[derive(Clone)]
pub struct BoundBinding {
    pub descriptor: BindingDescriptor,
    pub target: Target,
    handler: Handler,
}

impl std::fmt::Debug for BoundBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundBinding")
            .field("descriptor", &self.descriptor)
            .field("target", &self.target)
            .finish()
    }
}

type BindingList = SmallVec<[BoundBinding; 2]>;

#[derive(Debug)]
pub struct Template {
    compiled: Arc<CompiledTemplate>,
    env: Environment,
    /// Pristine copy of the materialized markup, markers included.
    prototype: NodeId,
    root: NodeId,
    bindings: IndexMap<String, BindingList>,
    children: Vec<ChildTemplate>,
}

impl Template {
    pub fn new(doc: &mut dyn Document, compiled: Arc<CompiledTemplate>) -> Result<Self> {
        Self::with_environment(doc, compiled, Environment::default())
    }

    /// Materialize the compiled markup through `doc` and bind it.
    pub fn with_environment(
        doc: &mut dyn Document,
        compiled: Arc<CompiledTemplate>,
        env: Environment,
    ) -> Result<Self> {
        let fragment = doc.parse_markup(&compiled.html())?;
        let prototype = first_element_child(&*doc, fragment)?.ok_or_else(|| {
            CompilerError::Dom(DomError::Markup(
                "compiled markup has no root element".to_string(),
            ))
        })?;
        let root = doc.clone_node(prototype, true)?;
        Self::bind(doc, compiled, env, prototype, root, None)
    }

    /// Bind an already materialized tree. `root` becomes the live tree.
    pub fn from_node(
        doc: &mut dyn Document,
        compiled: Arc<CompiledTemplate>,
        env: Environment,
        root: NodeId,
    ) -> Result<Self> {
        let prototype = doc.clone_node(root, true)?;
        Self::bind(doc, compiled, env, prototype, root, None)
    }

    /// Fresh instance with its own tree, sharing the compiled form.
    pub fn clone(&self, doc: &mut dyn Document) -> Result<Template> {
        let root = doc.clone_node(self.prototype, true)?;
        Self::bind(
            doc,
            Arc::clone(&self.compiled),
            self.env.clone(),
            self.prototype,
            root,
            Some(&self.children),
        )
    }

    /// Fresh instance whose root is a bare copy of the template root holding
    /// copies of all its children.
    pub fn clone_sub(&self, doc: &mut dyn Document) -> Result<Template> {
        let root = doc.clone_node(self.prototype, false)?;
        for child in doc.children(self.prototype)? {
            let copy = doc.clone_node(child, true)?;
            doc.append_child(root, copy)?;
        }
        Self::bind(
            doc,
            Arc::clone(&self.compiled),
            self.env.clone(),
            self.prototype,
            root,
            Some(&self.children),
        )
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn compiled(&self) -> &Arc<CompiledTemplate> {
        &self.compiled
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Context keys in application order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn bindings_for(&self, key: &str) -> &[BoundBinding] {
        self.bindings.get(key).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Iteration containers in render order.
    pub fn iteration_containers(&self) -> impl Iterator<Item = (NodeId, &Iteration)> {
        self.children.iter().map(|c| (c.container, &c.iteration))
    }

    fn bind(
        doc: &mut dyn Document,
        compiled: Arc<CompiledTemplate>,
        env: Environment,
        prototype: NodeId,
        root: NodeId,
        inherited: Option<&[ChildTemplate]>,
    ) -> Result<Template> {
        let mut template = Template {
            compiled: Arc::clone(&compiled),
            env,
            prototype,
            root,
            bindings: IndexMap::new(),
            children: Vec::new(),
        };

        let mut slots = compiled.references.iter();
        let mut markers = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if doc.kind(node)? != NodeKind::Element {
                continue;
            }
            if doc.has_attribute(node, HOST_MARKER_ATTR)? {
                markers += 1;
                let slot = slots.next().ok_or_else(|| {
                    CompilerError::ReferenceMismatch(format!(
                        "host marker #{} has no reference slot ({} slots)",
                        markers,
                        compiled.references.len()
                    ))
                })?;
                template.bind_node(doc, node, slot, inherited)?;
                if !template.env.keep_markers {
                    doc.remove_attribute(node, HOST_MARKER_ATTR)?;
                }
            }
            // Embedded sub-template roots are bound by their own instance.
            if node != root && doc.has_attribute(node, BLOCK_MARKER_ATTR)? {
                continue;
            }
            for child in doc.children(node)?.into_iter().rev() {
                stack.push(child);
            }
        }

        let unused = slots.count();
        if unused > 0 {
            return Err(CompilerError::ReferenceMismatch(format!(
                "{} reference slots have no host marker ({} markers)",
                unused, markers
            )));
        }
        Ok(template)
    }

    fn bind_node(
        &mut self,
        doc: &mut dyn Document,
        node: NodeId,
        slot: &[Reference],
        inherited: Option<&[ChildTemplate]>,
    ) -> Result<()> {
        for reference in slot {
            match reference {
                Reference::Template(sub) => {
                    let index = self.children.len();
                    let template = match inherited.and_then(|children| children.get(index)) {
                        Some(child) => Arc::clone(&child.template),
                        None => Arc::new(Template::with_environment(
                            doc,
                            Arc::clone(sub),
                            self.env.clone(),
                        )?),
                    };
                    let expr = sub.block_expr.as_deref().unwrap_or_default();
                    self.children.push(ChildTemplate {
                        template,
                        container: node,
                        iteration: Iteration::parse(expr)?,
                    });
                }
                Reference::Binding(descriptor) => {
                    let handler = self
                        .env
                        .registry
                        .handler_for(&descriptor.kind)
                        .ok_or_else(|| {
                            CompilerError::UnknownRenderKind(descriptor.kind.tag().to_string())
                        })?;
                    let target = match &descriptor.attribute {
                        Some(name) => Target::Attribute {
                            node,
                            name: name.clone(),
                        },
                        None => Target::Content(node),
                    };
                    self.bindings
                        .entry(descriptor.key.clone())
                        .or_default()
                        .push(BoundBinding {
                            descriptor: descriptor.clone(),
                            target,
                            handler,
                        });
                }
            }
        }
        Ok(())
    }

    /// Inject `context` into the live tree and return its root.
    pub fn render(&self, doc: &mut dyn Document, context: &Value) -> Result<NodeId> {
        self.render_scope(doc, &Scope::new(context))
    }

    pub fn render_scope(&self, doc: &mut dyn Document, scope: &Scope<'_>) -> Result<NodeId> {
        for (key, bound) in &self.bindings {
            let Some(value) = scope.resolve(key) else {
                continue;
            };
            for binding in bound {
                match (binding.handler)(doc, &binding.target, value) {
                    Ok(()) => {}
                    Err(HandlerError::Dom(err)) => return Err(err.into()),
                    Err(err) => self.env.logger.error(&format!(
                        "Failed to render value {:?} for '{}': {}",
                        value, key, err
                    )),
                }
            }
        }

        for child in &self.children {
            child.render_iter_sub_template(doc, scope, &self.env)?;
        }
        Ok(self.root)
    }
}
