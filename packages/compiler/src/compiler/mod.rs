//! Template Compiler
//!
//! Walks a parsed node tree, turns every directive into a binding on a host
//! node, extracts block regions into nested sub-templates and emits the
//! rewritten markup together with the per-host reference table.

mod host;

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::block_parser::BlockParser;
use crate::chars;
use crate::compiled::{BindingDescriptor, CompiledTemplate, Reference};
use crate::config::{CompilerConfig, BLOCK_MARKER_ATTR, HOST_MARKER_ATTR};
use crate::dom::{first_element_child, Document, DomError, NodeId, NodeKind};
use crate::error::{CompilerError, Result};
use crate::logging::{Logger, NullLogger};
use crate::scanner::{trailing, InterpolationScanner, Match};

use host::HostTable;

static FULL_DOCUMENT_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(<!doctype [^>\n]+>\n)?<html").unwrap());

bitflags! {
    /// Position of a node in the walk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct WalkFlags: u8 {
        /// Root of the template being built.
        const ROOT = 0b01;
        /// Root of a block region compiled as a sub-template.
        const SUB_TEMPLATE_ROOT = 0b10;
    }
}

/// Entry point of the compiler.
#[derive(Clone)]
pub struct Compiler {
    config: CompilerConfig,
    logger: Arc<dyn Logger>,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Compiler {
            config,
            logger: Arc::new(NullLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile template source. `name` appears in error positions.
    pub fn compile(
        &self,
        doc: &mut dyn Document,
        source: &str,
        name: &str,
    ) -> Result<CompiledTemplate> {
        let blockified = BlockParser::new(name, &self.config).blockify(source)?;
        let root = self.materialize_root(doc, &blockified)?;
        self.compile_node(doc, root, name)
    }

    /// Compile an already materialized tree rooted at `root`. The tree is
    /// rewritten in place.
    pub fn compile_node(
        &self,
        doc: &mut dyn Document,
        root: NodeId,
        name: &str,
    ) -> Result<CompiledTemplate> {
        self.trace(|| format!("compile {}", name));
        TemplateBuilder::new(self, name).create(doc, root, WalkFlags::ROOT)
    }

    fn materialize_root(&self, doc: &mut dyn Document, blockified: &str) -> Result<NodeId> {
        let markup = if FULL_DOCUMENT_REGEXP.is_match(blockified) {
            blockified.to_string()
        } else {
            format!(
                "<{tag} class=\"{class}\">{inner}</{tag}>",
                tag = self.config.root_tag,
                class = self.config.root_class,
                inner = blockified
            )
        };
        let fragment = doc.parse_markup(&markup)?;
        first_element_child(doc, fragment)?
            .ok_or_else(|| DomError::Markup("template has no root element".to_string()).into())
    }

    fn trace(&self, msg: impl FnOnce() -> String) {
        if self.config.verbose {
            self.logger.debug(&msg());
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

/// Builds one template (or sub-template) from a subtree.
struct TemplateBuilder<'c> {
    compiler: &'c Compiler,
    name: &'c str,
    scanner: InterpolationScanner,
    hosts: HostTable,
    block_expr: Option<String>,
}

impl<'c> TemplateBuilder<'c> {
    fn new(compiler: &'c Compiler, name: &'c str) -> Self {
        TemplateBuilder {
            compiler,
            name,
            scanner: InterpolationScanner::new(name),
            hosts: HostTable::new(),
            block_expr: None,
        }
    }

    fn trace(&self, msg: impl FnOnce() -> String) {
        self.compiler.trace(msg);
    }

    fn create(
        mut self,
        doc: &mut dyn Document,
        root: NodeId,
        flags: WalkFlags,
    ) -> Result<CompiledTemplate> {
        self.process_node(doc, root, flags)?;
        self.emit(doc, root)
    }

    fn process_node(&mut self, doc: &mut dyn Document, node: NodeId, flags: WalkFlags) -> Result<()> {
        match doc.kind(node)? {
            NodeKind::Text => self.process_text_node(doc, node),
            NodeKind::Element => self.process_element(doc, node, flags),
            NodeKind::Comment | NodeKind::Doctype | NodeKind::Fragment => Ok(()),
        }
    }

    fn process_element(
        &mut self,
        doc: &mut dyn Document,
        element: NodeId,
        flags: WalkFlags,
    ) -> Result<()> {
        self.trace(|| format!("process element <{}>", doc.tag_name(element).unwrap_or_default()));
        self.process_attributes(doc, element)?;

        if flags.contains(WalkFlags::SUB_TEMPLATE_ROOT) {
            self.block_expr = doc.attribute(element, BLOCK_MARKER_ATTR)?;
            doc.remove_attribute(element, BLOCK_MARKER_ATTR)?;
        } else if !flags.contains(WalkFlags::ROOT) && !doc.has_attribute(element, BLOCK_MARKER_ATTR)? {
            self.promote_block_child(doc, element)?;
        }

        let is_root = flags.contains(WalkFlags::ROOT);
        if !is_root && doc.has_attribute(element, BLOCK_MARKER_ATTR)? {
            return self.add_sub_template(doc, element);
        }

        if !flags.contains(WalkFlags::SUB_TEMPLATE_ROOT) {
            if let Some(m) = self.only_mustache_child(doc, element)? {
                self.process_content(element, &m, None)?;
                crate::dom::discard_children(doc, element)?;
                return Ok(());
            }
        }

        for child in doc.children(element)? {
            self.process_node(doc, child, WalkFlags::empty())?;
        }
        Ok(())
    }

    fn process_attributes(&mut self, doc: &mut dyn Document, element: NodeId) -> Result<()> {
        for name in doc.attribute_names(element)? {
            if name == BLOCK_MARKER_ATTR {
                continue;
            }
            let Some(value) = doc.attribute(element, &name)? else {
                continue;
            };
            if let Some(m) = self.scanner.match_one(&value)? {
                self.trace(|| format!("process attribute {}=\"{}\"", name, value));
                self.process_content(element, &m, Some(&name))?;
                doc.set_attribute(element, &name, "")?;
            }
        }
        Ok(())
    }

    fn only_mustache_child(&self, doc: &dyn Document, element: NodeId) -> Result<Option<Match>> {
        let children = doc.children(element)?;
        if children.len() != 1 || doc.kind(children[0])? != NodeKind::Text {
            return Ok(None);
        }
        Ok(self.scanner.whole_match(&doc.text(children[0])?)?)
    }

    /// The marker child of `element` when it is its only non-blank child.
    fn sole_block_child(&self, doc: &dyn Document, element: NodeId) -> Result<Option<NodeId>> {
        let mut found = None;
        for child in doc.children(element)? {
            match doc.kind(child)? {
                NodeKind::Text if chars::is_blank(&doc.text(child)?) => continue,
                NodeKind::Element
                    if found.is_none() && doc.has_attribute(child, BLOCK_MARKER_ATTR)? =>
                {
                    found = Some(child)
                }
                _ => return Ok(None),
            }
        }
        Ok(found)
    }

    /// Merge a sole block-marker child into `element`.
    fn promote_block_child(&self, doc: &mut dyn Document, element: NodeId) -> Result<()> {
        let Some(marker) = self.sole_block_child(doc, element)? else {
            return Ok(());
        };
        let identity = doc.attribute(marker, BLOCK_MARKER_ATTR)?.unwrap_or_default();
        self.trace(|| format!("promote block '{}'", identity));
        doc.set_attribute(element, BLOCK_MARKER_ATTR, &identity)?;
        crate::dom::clear_children(doc, element)?;
        crate::dom::move_children(doc, marker, element)?;
        doc.release(marker)?;
        Ok(())
    }

    fn add_sub_template(&mut self, doc: &mut dyn Document, element: NodeId) -> Result<()> {
        let tag_name = doc.tag_name(element)?;
        self.trace(|| {
            format!(
                "add sub-template <{}> '{}'",
                tag_name,
                doc.attribute(element, BLOCK_MARKER_ATTR).ok().flatten().unwrap_or_default()
            )
        });

        let placeholder = doc.create_element(&tag_name);
        for name in doc.attribute_names(element)? {
            if name == BLOCK_MARKER_ATTR {
                continue;
            }
            if let Some(value) = doc.attribute_value(element, &name)? {
                doc.set_attribute_value(placeholder, &name, &value)?;
            }
            doc.remove_attribute(element, &name)?;
        }

        let parent = doc.parent(element)?.ok_or_else(|| {
            CompilerError::Dom(DomError::Markup(format!(
                "block element <{}> has no parent",
                tag_name
            )))
        })?;
        doc.replace_child(parent, placeholder, element)?;
        if self.hosts.rekey(element, placeholder).is_none() {
            self.hosts.host_for(placeholder);
        }

        let sub = TemplateBuilder::new(self.compiler, self.name).create(
            doc,
            element,
            WalkFlags::ROOT | WalkFlags::SUB_TEMPLATE_ROOT,
        )?;
        let host = self.hosts.host_for(placeholder);
        self.hosts.push(host, Reference::Template(Arc::new(sub)));
        Ok(())
    }

    fn process_text_node(&mut self, doc: &mut dyn Document, node: NodeId) -> Result<()> {
        let text = doc.text(node)?;
        let matches = self.scanner.match_all(&text)?;
        if matches.is_empty() {
            return Ok(());
        }
        self.trace(|| format!("process text \"{}\"", text));
        let Some(parent) = doc.parent(node)? else {
            return Ok(());
        };
        let wrapper_tag = self.compiler.config.wrapper_tag.clone();

        for m in &matches {
            if !m.preamble.is_empty() {
                let preamble = doc.create_text_node(&m.preamble);
                doc.insert_before(parent, preamble, node)?;
            }
            let wrapper = doc.create_element(&wrapper_tag);
            doc.insert_before(parent, wrapper, node)?;
            self.process_content(wrapper, m, None)?;
        }
        let rest = trailing(&text, &matches);
        if !rest.is_empty() {
            let post = doc.create_text_node(rest);
            doc.insert_before(parent, post, node)?;
        }
        doc.remove_child(parent, node)?;
        Ok(())
    }

    fn process_content(&mut self, node: NodeId, m: &Match, attribute: Option<&str>) -> Result<()> {
        let directive = m.directive()?;
        let mut descriptor = BindingDescriptor::new(directive.kind, directive.key);
        if let Some(name) = attribute {
            descriptor = descriptor.with_attribute(name);
        }
        if let Some(block_name) = directive.block_name {
            descriptor = descriptor.with_block_name(block_name);
        }
        self.trace(|| {
            format!(
                "add reference {} [{}] on {:?}",
                descriptor.key, descriptor.kind, node
            )
        });
        let host = self.hosts.host_for(node);
        self.hosts.push(host, Reference::Binding(descriptor));
        Ok(())
    }

    /// Mark hosts in a copy of the tree and collect their references in
    /// document order.
    fn emit(mut self, doc: &mut dyn Document, root: NodeId) -> Result<CompiledTemplate> {
        let emitted = doc.clone_node(root, true)?;
        let mut references = Vec::with_capacity(self.hosts.len());
        let mut stack = vec![(root, emitted)];
        while let Some((original, copy)) = stack.pop() {
            if let Some(slot) = self.hosts.take_slot(original) {
                doc.set_attribute(copy, HOST_MARKER_ATTR, "")?;
                references.push(slot);
            }
            let originals = doc.children(original)?;
            let copies = doc.children(copy)?;
            for pair in originals.into_iter().zip(copies).rev() {
                stack.push(pair);
            }
        }

        let marker = format!("{}=\"\"", HOST_MARKER_ATTR);
        let html = doc.serialize(emitted)?.replace(&marker, HOST_MARKER_ATTR);
        Ok(CompiledTemplate::new(references, &html, self.block_expr.take()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::RenderKind;
    use crate::dom::ArenaDocument;

    fn compile(source: &str) -> CompiledTemplate {
        let mut doc = ArenaDocument::new();
        Compiler::default().compile(&mut doc, source, "test").unwrap()
    }

    fn binding(reference: &Reference) -> &BindingDescriptor {
        match reference {
            Reference::Binding(b) => b,
            Reference::Template(_) => panic!("expected binding"),
        }
    }

    #[test]
    fn should_bind_sole_mustache_content() {
        let compiled = compile("<p>{{ name }}</p>");
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><p data-poirot></p></div>"
        );
        assert_eq!(binding(&compiled.references[0][0]).key, "name");
    }

    #[test]
    fn should_share_one_host_between_attributes() {
        let compiled = compile("<a href=\"{{url}}\" title=\"{{{title}}}\">x</a>");
        assert_eq!(compiled.host_count(), 1);
        let slot = &compiled.references[0];
        assert_eq!(binding(&slot[0]).attribute.as_deref(), Some("href"));
        assert_eq!(binding(&slot[1]).kind, RenderKind::Literal);
        assert!(compiled.html().contains("href=\"\""));
    }

    #[test]
    fn should_split_mixed_text() {
        let compiled = compile("<p>Hi {{a}}, {{b}}!</p>");
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><p>Hi <span data-poirot></span>, <span data-poirot></span>!</p></div>"
        );
        assert_eq!(compiled.host_count(), 2);
    }

    #[test]
    fn should_promote_sole_block_child() {
        let compiled = compile("<ul>\n  {{#data p}}<li>{{ p.foo }}</li>{{/data}}\n</ul>");
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><ul data-poirot></ul></div>"
        );
        let Reference::Template(sub) = &compiled.references[0][0] else {
            panic!("expected sub-template");
        };
        assert_eq!(sub.block_expr.as_deref(), Some("data p"));
        assert_eq!(sub.html(), "<ul><li data-poirot></li></ul>");
    }

    #[test]
    fn should_keep_block_at_template_root_as_sub_template() {
        let compiled = compile("{{#items i}}<b>{{i}}</b>{{/items}}");
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><div data-poirot></div></div>"
        );
        assert_eq!(compiled.sub_templates().count(), 1);
    }

    #[test]
    fn should_bind_block_element_attributes_on_placeholder() {
        let compiled = compile("<ul class=\"{{cls}}\" id=\"list\">{{#data p}}<li>{{p}}</li>{{/data}}</ul>");
        let slot = &compiled.references[0];
        assert_eq!(binding(&slot[0]).attribute.as_deref(), Some("class"));
        assert!(matches!(slot[1], Reference::Template(_)));
        assert!(compiled.html().contains("<ul class=\"\" id=\"list\" data-poirot></ul>"));
        let sub = compiled.sub_templates().next().unwrap();
        assert_eq!(sub.html(), "<ul><li data-poirot></li></ul>");
    }

    #[test]
    fn should_use_html_element_for_full_documents() {
        let compiled = compile("<!doctype html>\n<html><body><p>{{x}}</p></body></html>");
        assert!(compiled.html().starts_with("<html>"));
        assert_eq!(compiled.host_count(), 1);
    }

    #[test]
    fn should_reject_malformed_blocks_without_output() {
        let mut doc = ArenaDocument::new();
        let err = Compiler::default()
            .compile(&mut doc, "{{#a}}{{/b}}", "bad.html")
            .unwrap_err();
        assert!(err.as_parse_error().is_some());
        assert!(err.to_string().contains("bad.html@0:6"));
    }

    #[test]
    fn should_trace_when_verbose() {
        let logger = Arc::new(crate::logging::MemoryLogger::new(crate::logging::LogLevel::Debug));
        let compiler = Compiler::new(CompilerConfig::default().with_verbose(true))
            .with_logger(logger.clone());
        let mut doc = ArenaDocument::new();
        compiler.compile(&mut doc, "<p>{{a}}</p>", "t").unwrap();
        assert!(logger.lines().iter().any(|l| l.contains("add reference a")));
    }
}
