//! Markup Tree Builder
//!
//! Turns the lexer's token stream into nodes of an [`ArenaDocument`] under a
//! fresh fragment. Parsing is lenient: structural problems are reported as
//! errors and repaired the way browsers do for this subset.

use std::ops::Range;

use crate::parse_util::{ParseError, ParseSourceFile};
use crate::runtime::Value;

use super::arena::{ArenaDocument, NodeData};
use super::lexer::{tokenize, Token};
use super::tags::get_html_tag_definition;
use super::{Document, NodeId};

/// Parse tree result
#[derive(Debug, Clone)]
pub struct ParseTreeResult {
    /// Detached fragment holding the parsed nodes.
    pub root: NodeId,
    pub errors: Vec<ParseError>,
}

struct OpenElement {
    id: NodeId,
    name: String,
    span: Range<usize>,
}

pub struct TreeBuilder<'d> {
    doc: &'d mut ArenaDocument,
    container_stack: Vec<OpenElement>,
    root: Option<NodeId>,
    errors: Vec<ParseError>,
}

impl<'d> TreeBuilder<'d> {
    pub fn new(doc: &'d mut ArenaDocument) -> Self {
        TreeBuilder {
            doc,
            container_stack: Vec::new(),
            root: None,
            errors: Vec::new(),
        }
    }

    pub fn build(mut self, markup: &str, url: &str) -> ParseTreeResult {
        let file = ParseSourceFile::new(markup, url);
        let tokenized = tokenize(markup, url);
        self.errors.extend(tokenized.errors);

        let root = self.doc.create_fragment();
        self.root = Some(root);

        for token in tokenized.tokens {
            match token {
                Token::TagOpen {
                    name,
                    attrs,
                    self_closing,
                    span,
                } => self.consume_element_start_tag(name, attrs, self_closing, span),
                Token::TagClose { name, span } => self.consume_element_end_tag(&file, name, span),
                Token::Text { value, .. } => {
                    let node = self.doc.create_text_node(&value);
                    self.add_to_parent(node);
                }
                Token::Comment { value, .. } => {
                    let node = self.doc.create_comment(&value);
                    self.add_to_parent(node);
                }
                Token::DocType { value, .. } => {
                    let node = self.doc.create_doctype(&value);
                    self.add_to_parent(node);
                }
            }
        }

        while let Some(open) = self.container_stack.pop() {
            if get_html_tag_definition(&open.name).closed_by_children.is_empty() {
                self.add_error(
                    &file,
                    format!("Unclosed element \"{}\"", open.name),
                    open.span,
                );
            }
        }

        ParseTreeResult {
            root,
            errors: self.errors,
        }
    }

    fn consume_element_start_tag(
        &mut self,
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        span: Range<usize>,
    ) {
        // `<li>a<li>b` closes the first item
        while let Some(top) = self.container_stack.last() {
            if get_html_tag_definition(&top.name).is_closed_by_child(&name) {
                self.container_stack.pop();
            } else {
                break;
            }
        }

        let mut element_attrs: Vec<(String, Value)> = Vec::with_capacity(attrs.len());
        for (attr_name, value) in attrs {
            // Duplicates keep the first occurrence.
            if element_attrs.iter().any(|(n, _)| *n == attr_name) {
                continue;
            }
            element_attrs.push((attr_name, Value::String(value)));
        }
        let element = self.doc.alloc(NodeData::Element {
            name: name.clone(),
            attrs: element_attrs,
        });
        self.add_to_parent(element);

        let tag_def = get_html_tag_definition(&name);
        if !tag_def.is_void && !self_closing {
            self.container_stack.push(OpenElement {
                id: element,
                name,
                span,
            });
        }
    }

    fn consume_element_end_tag(&mut self, file: &ParseSourceFile, name: String, span: Range<usize>) {
        if get_html_tag_definition(&name).is_void {
            self.add_error(
                file,
                format!("Void elements do not have end tags \"{}\"", name),
                span,
            );
            return;
        }

        let match_index = self
            .container_stack
            .iter()
            .rposition(|open| open.name == name);

        match match_index {
            Some(idx) => {
                while self.container_stack.len() > idx + 1 {
                    if let Some(open) = self.container_stack.pop() {
                        if get_html_tag_definition(&open.name).closed_by_children.is_empty() {
                            self.add_error(
                                file,
                                format!("Unclosed element \"{}\"", open.name),
                                open.span,
                            );
                        }
                    }
                }
                self.container_stack.pop();
            }
            None => self.add_error(
                file,
                format!("Unexpected closing tag \"{}\"", name),
                span,
            ),
        }
    }

    fn add_to_parent(&mut self, node: NodeId) {
        let parent = match self.container_stack.last() {
            Some(open) => open.id,
            None => match self.root {
                Some(root) => root,
                None => return,
            },
        };
        // Freshly allocated nodes cannot form cycles.
        let _ = self.doc.append_child(parent, node);
    }

    fn add_error(&mut self, file: &ParseSourceFile, msg: String, span: Range<usize>) {
        self.errors
            .push(ParseError::new(file.span(span.start, span.end), msg));
    }
}
