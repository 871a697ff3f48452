//! Block Structure Parser
//!
//! Converts `{{#name args}} … {{/name}}` regions of raw template text into
//! a block tree, then fuses the tree back into markup in which every block
//! is a `<div data-poirot-block="name args">` container.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{CompilerConfig, BLOCK_MARKER_ATTR};
use crate::parse_util::{ParseError, ParseSourceFile};

static BLOCK_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([#$/^])\s*([\w.]+)(?:\s+([\w.]+))?\s*\}\}").unwrap());

static MARKER_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r#"{}="([^"]*)""#, BLOCK_MARKER_ATTR)).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Block(BlockNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub name: String,
    pub args: Option<String>,
    pub fragments: Vec<Fragment>,
}

impl BlockNode {
    /// `name` or `name args`, as written into the block marker.
    pub fn identity(&self) -> String {
        match &self.args {
            Some(args) => format!("{} {}", self.name, args),
            None => self.name.clone(),
        }
    }
}

struct OpenBlock {
    node: BlockNode,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone)]
pub struct BlockParser {
    url: String,
    alternate_open: bool,
}

impl BlockParser {
    pub fn new(url: impl Into<String>, config: &CompilerConfig) -> Self {
        BlockParser {
            url: url.into(),
            alternate_open: config.alternate_block_open,
        }
    }

    /// Parse `text` into the fragments of the implicit root block.
    pub fn split_blocks(&self, text: &str) -> Result<Vec<Fragment>, ParseError> {
        let file = ParseSourceFile::new(text, self.url.as_str());
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut root: Vec<Fragment> = Vec::new();
        let mut last_index = 0;

        for caps in BLOCK_REGEXP.captures_iter(text) {
            let (Some(whole), Some(tp), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let args = caps.get(3).map(|m| m.as_str().to_string());
            let preamble = &text[last_index..whole.start()];
            last_index = whole.end();

            let fragments = match stack.last_mut() {
                Some(top) => &mut top.node.fragments,
                None => &mut root,
            };
            if !preamble.is_empty() {
                fragments.push(Fragment::Text(preamble.to_string()));
            }

            match tp.as_str() {
                open if open == "#" || (open == "^" && self.alternate_open) => stack.push(OpenBlock {
                    node: BlockNode {
                        name: name.as_str().to_string(),
                        args,
                        fragments: Vec::new(),
                    },
                    start: whole.start(),
                    end: whole.end(),
                }),
                "/" => {
                    let closed = match stack.pop() {
                        Some(top) if top.node.name == name.as_str() => top,
                        Some(top) => {
                            let opened = file.span(top.start, top.end).start;
                            return Err(ParseError::new(
                                file.span(whole.start(), whole.end())
                                    .with_details(format!("block opened at {}", opened)),
                                format!(
                                    "Block tag mismatch: expected closing {{{{/{}}}}}, found {}",
                                    top.node.name,
                                    whole.as_str()
                                ),
                            ))
                        }
                        None => {
                            return Err(ParseError::new(
                                file.span(whole.start(), whole.end()),
                                format!(
                                    "Block tag mismatch: trying to close {}, but there is no opening tag",
                                    whole.as_str()
                                ),
                            ))
                        }
                    };
                    let parent = match stack.last_mut() {
                        Some(top) => &mut top.node.fragments,
                        None => &mut root,
                    };
                    parent.push(Fragment::Block(closed.node));
                }
                other => {
                    return Err(ParseError::new(
                        file.span(whole.start(), whole.end()),
                        format!("Unexpected block format '{}' in {}", other, whole.as_str()),
                    ))
                }
            }
        }

        if let Some(unclosed) = stack.last() {
            return Err(ParseError::new(
                file.span(unclosed.start, unclosed.end),
                format!(
                    "Block tag mismatch: missing closing tag for {}",
                    &text[unclosed.start..unclosed.end]
                ),
            ));
        }
        if last_index < text.len() {
            root.push(Fragment::Text(text[last_index..].to_string()));
        }
        Ok(root)
    }

    /// Parse and fuse in one step.
    pub fn blockify(&self, text: &str) -> Result<String, ParseError> {
        Ok(fuse_blocks(&self.split_blocks(text)?))
    }
}

/// Render fragments back to markup with block markers.
pub fn fuse_blocks(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        fuse_fragment(fragment, &mut out);
    }
    out
}

fn fuse_fragment(fragment: &Fragment, out: &mut String) {
    match fragment {
        Fragment::Text(text) => out.push_str(text),
        Fragment::Block(block) => {
            out.push_str(&format!("<div {}=\"{}\">", BLOCK_MARKER_ATTR, block.identity()));
            for child in &block.fragments {
                fuse_fragment(child, out);
            }
            out.push_str("</div>");
        }
    }
}

/// Block identities found in fused markup, in document order.
pub fn parse_markers(markup: &str) -> Vec<String> {
    MARKER_REGEXP
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
