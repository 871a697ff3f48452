//! HTML Tag Definitions
//!
//! Parsing rules the default document provider needs: void elements, raw
//! text content, and the handful of elements whose end tag may be omitted.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Tag content types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContentType {
    RawText,
    EscapableRawText,
    ParsableData,
}

/// HTML tag definition with specific parsing rules
#[derive(Debug, Clone)]
pub struct HtmlTagDefinition {
    pub closed_by_children: Vec<&'static str>,
    pub content_type: TagContentType,
    pub is_void: bool,
    pub ignore_first_lf: bool,
}

impl HtmlTagDefinition {
    pub const fn new() -> Self {
        HtmlTagDefinition {
            closed_by_children: Vec::new(),
            content_type: TagContentType::ParsableData,
            is_void: false,
            ignore_first_lf: false,
        }
    }

    pub fn with_void(mut self, is_void: bool) -> Self {
        self.is_void = is_void;
        self
    }

    pub fn with_closed_by_children(mut self, children: Vec<&'static str>) -> Self {
        self.closed_by_children = children;
        self
    }

    pub fn with_content_type(mut self, content_type: TagContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_ignore_first_lf(mut self, ignore: bool) -> Self {
        self.ignore_first_lf = ignore;
        self
    }

    /// Whether an open element of this kind is implicitly closed when `name` starts.
    pub fn is_closed_by_child(&self, name: &str) -> bool {
        self.closed_by_children.iter().any(|child| *child == name)
    }
}

impl Default for HtmlTagDefinition {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_TAG_DEFINITION: HtmlTagDefinition = HtmlTagDefinition::new();

/// Tag definitions registry
static TAG_DEFINITIONS: Lazy<HashMap<&'static str, HtmlTagDefinition>> = Lazy::new(|| {
    let mut defs = HashMap::new();

    for name in [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ] {
        defs.insert(name, HtmlTagDefinition::new().with_void(true));
    }

    // Block markers are `div`s and may sit anywhere, so `p` is deliberately not
    // closed by block-level children here.
    defs.insert(
        "li",
        HtmlTagDefinition::new().with_closed_by_children(vec!["li"]),
    );
    defs.insert(
        "dt",
        HtmlTagDefinition::new().with_closed_by_children(vec!["dt", "dd"]),
    );
    defs.insert(
        "dd",
        HtmlTagDefinition::new().with_closed_by_children(vec!["dt", "dd"]),
    );
    defs.insert(
        "tr",
        HtmlTagDefinition::new().with_closed_by_children(vec!["tr"]),
    );
    defs.insert(
        "td",
        HtmlTagDefinition::new().with_closed_by_children(vec!["td", "th"]),
    );
    defs.insert(
        "th",
        HtmlTagDefinition::new().with_closed_by_children(vec!["td", "th"]),
    );
    defs.insert(
        "option",
        HtmlTagDefinition::new().with_closed_by_children(vec!["option", "optgroup"]),
    );

    defs.insert(
        "script",
        HtmlTagDefinition::new().with_content_type(TagContentType::RawText),
    );
    defs.insert(
        "style",
        HtmlTagDefinition::new().with_content_type(TagContentType::RawText),
    );
    defs.insert(
        "textarea",
        HtmlTagDefinition::new()
            .with_content_type(TagContentType::EscapableRawText)
            .with_ignore_first_lf(true),
    );
    defs.insert(
        "title",
        HtmlTagDefinition::new().with_content_type(TagContentType::EscapableRawText),
    );
    defs.insert("pre", HtmlTagDefinition::new().with_ignore_first_lf(true));

    defs
});

/// Look up the parsing rules of a tag; unknown tags get the default definition.
pub fn get_html_tag_definition(tag_name: &str) -> &'static HtmlTagDefinition {
    TAG_DEFINITIONS
        .get(tag_name)
        .or_else(|| TAG_DEFINITIONS.get(tag_name.to_ascii_lowercase().as_str()))
        .unwrap_or(&DEFAULT_TAG_DEFINITION)
}
