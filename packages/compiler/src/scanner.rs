//! Interpolation Scanner
//!
//! Finds `{{ … }}` and `{{{ … }}}` directives inside text and attribute
//! values and classifies them by their leading sigil.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::chars;
use crate::compiled::RenderKind;
use crate::parse_util::{ParseError, ParseSourceFile, ParseSourceSpan};

static INTERPOLATION_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\{\{\{?)\s*([^}\s](?:[^}]*[^}\s])?)\s*(\}\}\}?)").unwrap()
});

/// One directive occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Literal text between the previous match (or the start) and this one.
    pub preamble: String,
    pub open: String,
    /// Directive body with surrounding whitespace removed.
    pub content: String,
    pub close: String,
    pub whole_match: String,
    pub span: ParseSourceSpan,
}

impl Match {
    pub fn is_triple(&self) -> bool {
        self.open.len() == 3
    }

    /// Render kind and context key of the directive.
    pub fn directive(&self) -> Result<Directive, ParseError> {
        let content = self.content.as_str();
        let (kind, body) = match content.chars().next() {
            Some(chars::BANG) => (RenderKind::Function, &content[1..]),
            Some(chars::PERCENT) => (RenderKind::Numeral, &content[1..]),
            Some(chars::GT) => return self.fragment_directive(&content[1..]),
            _ if self.is_triple() => (RenderKind::Literal, content),
            _ => (RenderKind::Escaped, content),
        };
        let key = body.trim();
        if key.is_empty() {
            return Err(ParseError::new(
                self.span.clone(),
                format!("Missing key in directive {}", self.whole_match),
            ));
        }
        Ok(Directive {
            kind,
            key: key.to_string(),
            block_name: None,
        })
    }

    fn fragment_directive(&self, body: &str) -> Result<Directive, ParseError> {
        let mut parts = body.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(block_name), Some(args), None) => Ok(Directive {
                kind: RenderKind::Fragment,
                key: args.to_string(),
                block_name: Some(block_name.to_string()),
            }),
            _ => Err(ParseError::new(
                self.span.clone(),
                format!(
                    "Malformed fragment directive {}: expected {{{{> name args}}}}",
                    self.whole_match
                ),
            )),
        }
    }
}

/// Classified directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: RenderKind,
    pub key: String,
    pub block_name: Option<String>,
}

/// Scanner bound to the template name used in error positions.
#[derive(Debug, Clone)]
pub struct InterpolationScanner {
    url: String,
}

impl InterpolationScanner {
    pub fn new(url: impl Into<String>) -> Self {
        InterpolationScanner { url: url.into() }
    }

    /// First directive in `text`.
    pub fn match_one(&self, text: &str) -> Result<Option<Match>, ParseError> {
        let file = ParseSourceFile::new(text, self.url.as_str());
        match INTERPOLATION_REGEXP.captures(text) {
            Some(caps) => self.to_match(&file, text, 0, &caps).map(Some),
            None => Ok(None),
        }
    }

    /// Every directive in `text`, in order.
    pub fn match_all(&self, text: &str) -> Result<Vec<Match>, ParseError> {
        let file = ParseSourceFile::new(text, self.url.as_str());
        let mut last_end = 0;
        let mut matches = Vec::new();
        for caps in INTERPOLATION_REGEXP.captures_iter(text) {
            let m = self.to_match(&file, text, last_end, &caps)?;
            last_end = m.span.end.offset;
            matches.push(m);
        }
        Ok(matches)
    }

    /// The match when `text` is nothing but one directive.
    pub fn whole_match(&self, text: &str) -> Result<Option<Match>, ParseError> {
        Ok(self
            .match_one(text)?
            .filter(|m| m.whole_match.len() == text.len()))
    }

    pub fn is_whole_match(&self, text: &str) -> Result<bool, ParseError> {
        Ok(self.whole_match(text)?.is_some())
    }

    fn to_match(
        &self,
        file: &ParseSourceFile,
        text: &str,
        from: usize,
        caps: &regex::Captures<'_>,
    ) -> Result<Match, ParseError> {
        let (Some(whole), Some(open), Some(content), Some(close)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            return Err(ParseError::new(
                file.span(from, text.len()),
                "Malformed interpolation",
            ));
        };
        let span = file.span(whole.start(), whole.end());
        if open.as_str().len() != close.as_str().len() {
            return Err(ParseError::new(
                span,
                format!(
                    "Open/close brace mismatch around {} in {}",
                    content.as_str(),
                    whole.as_str()
                ),
            ));
        }
        Ok(Match {
            preamble: text[from..whole.start()].to_string(),
            open: open.as_str().to_string(),
            content: content.as_str().to_string(),
            close: close.as_str().to_string(),
            whole_match: whole.as_str().to_string(),
            span,
        })
    }
}

/// Literal text after the last match.
pub fn trailing<'t>(text: &'t str, matches: &[Match]) -> &'t str {
    match matches.last() {
        Some(last) => &text[last.span.end.offset..],
        None => text,
    }
}
