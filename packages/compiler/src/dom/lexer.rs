//! Markup Lexer
//!
//! Tokenizer for the HTML subset the default document provider accepts:
//! elements, attributes, text, comments and doctypes. Raw-text elements
//! (`script`, `style`) and escapable raw-text elements (`textarea`,
//! `title`) are read verbatim up to their end tag.

use std::borrow::Cow;
use std::ops::Range;

use crate::chars;
use crate::parse_util::{ParseError, ParseSourceFile};

use super::tags::{get_html_tag_definition, TagContentType};

/// Markup token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    TagOpen {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        span: Range<usize>,
    },
    TagClose {
        name: String,
        span: Range<usize>,
    },
    Text {
        value: String,
        span: Range<usize>,
    },
    Comment {
        value: String,
        span: Range<usize>,
    },
    DocType {
        value: String,
        span: Range<usize>,
    },
}

impl Token {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Token::TagOpen { span, .. }
            | Token::TagClose { span, .. }
            | Token::Text { span, .. }
            | Token::Comment { span, .. }
            | Token::DocType { span, .. } => span,
        }
    }
}

/// Tokenization result
#[derive(Debug, Clone)]
pub struct TokenizeResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

/// Main tokenization function
pub fn tokenize(source: &str, url: &str) -> TokenizeResult {
    let file = ParseSourceFile::new(source, url);
    let mut tokenizer = Tokenizer::new(&file);
    tokenizer.tokenize();

    TokenizeResult {
        tokens: merge_text_tokens(tokenizer.tokens),
        errors: tokenizer.errors,
    }
}

struct Tokenizer<'a> {
    file: &'a ParseSourceFile,
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Tokenizer<'a> {
    fn new(file: &'a ParseSourceFile) -> Self {
        Tokenizer {
            file,
            input: file.content.as_str(),
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn tokenize(&mut self) {
        while !self.is_eof() {
            let start = self.pos;
            if self.attempt_str("<!--") {
                self.consume_comment(start);
            } else if self.rest().starts_with("<!") || self.rest().starts_with("<?") {
                self.consume_doc_type(start);
            } else if self.is_tag_close_start() {
                self.consume_tag_close(start);
            } else if self.is_tag_open_start() {
                self.consume_tag_open(start);
            } else {
                self.consume_text();
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn attempt_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn attempt_char_code(&mut self, char_code: char) -> bool {
        if self.peek() == Some(char_code) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if chars::is_whitespace(ch)) {
            self.advance();
        }
    }

    fn is_tag_open_start(&self) -> bool {
        self.peek() == Some(chars::LT) && matches!(self.peek_at(1), Some(ch) if chars::is_ascii_letter(ch))
    }

    fn is_tag_close_start(&self) -> bool {
        self.rest().starts_with("</")
            && matches!(self.peek_at(2), Some(ch) if chars::is_ascii_letter(ch))
    }

    fn is_text_end(&self) -> bool {
        self.is_tag_open_start()
            || self.is_tag_close_start()
            || self.rest().starts_with("<!")
            || self.rest().starts_with("<?")
    }

    fn create_error(&mut self, msg: String, start: usize) {
        let span = self.file.span(start, self.pos);
        self.errors.push(ParseError::new(span, msg));
    }

    fn consume_text(&mut self) {
        let start = self.pos;
        // A lone `<` that does not open markup is literal text.
        self.advance();
        while !self.is_eof() && !self.is_text_end() {
            self.advance();
        }
        let raw = &self.input[start..self.pos];
        self.tokens.push(Token::Text {
            value: decode_entities(raw).into_owned(),
            span: start..self.pos,
        });
    }

    fn consume_comment(&mut self, start: usize) {
        let content_start = self.pos;
        match self.rest().find("-->") {
            Some(idx) => {
                let value = self.input[content_start..content_start + idx].to_string();
                self.pos = content_start + idx + 3;
                self.tokens.push(Token::Comment {
                    value,
                    span: start..self.pos,
                });
            }
            None => {
                let value = self.rest().to_string();
                self.pos = self.input.len();
                self.create_error("Unexpected character \"EOF\"".to_string(), start);
                self.tokens.push(Token::Comment {
                    value,
                    span: start..self.pos,
                });
            }
        }
    }

    fn consume_doc_type(&mut self, start: usize) {
        // Skip `<!` / `<?`
        self.pos += 2;
        let content_start = self.pos;
        let end = self.rest().find(chars::GT).map(|idx| content_start + idx);
        let content_end = end.unwrap_or(self.input.len());
        let value = self.input[content_start..content_end].to_string();
        match end {
            Some(end) => self.pos = end + 1,
            None => {
                self.pos = self.input.len();
                self.create_error("Unexpected character \"EOF\"".to_string(), start);
            }
        }
        self.tokens.push(Token::DocType {
            value,
            span: start..self.pos,
        });
    }

    fn consume_tag_name(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if !chars::is_name_end(ch)) {
            self.advance();
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn consume_tag_open(&mut self, start: usize) {
        self.advance(); // <
        let name = self.consume_tag_name();
        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            if self.is_eof() {
                self.create_error(
                    format!("Unexpected character \"EOF\" in tag <{}>", name),
                    start,
                );
                break;
            }
            if self.attempt_char_code(chars::GT) {
                break;
            }
            if self.attempt_str("/>") {
                self_closing = true;
                break;
            }
            if self.attempt_char_code(chars::SLASH) {
                continue;
            }
            if self.is_tag_open_start() {
                // `<a <b>`: the open tag was never finished
                self.create_error(format!("Unclosed tag <{}>", name), start);
                break;
            }
            attrs.push(self.consume_attribute());
        }

        let tag_def = get_html_tag_definition(&name);
        self.tokens.push(Token::TagOpen {
            name: name.clone(),
            attrs,
            self_closing,
            span: start..self.pos,
        });

        if self_closing || tag_def.is_void {
            return;
        }
        if tag_def.ignore_first_lf {
            self.attempt_char_code(chars::LF);
        }
        match tag_def.content_type {
            TagContentType::RawText => self.consume_raw_text_with_tag_close(false, &name),
            TagContentType::EscapableRawText => self.consume_raw_text_with_tag_close(true, &name),
            TagContentType::ParsableData => {}
        }
    }

    fn consume_attribute(&mut self) -> (String, String) {
        let name_start = self.pos;
        // The first character may be anything but a terminator, including `=`.
        self.advance();
        while matches!(self.peek(), Some(ch) if !chars::is_name_end(ch)) {
            self.advance();
        }
        let name = self.input[name_start..self.pos].to_ascii_lowercase();

        self.skip_whitespace();
        if !self.attempt_char_code(chars::EQ) {
            return (name, String::new());
        }
        self.skip_whitespace();
        (name, self.consume_attribute_value())
    }

    fn consume_attribute_value(&mut self) -> String {
        match self.peek() {
            Some(quote) if chars::is_quote(quote) => {
                let start = self.pos;
                self.advance();
                let value_start = self.pos;
                match self.rest().find(quote) {
                    Some(idx) => {
                        let raw = &self.input[value_start..value_start + idx];
                        self.pos = value_start + idx + quote.len_utf8();
                        decode_entities(raw).into_owned()
                    }
                    None => {
                        let raw = self.rest();
                        self.pos = self.input.len();
                        self.create_error(
                            "Unexpected character \"EOF\" in attribute value".to_string(),
                            start,
                        );
                        decode_entities(raw).into_owned()
                    }
                }
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(ch) if !chars::is_whitespace(ch) && ch != chars::GT)
                {
                    self.advance();
                }
                decode_entities(&self.input[start..self.pos]).into_owned()
            }
        }
    }

    fn consume_raw_text_with_tag_close(&mut self, consume_entities: bool, tag_name: &str) {
        let start = self.pos;
        let end = self.find_closing_tag(tag_name).unwrap_or(self.input.len());
        let raw = &self.input[start..end];
        self.pos = end;
        if !raw.is_empty() {
            let value = if consume_entities {
                decode_entities(raw).into_owned()
            } else {
                raw.to_string()
            };
            self.tokens.push(Token::Text {
                value,
                span: start..end,
            });
        }
    }

    fn find_closing_tag(&self, tag_name: &str) -> Option<usize> {
        let lower = self.rest().to_ascii_lowercase();
        let needle = format!("</{}", tag_name);
        let mut from = 0;
        while let Some(idx) = lower[from..].find(&needle) {
            let at = from + idx;
            let after = lower[at + needle.len()..].chars().next();
            if after.map_or(true, chars::is_name_end) {
                return Some(self.pos + at);
            }
            from = at + needle.len();
        }
        None
    }

    fn consume_tag_close(&mut self, start: usize) {
        self.pos += 2; // </
        let name = self.consume_tag_name();
        self.skip_whitespace();
        match self.rest().find(chars::GT) {
            Some(idx) => self.pos += idx + 1,
            None => {
                self.pos = self.input.len();
                self.create_error(
                    format!("Unexpected character \"EOF\" in closing tag </{}>", name),
                    start,
                );
            }
        }
        self.tokens.push(Token::TagClose {
            name,
            span: start..self.pos,
        });
    }
}

/// Adjacent text tokens are merged into one.
fn merge_text_tokens(src_tokens: Vec<Token>) -> Vec<Token> {
    let mut dst_tokens: Vec<Token> = Vec::with_capacity(src_tokens.len());
    for token in src_tokens {
        if let (
            Some(Token::Text {
                value: last_value,
                span: last_span,
            }),
            Token::Text { value, span },
        ) = (dst_tokens.last_mut(), &token)
        {
            last_value.push_str(value);
            last_span.end = span.end;
            continue;
        }
        dst_tokens.push(token);
    }
    dst_tokens
}

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{00A0}"),
    ("copy", "\u{00A9}"),
    ("reg", "\u{00AE}"),
    ("hellip", "\u{2026}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
];

/// Decode character references; unknown or malformed references stay literal.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains(chars::AMPERSAND) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(chars::AMPERSAND) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        match decode_one(rest) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &rest[consumed..];
            }
            None => {
                out.push(chars::AMPERSAND);
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_one(text: &str) -> Option<(String, usize)> {
    let end = text.find(chars::SEMICOLON)?;
    let body = &text[1..end];
    if body.is_empty() || body.len() > 10 {
        return None;
    }
    let decoded = if let Some(num) = body.strip_prefix(chars::HASH) {
        let code = match num.strip_prefix(|c| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        char::from_u32(code)?.to_string()
    } else {
        NAMED_ENTITIES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, value)| value.to_string())?
    };
    Some((decoded, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humanize(source: &str) -> Vec<String> {
        tokenize(source, "test")
            .tokens
            .iter()
            .map(|token| match token {
                Token::TagOpen {
                    name,
                    attrs,
                    self_closing,
                    ..
                } => {
                    let attrs: Vec<String> =
                        attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                    format!("open:{}[{}]{}", name, attrs.join(","), if *self_closing { "/" } else { "" })
                }
                Token::TagClose { name, .. } => format!("close:{}", name),
                Token::Text { value, .. } => format!("text:{}", value),
                Token::Comment { value, .. } => format!("comment:{}", value),
                Token::DocType { value, .. } => format!("doctype:{}", value),
            })
            .collect()
    }

    #[test]
    fn should_tokenize_elements_and_text() {
        assert_eq!(
            humanize("<div class=\"a {{b}}\">x &amp; y</div>"),
            vec!["open:div[class=a {{b}}]", "text:x & y", "close:div"]
        );
    }

    #[test]
    fn should_tokenize_bare_and_unquoted_attributes() {
        assert_eq!(
            humanize("<input data-poirot disabled value=3/>"),
            vec!["open:input[data-poirot=,disabled=,value=3/]"]
        );
        assert_eq!(
            humanize("<input data-poirot value='3' />"),
            vec!["open:input[data-poirot=,value=3]/"]
        );
    }

    #[test]
    fn should_keep_lone_less_than_as_text() {
        assert_eq!(humanize("a < b"), vec!["text:a < b"]);
    }

    #[test]
    fn should_read_raw_text_verbatim() {
        assert_eq!(
            humanize("<script>if (a < b) { x = '</div>'; }</script>"),
            vec![
                "open:script[]",
                "text:if (a < b) { x = '</div>'; }",
                "close:script"
            ]
        );
    }

    #[test]
    fn should_tokenize_comments_and_doctype() {
        assert_eq!(
            humanize("<!doctype html><!-- hi -->"),
            vec!["doctype:doctype html", "comment: hi "]
        );
    }

    #[test]
    fn should_report_unterminated_comment() {
        let result = tokenize("<!-- open", "test");
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn should_decode_entities() {
        assert_eq!(decode_entities("&lt;b&gt; &#65;&#x42; &bogus; &"), "<b> AB &bogus; &");
    }
}
