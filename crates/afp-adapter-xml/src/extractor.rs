//! Tag extraction
//!
//! Turns document lines into a flat stream of [`TagToken`]s. Only tags
//! between the wrapper scope's open and close tags are tokenized, so the
//! prolog, comments and foreign elements around the document are skipped.
//! Extraction ends at the first scope close; a second document in the same
//! input is not read.
//!
//! Value tags are folded into a single token carrying the text between the
//! open and close tag. Every other tag inside the scope, open or close, is
//! emitted as a structural token in document order.

use crate::syntax::{TagVocabulary, unescape};
use crate::Result;
use afp_model::{Value, split_brackets};
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, trace, warn};

/// One tag of the document
#[derive(Debug, Clone, PartialEq)]
pub struct TagToken {
    /// Tag name; close tags keep their leading `/`
    pub tag_type: String,
    /// Attribute values, unescaped
    pub attributes: HashMap<String, String>,
    /// Inline text of a value tag, unescaped; `None` for structural tags and
    /// self-closing value tags
    pub value: Option<String>,
}

impl TagToken {
    /// Create a token without attributes
    pub fn new(tag_type: impl Into<String>) -> Self {
        Self {
            tag_type: tag_type.into(),
            attributes: HashMap::new(),
            value: None,
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the inline value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Raw attribute text
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute coerced to a scalar
    pub fn attribute_value(&self, name: &str) -> Option<Value> {
        self.attribute(name).map(Value::coerce)
    }

    /// Whether this is a close tag
    pub fn is_close(&self) -> bool {
        self.tag_type.starts_with('/')
    }
}

/// Incremental extractor holding the scope state between lines
#[derive(Debug, Clone)]
pub struct TagExtractor {
    vocabulary: TagVocabulary,
    inside_scope: bool,
    finished: bool,
    pending: Option<TagToken>,
}

impl TagExtractor {
    pub fn new(vocabulary: TagVocabulary) -> Self {
        Self {
            vocabulary,
            inside_scope: false,
            finished: false,
            pending: None,
        }
    }

    /// Whether the wrapper scope is currently open
    pub fn inside_scope(&self) -> bool {
        self.inside_scope
    }

    /// Whether the wrapper scope has been closed; later lines are ignored
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Tokenize one line, appending to `tokens`
    pub fn feed_line(&mut self, line: &str, tokens: &mut Vec<TagToken>) {
        if self.finished {
            return;
        }
        let spans = split_brackets(line, '<', '>');

        for (i, raw) in spans.inside.iter().enumerate() {
            let (body, self_closing) = match raw.trim().strip_suffix('/') {
                Some(body) => (body, true),
                None => (raw.trim(), false),
            };
            let tag_type = body.split_whitespace().next().unwrap_or_default();

            if !self.inside_scope {
                if self.vocabulary.opens_scope(tag_type) {
                    trace!(tag = tag_type, "Entered tag scope");
                    self.inside_scope = true;
                    tokens.push(parse_tag(body));
                }
                continue;
            }

            if self.vocabulary.closes_scope(tag_type) {
                trace!(tag = tag_type, "Left tag scope");
                self.inside_scope = false;
                self.finished = true;
                if let Some(pending) = self.pending.take() {
                    warn!(tag = %pending.tag_type, "Value tag not closed before end of scope");
                }
                return;
            }

            if self.vocabulary.is_value_end_tag(tag_type) {
                match self.pending.take() {
                    Some(mut token) => {
                        token.value = Some(unescape(spans.before(i)));
                        tokens.push(token);
                    }
                    None => warn!(tag = tag_type, "Value close tag without open tag"),
                }
                continue;
            }

            let token = parse_tag(body);
            if self.vocabulary.is_value_tag(tag_type) {
                if self_closing {
                    tokens.push(token);
                } else if let Some(previous) = self.pending.replace(token) {
                    warn!(tag = %previous.tag_type, "Value tag not closed before next value tag");
                }
                continue;
            }

            tokens.push(token);
            if self_closing {
                tokens.push(TagToken::new(format!("/{tag_type}")));
            }
        }
    }
}

/// Extract tokens from in-memory lines
pub fn extract<I, S>(lines: I, vocabulary: &TagVocabulary) -> Vec<TagToken>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut extractor = TagExtractor::new(vocabulary.clone());
    let mut tokens = Vec::new();
    for line in lines {
        extractor.feed_line(line.as_ref(), &mut tokens);
        if extractor.is_finished() {
            break;
        }
    }
    debug!(token_count = tokens.len(), "Extracted tags");
    tokens
}

/// Extract tokens from a reader, line by line
///
/// # Errors
///
/// Propagates read errors, including invalid UTF-8.
pub fn extract_from_reader<R: BufRead>(reader: R, vocabulary: &TagVocabulary) -> Result<Vec<TagToken>> {
    let mut extractor = TagExtractor::new(vocabulary.clone());
    let mut tokens = Vec::new();
    for line in reader.lines() {
        extractor.feed_line(&line?, &mut tokens);
        if extractor.is_finished() {
            break;
        }
    }
    debug!(token_count = tokens.len(), "Extracted tags");
    Ok(tokens)
}

/// Parse `type name="value" ...` into a token.
///
/// Attribute values are the quoted spans; each takes its name from the
/// last word before the `=` preceding it.
fn parse_tag(body: &str) -> TagToken {
    let body = body.trim();
    let (tag_type, rest) = match body.find(char::is_whitespace) {
        Some(split) => (&body[..split], &body[split..]),
        None => (body, ""),
    };

    let mut token = TagToken::new(tag_type);
    let spans = split_brackets(rest, '"', '"');
    for (i, value) in spans.inside.iter().enumerate() {
        let name = spans
            .before(i)
            .trim()
            .trim_end_matches('=')
            .split_whitespace()
            .last();
        match name {
            Some(name) => {
                token.attributes.insert(name.to_string(), unescape(value));
            }
            None => warn!(tag = tag_type, value = *value, "Attribute value without a name"),
        }
    }
    token
}
