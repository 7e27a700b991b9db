//! AfpDocument vocabulary and text escaping
//!
//! The document format is line oriented: every value sits on one line, so
//! line breaks inside values are written as character references.

use serde::{Deserialize, Serialize};

/// Namespace declared on the document root
pub const NAMESPACE: &str = "http://www.afptech.de/XML/AfpDocument";

/// XML declaration written before the root element
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub const DOCUMENT_TAG: &str = "AfpDocument";
pub const SELECTION_LIST_TAG: &str = "AfpSelectionList";
pub const EMBEDDED_LIST_TAG: &str = "AfpEmbeddedList";
pub const SELECTION_TAG: &str = "AfpSelection";
pub const TABLE_ROW_TAG: &str = "AfpTableRow";
pub const VALUE_TAG: &str = "AfpValue";
/// Declares one schema field of the enclosing selection, in order
pub const FIELD_TAG: &str = "AfpField";

pub const ATTR_NAME: &str = "name";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_PROPERTY: &str = "property";
pub const ATTR_COUNT: &str = "count";

/// Closing form of a tag name
pub fn end_tag(tag: &str) -> String {
    format!("/{tag}")
}

/// Tags the extractor recognizes.
///
/// `valid_tags` open the wrapper scope and `valid_end_tags` close it; value
/// tags carry inline text and produce one token per open/close pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagVocabulary {
    pub valid_tags: Vec<String>,
    pub valid_end_tags: Vec<String>,
    pub value_tags: Vec<String>,
    pub value_end_tags: Vec<String>,
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::scoped(DOCUMENT_TAG).with_value_tag(VALUE_TAG)
    }
}

impl TagVocabulary {
    /// Vocabulary scoped to one wrapper element, without value tags
    pub fn scoped(wrapper: &str) -> Self {
        Self {
            valid_tags: vec![wrapper.to_string()],
            valid_end_tags: vec![end_tag(wrapper)],
            value_tags: Vec::new(),
            value_end_tags: Vec::new(),
        }
    }

    /// Add a value-carrying tag
    pub fn with_value_tag(mut self, tag: &str) -> Self {
        self.value_tags.push(tag.to_string());
        self.value_end_tags.push(end_tag(tag));
        self
    }

    pub fn opens_scope(&self, tag_type: &str) -> bool {
        self.valid_tags.iter().any(|t| t == tag_type)
    }

    pub fn closes_scope(&self, tag_type: &str) -> bool {
        self.valid_end_tags.iter().any(|t| t == tag_type)
    }

    pub fn is_value_tag(&self, tag_type: &str) -> bool {
        self.value_tags.iter().any(|t| t == tag_type)
    }

    pub fn is_value_end_tag(&self, tag_type: &str) -> bool {
        self.value_end_tags.iter().any(|t| t == tag_type)
    }
}

/// Escape text for element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve predefined entities and character references.
///
/// Unknown or malformed references are kept as written.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match candidate.find(';').and_then(|end| {
            resolve_reference(&candidate[1..end]).map(|c| (c, end))
        }) {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
