//! Splitting text into spans inside and outside a delimiter pair
//!
//! Shared by the CSV tokenizer (quotes), the tag extractor (`<`/`>`) and
//! attribute parsing (`"`).

/// Spans of a line split on an open/close pair.
///
/// `outside[0]` precedes `inside[0]`, `outside[i]` lies between
/// `inside[i - 1]` and `inside[i]`, and the last outside span follows the
/// last inside span, so `outside.len() == inside.len() + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketSpans<'a> {
    pub inside: Vec<&'a str>,
    pub outside: Vec<&'a str>,
}

impl<'a> BracketSpans<'a> {
    /// Outside span immediately preceding inside span `index`
    pub fn before(&self, index: usize) -> &'a str {
        self.outside[index]
    }

    /// Outside span immediately following inside span `index`
    pub fn after(&self, index: usize) -> &'a str {
        self.outside[index + 1]
    }
}

/// Split `line` on `open`/`close`.
///
/// An opener without a matching closer stops the split: the remainder,
/// opener included, becomes the final outside span. Empty input yields a
/// single empty outside span.
pub fn split_brackets(line: &str, open: char, close: char) -> BracketSpans<'_> {
    let mut inside = Vec::new();
    let mut outside = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find(open) {
        let body = &rest[start + open.len_utf8()..];
        let Some(end) = body.find(close) else {
            break;
        };
        outside.push(&rest[..start]);
        inside.push(&body[..end]);
        rest = &body[end + close.len_utf8()..];
    }
    outside.push(rest);

    BracketSpans { inside, outside }
}
