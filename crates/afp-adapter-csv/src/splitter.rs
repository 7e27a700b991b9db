//! Quote-aware row tokenizer

use crate::config::Quote;
use afp_model::split_brackets;

/// Split one line into fields.
///
/// Quoted spans are kept intact, including any delimiters inside them.
/// Unquoted spans are split on every delimiter character. A quoted field
/// leaves an empty token on either side of it in the unquoted spans; those
/// are dropped so `a,"b",c` yields three fields, not five.
pub fn split_row(line: &str, delimiters: &[char], quote: Quote) -> Vec<String> {
    let Some((open, close)) = quote.pair() else {
        return split_unquoted(line, delimiters)
            .into_iter()
            .map(str::to_string)
            .collect();
    };

    let spans = split_brackets(line, open, close);
    let last = spans.outside.len() - 1;
    let mut fields = Vec::with_capacity(spans.outside.len() + spans.inside.len());

    for (i, outside) in spans.outside.iter().enumerate() {
        let mut tokens = split_unquoted(outside, delimiters);
        if i > 0 && tokens.first().is_some_and(|t| t.is_empty()) {
            tokens.remove(0);
        }
        if i < last && tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }
        fields.extend(tokens.into_iter().map(str::to_string));

        if let Some(quoted) = spans.inside.get(i) {
            fields.push((*quoted).to_string());
        }
    }

    fields
}

fn split_unquoted<'a>(text: &'a str, delimiters: &[char]) -> Vec<&'a str> {
    text.split(|c: char| delimiters.contains(&c)).collect()
}
