//! Rendering of single values as fixed-width or delimited text

use crate::config::Quote;
use afp_model::Value;
use tracing::warn;

/// How a single field is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode<'a> {
    /// Exactly `width` characters, padded or truncated
    Fixed { width: usize },
    /// Value followed by the delimiter, quoted when needed
    Delimited {
        delimiter: char,
        /// Every character a reader splits on; values containing any are quoted
        separators: &'a str,
        quote: Quote,
        quote_all: bool,
    },
}

/// Render one value.
///
/// Nulls render as blanks in fixed mode and as an empty cell in delimited
/// mode.
pub fn format_field(value: Option<&Value>, mode: &FieldMode<'_>) -> String {
    match *mode {
        FieldMode::Fixed { width } => format_fixed(value, width),
        FieldMode::Delimited {
            delimiter,
            separators,
            quote,
            quote_all,
        } => {
            let mut out = format_delimited(value, delimiter, separators, quote, quote_all);
            out.push(delimiter);
            out
        }
    }
}

fn format_fixed(value: Option<&Value>, width: usize) -> String {
    let Some(value) = value else {
        return " ".repeat(width);
    };
    let text = value.to_string();
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    if value.is_numeric() {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}

fn format_delimited(
    value: Option<&Value>,
    delimiter: char,
    separators: &str,
    quote: Quote,
    quote_all: bool,
) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let text = value.to_string();

    let (open, close) = quote.pair().unwrap_or(('"', '"'));
    let has_quote = text.contains(open) || text.contains(close);
    let needs_quote =
        has_quote || text.contains(delimiter) || text.contains(|c: char| separators.contains(c));

    if has_quote {
        warn!(value = %text, "Value contains the quote character and cannot be re-read intact");
    }

    if needs_quote || (quote_all && quote != Quote::None) {
        format!("{open}{text}{close}")
    } else {
        text
    }
}
