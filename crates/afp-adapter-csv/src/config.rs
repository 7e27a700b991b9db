//! CSV and fixed-width configuration options

use crate::errors::{CsvError, CsvResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for delimited reading and writing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiters; a field ends at any of these characters (default: comma)
    pub delimiters: String,
    /// Quoting of fields (default: double quote)
    pub quote: Quote,
    /// Import lines in reverse order (default: false)
    pub reverse: bool,
    /// Resolve columns against a header line, which is not imported (default: false)
    pub use_header: bool,
    /// Wrap every exported value in the quote characters (default: false)
    pub quote_all: bool,
    /// Line ending for exports (default: LF)
    pub line_ending: LineEnding,
}

/// Quote characters protecting delimiters inside a field.
///
/// Configured as a string of zero, one or two characters: `""` disables
/// quoting, `"\""` quotes symmetrically, `"[]"` uses an open/close pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quote {
    /// No quoting
    None,
    /// Same character opens and closes
    Symmetric(char),
    /// Distinct open and close characters
    Pair { open: char, close: char },
}

/// Line ending options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    /// Unix-style line feed (\n)
    #[default]
    LF,
    /// Windows-style carriage return + line feed (\r\n)
    CRLF,
    /// Platform native
    Native,
}

impl Quote {
    /// Parse a quote configuration of zero, one or two characters
    ///
    /// # Errors
    ///
    /// Returns a configuration error for more than two characters.
    pub fn from_chars(chars: &str) -> CsvResult<Self> {
        let mut iter = chars.chars();
        match (iter.next(), iter.next(), iter.next()) {
            (None, _, _) => Ok(Quote::None),
            (Some(c), None, _) => Ok(Quote::Symmetric(c)),
            (Some(open), Some(close), None) if open == close => Ok(Quote::Symmetric(open)),
            (Some(open), Some(close), None) => Ok(Quote::Pair { open, close }),
            _ => Err(CsvError::config(format!(
                "quote must be at most two characters, got '{chars}'"
            ))),
        }
    }

    /// Open and close characters, or `None` when quoting is disabled
    pub fn pair(&self) -> Option<(char, char)> {
        match *self {
            Quote::None => None,
            Quote::Symmetric(c) => Some((c, c)),
            Quote::Pair { open, close } => Some((open, close)),
        }
    }

    /// Whether `c` opens or closes a quoted field
    pub fn is_quote(&self, c: char) -> bool {
        self.pair().is_some_and(|(open, close)| c == open || c == close)
    }
}

impl Default for Quote {
    fn default() -> Self {
        Quote::Symmetric('"')
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pair() {
            None => Ok(()),
            Some((open, close)) if open == close => write!(f, "{open}"),
            Some((open, close)) => write!(f, "{open}{close}"),
        }
    }
}

impl TryFrom<String> for Quote {
    type Error = CsvError;

    fn try_from(value: String) -> CsvResult<Self> {
        Quote::from_chars(&value)
    }
}

impl From<Quote> for String {
    fn from(quote: Quote) -> Self {
        quote.to_string()
    }
}

impl LineEnding {
    /// Get the line ending as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::LF => "\n",
            LineEnding::CRLF => "\r\n",
            LineEnding::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiters: ",".to_string(),
            quote: Quote::default(),
            reverse: false,
            use_header: false,
            quote_all: false,
            line_ending: LineEnding::LF,
        }
    }
}

impl CsvOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single delimiter character
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiters = delimiter.to_string();
        self
    }

    /// Set the delimiter character set
    pub fn delimiters(mut self, delimiters: impl Into<String>) -> Self {
        self.delimiters = delimiters.into();
        self
    }

    /// Set the quote configuration
    pub fn quote(mut self, quote: Quote) -> Self {
        self.quote = quote;
        self
    }

    /// Disable quoting
    pub fn without_quotes(mut self) -> Self {
        self.quote = Quote::None;
        self
    }

    /// Import lines in reverse order
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Configure header presence
    pub fn use_header(mut self, use_header: bool) -> Self {
        self.use_header = use_header;
        self
    }

    /// Quote every exported value
    pub fn quote_all(mut self, quote_all: bool) -> Self {
        self.quote_all = quote_all;
        self
    }

    /// Set line ending
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Delimiter characters as a slice-friendly vector
    pub fn delimiter_chars(&self) -> Vec<char> {
        self.delimiters.chars().collect()
    }

    /// Delimiter written on export: the first configured one
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no delimiter is configured.
    pub fn output_delimiter(&self) -> CsvResult<char> {
        self.delimiters
            .chars()
            .next()
            .ok_or_else(|| CsvError::config("no delimiter configured"))
    }
}
