//! Error types for the CSV and fixed-width adapter

use thiserror::Error;

/// Errors that can occur when reading or writing delimited and fixed-width text
#[derive(Error, Debug)]
pub enum CsvError {
    /// Configuration error (missing mapping, bad delimiter set, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error, passed through unchanged
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Read error with line context
    #[error("CSV read error at line {line}: {message}")]
    Read { line: usize, message: String },
}

impl CsvError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a read error at a specific line
    pub fn read_at(line: usize, message: impl Into<String>) -> Self {
        Self::Read {
            line,
            message: message.into(),
        }
    }

    /// Get the line number if available
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Read { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type alias for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;
