#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # afp-io
//!
//! File-level import and export of AFP entities.
//!
//! The [`Importer`] and [`Exporter`] pick a codec by file extension:
//!
//! | Extension | Import                   | Export                  |
//! |-----------|--------------------------|-------------------------|
//! | `asc`     | not supported            | fixed-width text        |
//! | `csv`     | delimited text           | delimited text          |
//! | `xml`     | AfpDocument              | AfpDocument             |
//! | `dbf`     | installed [`DbfCodec`]   | installed [`DbfCodec`]  |
//!
//! Exports are written to a temporary file next to the destination and
//! moved into place, so a destination file is either complete or untouched.

pub mod dbf;
pub mod enrich;
pub mod export;
pub mod format;
pub mod import;
pub mod options;

pub use dbf::{DbfCodec, DbfFieldDescriptor, DbfLayout};
pub use enrich::{JoinColumn, JoinSpec, enrich_records};
pub use export::{ExportReport, Exporter};
pub use format::FileFormat;
pub use import::{Importer, read_from_file};
pub use options::{CodecOptions, ExportOptions, ImportOptions};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when importing or exporting files
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file format: '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error(transparent)]
    Csv(#[from] afp_adapter_csv::CsvError),

    #[error("XML error: {0}")]
    Xml(#[from] afp_adapter_xml::Error),

    #[error("Model error: {0}")]
    Model(#[from] afp_model::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("DBF error: {0}")]
    Dbf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an unsupported-format error for a path
    pub fn unsupported_format(path: impl AsRef<Path>) -> Self {
        Self::UnsupportedFormat {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create an error raised by a DBF codec
    pub fn dbf(message: impl Into<String>) -> Self {
        Self::Dbf(message.into())
    }

    /// Whether the error stems from configuration rather than data or I/O
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnsupportedFormat { .. }
                | Self::Yaml(_)
                | Self::Csv(afp_adapter_csv::CsvError::Config(_))
                | Self::Model(afp_model::Error::UnknownEntityType { .. })
                | Self::Xml(
                    afp_adapter_xml::Error::UnknownInterpreter { .. }
                        | afp_adapter_xml::Error::Model(afp_model::Error::UnknownEntityType { .. })
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
