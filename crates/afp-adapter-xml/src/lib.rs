//! # afp-adapter-xml
//!
//! Reader and writer for the AfpDocument XML dialect.
//!
//! Reading is split in two stages: a [`TagExtractor`] turns lines into a
//! flat stream of [`TagToken`]s, restricted to the wrapper element's scope,
//! and an [`Interpreter`] rebuilds entities from that stream. The default
//! [`DocumentInterpreter`] can be replaced per import through the
//! [`InterpreterRegistry`].

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod extractor;
pub mod interpreter;
pub mod reader;
pub mod serializer;
pub mod syntax;

pub use extractor::{TagExtractor, TagToken, extract, extract_from_reader};
pub use interpreter::{
    DEFAULT_INTERPRETER, DocumentInterpreter, Interpreter, InterpreterRegistry, MAX_ROW_GAP,
};
pub use reader::XmlReader;
pub use serializer::{DEFAULT_INDENT, XmlWriter};
pub use syntax::{NAMESPACE, TagVocabulary, escape, unescape};

use thiserror::Error;

/// Errors that can occur when reading or writing AfpDocument XML
#[derive(Error, Debug)]
pub enum Error {
    #[error("Model error: {0}")]
    Model(#[from] afp_model::Error),

    #[error("Missing attribute '{attribute}' on <{tag}>")]
    MissingAttribute { tag: String, attribute: String },

    #[error("Unknown interpreter: {name}")]
    UnknownInterpreter { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    pub fn unknown_interpreter(name: impl Into<String>) -> Self {
        Self::UnknownInterpreter { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
