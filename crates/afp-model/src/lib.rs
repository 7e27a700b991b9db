#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # afp-model
//!
//! Object graph shared by every AFP codec.
//!
//! An [`Entity`] is a named root record owning named [`SubTable`]s, each an
//! ordered list of [`Row`]s whose scalar [`Value`]s line up with the table's
//! field schema. Entities are created by type name through an
//! [`EntityRegistry`], which stands in for the host application's late-bound
//! construction of concrete record types.

/// Splitting text on delimiter pairs, shared by the text codecs.
pub mod brackets;
/// Entity, sub-table and row containers.
pub mod entity;
/// Related-row lookups used when flattening joined columns into exports.
pub mod join;
/// Type-name to factory registry for late-bound entity construction.
pub mod registry;
/// Scalar field values and their canonical text form.
pub mod value;

pub use brackets::{BracketSpans, split_brackets};
pub use entity::{DEFAULT_TABLE, EmbeddedList, Entity, Record, Row, SubTable};
pub use join::JoinSource;
pub use registry::{EntityFactory, EntityRegistry};
pub use value::{Value, ValueKind};

use thiserror::Error;

/// Errors raised by the object graph and its host-facing seams
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown entity type: {type_name}")]
    UnknownEntityType { type_name: String },

    #[error("Sub-table not found: {table}")]
    TableNotFound { table: String },

    #[error("Conversion error in {context}: {message}")]
    Conversion { context: String, message: String },

    #[error("Lookup in '{table}' failed: {message}")]
    Lookup { table: String, message: String },
}

impl Error {
    /// Build an unknown-type error for a registry miss.
    pub fn unknown_entity_type(type_name: impl Into<String>) -> Self {
        Self::UnknownEntityType {
            type_name: type_name.into(),
        }
    }

    /// Build a missing sub-table error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Build a conversion error with conversion context.
    pub fn conversion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Build a host lookup failure.
    pub fn lookup(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;
