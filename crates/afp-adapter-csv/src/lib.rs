//! # afp-adapter-csv
//!
//! Delimited CSV and fixed-width ASCII codecs for AFP entities.
//!
//! Reading tokenizes each line with a quote-aware splitter that accepts a
//! set of delimiters and symmetric or asymmetric quotes, maps columns to
//! fields by header name or index, and appends one row per line to the
//! target entity's default sub-table. Writing renders records one per line
//! as fixed-width fields or delimited cells.
//!
//! ## Example Usage
//!
//! ```rust
//! use afp_adapter_csv::{ColumnSpec, CsvOptions, CsvReader};
//! use afp_model::{Entity, Value};
//! use std::io::Cursor;
//!
//! let reader = CsvReader::new()
//!     .with_options(CsvOptions::new().without_quotes())
//!     .with_columns(ColumnSpec::new().index("Name", 0).index("Age", 1));
//!
//! let entities = reader.read(Cursor::new("Ann,34\n"), Entity::new("Person")).unwrap();
//! let table = entities[0].primary_table().unwrap();
//! assert_eq!(table.value(0, "Age"), Some(&Value::Integer(34)));
//! ```

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod columns;
pub mod config;
pub mod errors;
pub mod format;
pub mod reader;
pub mod splitter;
pub mod writer;

pub use columns::{ColumnLocator, ColumnMap, ColumnSpec};
pub use config::{CsvOptions, LineEnding, Quote};
pub use errors::{CsvError, CsvResult};
pub use format::{FieldMode, format_field};
pub use reader::CsvReader;
pub use splitter::split_row;
pub use writer::{DEFAULT_FIXED_WIDTH, FieldSpec, FixedWidth, TextWriter};
