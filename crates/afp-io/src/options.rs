//! Import and export options
//!
//! Options are plain values loaded from YAML and passed by reference into
//! each call:
//!
//! ```yaml
//! import:
//!   csv:
//!     delimiters: ";"
//!     use_header: true
//!   columns:
//!     Name: Name
//!     Age: 1
//! export:
//!   fields: [Name, { name: Age, width: 3 }]
//!   fixed:
//!     width: 12
//! ```

use crate::dbf::DbfLayout;
use crate::enrich::JoinSpec;
use crate::{Error, Result};
use afp_adapter_csv::{ColumnSpec, CsvOptions, FieldSpec, FixedWidth};
use afp_adapter_xml::{DEFAULT_INDENT, TagVocabulary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options for reading files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// CSV tokenizer options
    pub csv: CsvOptions,
    /// Target field → source column; empty maps by header or preset schema
    pub columns: ColumnSpec,
    /// Tags recognized in XML documents
    pub vocabulary: TagVocabulary,
    /// Registered interpreter for XML documents; the default grammar if unset
    pub interpreter: Option<String>,
}

/// Options for writing files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Exported fields in order; empty exports the table schema
    pub fields: Vec<FieldSpec>,
    /// Sub-table exported to ASCII, CSV and DBF; the entity's default if unset
    pub table: Option<String>,
    /// Fixed-width layout for `.asc`
    pub fixed: FixedWidth,
    /// Delimited layout for `.csv`
    pub csv: CsvOptions,
    /// Indentation per level for `.xml`
    pub xml_indent: usize,
    /// Embedded list written inside each XML selection list
    pub embedded: Option<String>,
    /// Joins flattened into each exported record
    pub joins: Vec<JoinSpec>,
    /// Layout for `.dbf`; derived from the exported fields if unset
    pub dbf_layout: Option<DbfLayout>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            table: None,
            fixed: FixedWidth::default(),
            csv: CsvOptions::default(),
            xml_indent: DEFAULT_INDENT,
            embedded: None,
            joins: Vec::new(),
            dbf_layout: None,
        }
    }
}

/// Both option sets, as stored in one configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub import: ImportOptions,
    pub export: ExportOptions,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    pub fn with_columns(mut self, columns: ColumnSpec) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: TagVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_interpreter(mut self, name: impl Into<String>) -> Self {
        self.interpreter = Some(name.into());
        self
    }

    /// Parse options from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] for malformed documents.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    /// Export fields by name, using the global fixed width
    pub fn with_field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = FieldSpec::from_names(names);
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_fixed(mut self, fixed: FixedWidth) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Flatten another join into each exported record
    pub fn with_join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn with_xml_indent(mut self, indent: usize) -> Self {
        self.xml_indent = indent;
        self
    }

    pub fn with_dbf_layout(mut self, layout: DbfLayout) -> Self {
        self.dbf_layout = Some(layout);
        self
    }

    /// Parse options from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] for malformed documents.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl CodecOptions {
    /// Parse options from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] for malformed documents.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load options from a YAML file
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read options '{}': {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }
}
