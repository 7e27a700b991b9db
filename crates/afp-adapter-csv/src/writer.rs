//! Fixed-width and delimited record writer

use crate::config::{CsvOptions, LineEnding};
use crate::errors::CsvResult;
use crate::format::{FieldMode, format_field};
use afp_model::Record;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, trace};

/// Width used for fixed-width fields without an override
pub const DEFAULT_FIXED_WIDTH: usize = 10;

/// Options for fixed-width output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedWidth {
    /// Width of every field without its own width (default: 10)
    pub width: usize,
    /// Line ending (default: LF)
    pub line_ending: LineEnding,
}

impl Default for FixedWidth {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIXED_WIDTH,
            line_ending: LineEnding::LF,
        }
    }
}

impl FixedWidth {
    /// Fixed-width options with the given global width
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

/// One exported field: its name and an optional fixed width override.
///
/// Deserializes from either a bare name or `{name, width}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldSpecRepr")]
pub struct FieldSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpecRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        width: Option<usize>,
    },
}

impl From<FieldSpecRepr> for FieldSpec {
    fn from(repr: FieldSpecRepr) -> Self {
        match repr {
            FieldSpecRepr::Name(name) => FieldSpec { name, width: None },
            FieldSpecRepr::Full { name, width } => FieldSpec { name, width },
        }
    }
}

impl FieldSpec {
    /// Field using the global width
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: None,
        }
    }

    /// Override the fixed width of this field
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Fields named in order, all using the global width
    pub fn from_names<I, S>(names: I) -> Vec<FieldSpec>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(FieldSpec::new).collect()
    }
}

#[derive(Debug, Clone)]
enum Layout {
    Fixed(FixedWidth),
    Delimited {
        delimiter: char,
        options: CsvOptions,
    },
}

/// Writer rendering records one per line
#[derive(Debug, Clone)]
pub struct TextWriter {
    layout: Layout,
}

impl TextWriter {
    /// Fixed-width writer
    pub fn fixed(options: FixedWidth) -> Self {
        Self {
            layout: Layout::Fixed(options),
        }
    }

    /// Delimited writer using the first configured delimiter
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no delimiter is configured.
    pub fn delimited(options: CsvOptions) -> CsvResult<Self> {
        let delimiter = options.output_delimiter()?;
        Ok(Self {
            layout: Layout::Delimited { delimiter, options },
        })
    }

    fn line_ending(&self) -> &'static str {
        match &self.layout {
            Layout::Fixed(fixed) => fixed.line_ending.as_str(),
            Layout::Delimited { options, .. } => options.line_ending.as_str(),
        }
    }

    fn mode_for(&self, field: &FieldSpec) -> FieldMode<'_> {
        match &self.layout {
            Layout::Fixed(fixed) => FieldMode::Fixed {
                width: field.width.unwrap_or(fixed.width),
            },
            Layout::Delimited { delimiter, options } => FieldMode::Delimited {
                delimiter: *delimiter,
                separators: &options.delimiters,
                quote: options.quote,
                quote_all: options.quote_all,
            },
        }
    }

    /// Render one record as a line without its line ending
    pub fn format_record(&self, record: &Record, fields: &[FieldSpec]) -> String {
        let mut line: String = fields
            .iter()
            .map(|field| format_field(record.get(&field.name), &self.mode_for(field)))
            .collect();
        if let Layout::Delimited { delimiter, .. } = &self.layout {
            if line.ends_with(*delimiter) {
                line.pop();
            }
        }
        line
    }

    /// Write all records and return the number of lines written
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from `out`.
    pub fn write<W: Write>(
        &self,
        mut out: W,
        records: &[Record],
        fields: &[FieldSpec],
    ) -> CsvResult<usize> {
        let ending = self.line_ending();
        for record in records {
            let line = self.format_record(record, fields);
            trace!(line = %line, "Wrote text row");
            out.write_all(line.as_bytes())?;
            out.write_all(ending.as_bytes())?;
        }
        out.flush()?;
        debug!(record_count = records.len(), "Finished writing text records");
        Ok(records.len())
    }
}
