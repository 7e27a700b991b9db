//! CSV reader

use crate::columns::{ColumnMap, ColumnSpec};
use crate::config::CsvOptions;
use crate::errors::{CsvError, CsvResult};
use crate::splitter::split_row;
use afp_model::Entity;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

/// Reader appending CSV lines as rows of an entity's default sub-table
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvOptions,
    columns: ColumnSpec,
}

impl CsvReader {
    /// Create a reader with default options and no column mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set options
    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the column mapping
    pub fn with_columns(mut self, columns: ColumnSpec) -> Self {
        self.columns = columns;
        self
    }

    /// Read a CSV file into `target`.
    ///
    /// Returns the mutated entity in a one-element list, matching the XML
    /// import which may produce several.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or read, or when no column
    /// mapping can be established.
    pub fn read_from_csv_file(
        &self,
        path: impl AsRef<Path>,
        target: Entity,
    ) -> CsvResult<Vec<Entity>> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading CSV file");
        let file = File::open(path)?;
        self.read(BufReader::new(file), target)
    }

    /// Read CSV lines from any buffered reader into `target`.
    ///
    /// # Errors
    ///
    /// See [`CsvReader::read_from_csv_file`].
    pub fn read<R: BufRead>(&self, reader: R, mut target: Entity) -> CsvResult<Vec<Entity>> {
        let mut lines = read_lines(reader)?;
        let delimiters = self.options.delimiter_chars();
        let quote = self.options.quote;

        let header = if self.options.use_header && !lines.is_empty() {
            let first = lines.remove(0);
            Some(split_row(first.trim_start_matches('\u{feff}'), &delimiters, quote))
        } else {
            None
        };

        let column_map = self.column_map(header.as_deref(), &target)?;

        if self.options.reverse {
            lines.reverse();
        }

        let table = target.primary_table_mut();
        let mut imported = 0usize;
        for line in &lines {
            if line.is_empty() {
                continue;
            }
            let tokens = split_row(line, &delimiters, quote);
            let values = column_map.apply(&tokens);
            trace!(?values, "Parsed CSV row");
            table.append_record(values);
            imported += 1;
        }

        debug!(
            rows = imported,
            table = %target.default_table,
            "Finished reading CSV"
        );
        Ok(vec![target])
    }

    fn column_map(&self, header: Option<&[String]>, target: &Entity) -> CsvResult<ColumnMap> {
        if !self.columns.is_empty() {
            return Ok(self.columns.resolve(header));
        }
        if let Some(header) = header {
            return Ok(ColumnSpec::from_header(header).resolve(Some(header)));
        }
        match target.primary_table() {
            Some(table) if !table.fields.is_empty() => {
                Ok(ColumnSpec::positional(table.fields.iter().cloned()).resolve(None))
            }
            _ => Err(CsvError::config(
                "no column mapping, header or preset schema to map CSV columns",
            )),
        }
    }
}

fn read_lines<R: BufRead>(reader: R) -> CsvResult<Vec<String>> {
    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        match line {
            Ok(line) => lines.push(line),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(CsvError::read_at(index + 1, e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(lines)
}
