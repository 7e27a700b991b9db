//! Export facade

use crate::dbf::{DbfCodec, DbfFieldDescriptor, DbfLayout};
use crate::enrich::{JoinSpec, enrich_records};
use crate::format::FileFormat;
use crate::options::ExportOptions;
use crate::{Error, Result};
use afp_adapter_csv::{FieldSpec, TextWriter};
use afp_adapter_xml::XmlWriter;
use afp_model::{Entity, JoinSource, Record};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Outcome of [`Exporter::write_to_file`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Destination path
    pub path: PathBuf,
    /// Detected format, `None` for unsupported extensions
    pub format: Option<FileFormat>,
    /// Rows written (entities for XML)
    pub rows: usize,
    /// Whether the destination was written
    pub written: bool,
}

impl ExportReport {
    fn skipped(path: &Path, format: Option<FileFormat>) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            rows: 0,
            written: false,
        }
    }
}

/// Writes entities to files, choosing the codec by extension.
///
/// The first entity is the primary one: its sub-table feeds ASCII, CSV and
/// DBF exports. XML exports every entity.
pub struct Exporter<'a> {
    entities: &'a [Entity],
    options: ExportOptions,
    embedded: Option<String>,
    joins: Vec<(JoinSpec, Option<&'a dyn JoinSource>)>,
    dbf: Option<Arc<dyn DbfCodec>>,
}

impl<'a> Exporter<'a> {
    /// Exporter for a list of entities
    pub fn new(entities: &'a [Entity]) -> Self {
        Self {
            entities,
            options: ExportOptions::default(),
            embedded: None,
            joins: Vec::new(),
            dbf: None,
        }
    }

    /// Exporter for a single entity
    pub fn single(entity: &'a Entity) -> Self {
        Self::new(std::slice::from_ref(entity))
    }

    /// Set options; embedded list and joins named there are applied too.
    ///
    /// Replaces earlier options, including their joins. Joins added with
    /// [`Exporter::append_data`] are kept.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        if let Some(property) = options.embedded.clone() {
            self.add_embedded_data(property);
        }
        self.options = options;
        self
    }

    pub fn with_dbf_codec(mut self, codec: Arc<dyn DbfCodec>) -> Self {
        self.dbf = Some(codec);
        self
    }

    /// Write the primary entity's embedded list `property` into XML exports.
    ///
    /// A property the primary entity does not carry is reported and skipped.
    pub fn add_embedded_data(&mut self, property: impl Into<String>) -> &mut Self {
        let property = property.into();
        match self.entities.first() {
            Some(primary) if primary.embedded(&property).is_some() => {
                debug!(property = %property, "Embedded data added to export");
                self.embedded = Some(property);
            }
            _ => warn!(property = %property, "Primary entity has no such embedded list"),
        }
        self
    }

    /// Flatten related columns into each exported row.
    ///
    /// Rows are looked up in `source`; `None` looks up in the primary
    /// entity's own sub-tables.
    pub fn append_data(
        &mut self,
        join: JoinSpec,
        source: Option<&'a dyn JoinSource>,
    ) -> &mut Self {
        self.joins.push((join, source));
        self
    }

    /// Write to `path` in the format its extension names.
    ///
    /// Unsupported extensions and DBF without a codec write nothing; the
    /// report says so.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, join lookup failures and codec errors. A failed
    /// export leaves no partial destination file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<ExportReport> {
        let path = path.as_ref();
        let Some(format) = FileFormat::from_path(path) else {
            warn!(path = %path.display(), "Unsupported export format, nothing written");
            return Ok(ExportReport::skipped(path, None));
        };
        debug!(path = %path.display(), %format, "Exporting file");

        let rows = match format {
            FileFormat::Ascii => {
                let writer = TextWriter::fixed(self.options.fixed);
                self.write_text(path, &writer)?
            }
            FileFormat::Csv => {
                let writer = TextWriter::delimited(self.options.csv.clone())?;
                self.write_text(path, &writer)?
            }
            FileFormat::Xml => {
                let mut writer = XmlWriter::new().with_indent(self.options.xml_indent);
                if let Some(property) = &self.embedded {
                    writer = writer.with_embedded(property.clone());
                }
                write_atomically(path, |out| Ok(writer.write(out, self.entities)?))?;
                self.entities.len()
            }
            FileFormat::Dbf => {
                let Some(codec) = &self.dbf else {
                    warn!(path = %path.display(), "No DBF codec installed, nothing written");
                    return Ok(ExportReport::skipped(path, Some(format)));
                };
                let (records, fields) = self.records()?;
                let layout = self
                    .options
                    .dbf_layout
                    .clone()
                    .unwrap_or_else(|| default_dbf_layout(&fields, self.options.fixed.width));
                codec.write(path, &layout, &records)?;
                records.len()
            }
        };

        info!(path = %path.display(), %format, rows, "Exported file");
        Ok(ExportReport {
            path: path.to_path_buf(),
            format: Some(format),
            rows,
            written: true,
        })
    }

    fn write_text(&self, path: &Path, writer: &TextWriter) -> Result<usize> {
        let (records, fields) = self.records()?;
        write_atomically(path, |out| Ok(writer.write(out, &records, &fields)?))
    }

    /// Export records of the primary table, enriched, and the fields to write
    fn records(&self) -> Result<(Vec<Record>, Vec<FieldSpec>)> {
        let Some(primary) = self.entities.first() else {
            return Ok((Vec::new(), self.options.fields.clone()));
        };
        let table_name = self
            .options
            .table
            .as_deref()
            .unwrap_or(&primary.default_table);
        let Some(table) = primary.table(table_name) else {
            warn!(table = table_name, "Exported sub-table does not exist");
            return Ok((Vec::new(), self.options.fields.clone()));
        };

        let mut records = table.records();
        for (join, source) in self.all_joins() {
            enrich_records(&mut records, join, source.unwrap_or(primary))?;
        }

        let fields = if self.options.fields.is_empty() {
            let joined = self.all_joins().flat_map(|(join, _)| join.targets());
            FieldSpec::from_names(table.fields.iter().map(String::as_str).chain(joined))
        } else {
            self.options.fields.clone()
        };
        Ok((records, fields))
    }

    /// Joins from the options, then those added through `append_data`
    fn all_joins(&self) -> impl Iterator<Item = (&JoinSpec, Option<&'a dyn JoinSource>)> + '_ {
        self.options
            .joins
            .iter()
            .map(|join| (join, None))
            .chain(self.joins.iter().map(|(join, source)| (join, *source)))
    }
}

/// Character columns sized like the fixed-width export
fn default_dbf_layout(fields: &[FieldSpec], width: usize) -> DbfLayout {
    DbfLayout::Fields(
        fields
            .iter()
            .map(|field| {
                DbfFieldDescriptor::new(&field.name, "C")
                    .with_param(field.width.unwrap_or(width).to_string())
            })
            .collect(),
    )
}

/// Write through a temporary file in the destination directory, then move
/// it into place
fn write_atomically<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    if let Some(permissions) = destination_permissions(path) {
        temp.as_file().set_permissions(permissions)?;
    }
    let written = {
        let mut out = BufWriter::new(temp.as_file_mut());
        let written = write(&mut out)?;
        out.flush()?;
        written
    };
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    debug!(path = %path.display(), "Persisted export");
    Ok(written)
}

/// Permissions the exported file should end up with: those of the file it
/// replaces, else world-readable. Temporary files are created owner-only.
fn destination_permissions(path: &Path) -> Option<fs::Permissions> {
    if let Ok(metadata) = fs::metadata(path) {
        return Some(metadata.permissions());
    }
    new_file_permissions()
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}
