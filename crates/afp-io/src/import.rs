//! Import facade

use crate::dbf::DbfCodec;
use crate::format::FileFormat;
use crate::options::ImportOptions;
use crate::{Error, Result};
use afp_adapter_csv::CsvReader;
use afp_adapter_xml::{DEFAULT_INTERPRETER, InterpreterRegistry, XmlReader};
use afp_model::{Entity, EntityRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reads entities from files, choosing the codec by extension
#[derive(Clone, Default)]
pub struct Importer {
    options: ImportOptions,
    registry: EntityRegistry,
    interpreters: InterpreterRegistry,
    dbf: Option<Arc<dyn DbfCodec>>,
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("interpreters", &self.interpreters)
            .field("dbf", &self.dbf.is_some())
            .finish()
    }
}

impl Importer {
    /// Importer with default options and a strict, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Registry used to construct entities named in XML documents
    pub fn with_registry(mut self, registry: EntityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_interpreters(mut self, interpreters: InterpreterRegistry) -> Self {
        self.interpreters = interpreters;
        self
    }

    pub fn with_dbf_codec(mut self, codec: Arc<dyn DbfCodec>) -> Self {
        self.dbf = Some(codec);
        self
    }

    /// Read `path` into entities.
    ///
    /// CSV rows are appended to `target`'s default sub-table. XML documents
    /// construct their own entities; `target` serves as the prototype for
    /// its type unless the registry already knows that type.
    ///
    /// # Errors
    ///
    /// Fixed-width files and unknown extensions are configuration errors, as
    /// is a DBF file without an installed codec. Codec and I/O errors are
    /// propagated.
    pub fn read_from_file(&self, path: impl AsRef<Path>, target: Entity) -> Result<Vec<Entity>> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).ok_or_else(|| Error::unsupported_format(path))?;
        debug!(path = %path.display(), %format, "Importing file");

        let entities = match format {
            FileFormat::Csv => CsvReader::new()
                .with_options(self.options.csv.clone())
                .with_columns(self.options.columns.clone())
                .read_from_csv_file(path, target)?,
            FileFormat::Xml => self.read_xml(path, target)?,
            FileFormat::Dbf => match &self.dbf {
                Some(codec) => codec.read(path, target)?,
                None => {
                    warn!(path = %path.display(), "No DBF codec installed");
                    return Err(Error::config("no DBF codec installed to read DBF files"));
                }
            },
            FileFormat::Ascii => {
                return Err(Error::config(
                    "fixed-width ASCII files cannot be imported; their layout is not self-describing",
                ));
            }
        };

        info!(
            path = %path.display(),
            entities = entities.len(),
            rows = entities.iter().map(Entity::row_count).sum::<usize>(),
            "Imported file"
        );
        Ok(entities)
    }

    fn read_xml(&self, path: &Path, target: Entity) -> Result<Vec<Entity>> {
        let name = self
            .options
            .interpreter
            .as_deref()
            .unwrap_or(DEFAULT_INTERPRETER);
        let interpreter = self.interpreters.get(name)?;

        let mut registry = self.registry.clone();
        if !target.type_name.is_empty() && !registry.contains(&target.type_name) {
            registry.register_prototype(target);
        }

        Ok(XmlReader::new()
            .with_vocabulary(self.options.vocabulary.clone())
            .with_interpreter(interpreter)
            .read_from_file(path, &registry)?)
    }
}

/// Read `path` with a permissive registry.
///
/// Any type named in an XML document is constructed as a generic entity.
///
/// # Errors
///
/// See [`Importer::read_from_file`].
pub fn read_from_file(
    path: impl AsRef<Path>,
    target: Entity,
    options: &ImportOptions,
) -> Result<Vec<Entity>> {
    Importer::new()
        .with_options(options.clone())
        .with_registry(EntityRegistry::permissive())
        .read_from_file(path, target)
}
