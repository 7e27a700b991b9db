//! AfpDocument file reader

use crate::Result;
use crate::extractor::extract_from_reader;
use crate::interpreter::{DocumentInterpreter, Interpreter};
use crate::syntax::TagVocabulary;
use afp_model::{Entity, EntityRegistry};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Reader combining tag extraction with an interpreter
#[derive(Clone)]
pub struct XmlReader {
    vocabulary: TagVocabulary,
    interpreter: Arc<dyn Interpreter>,
}

impl Default for XmlReader {
    fn default() -> Self {
        Self {
            vocabulary: TagVocabulary::default(),
            interpreter: Arc::new(DocumentInterpreter),
        }
    }
}

impl std::fmt::Debug for XmlReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlReader")
            .field("vocabulary", &self.vocabulary)
            .finish_non_exhaustive()
    }
}

impl XmlReader {
    /// Reader for the AfpDocument grammar
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different tag vocabulary
    pub fn with_vocabulary(mut self, vocabulary: TagVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Route the tag stream to another interpreter
    pub fn with_interpreter(mut self, interpreter: Arc<dyn Interpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Read all entities of a document file
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and on entity types `registry` cannot build.
    pub fn read_from_file(
        &self,
        path: impl AsRef<Path>,
        registry: &EntityRegistry,
    ) -> Result<Vec<Entity>> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading XML document");
        let file = File::open(path)?;
        self.read(BufReader::new(file), registry)
    }

    /// Read all entities from a buffered reader
    ///
    /// # Errors
    ///
    /// See [`XmlReader::read_from_file`].
    pub fn read<R: BufRead>(&self, reader: R, registry: &EntityRegistry) -> Result<Vec<Entity>> {
        let tokens = extract_from_reader(reader, &self.vocabulary)?;
        self.interpreter.interpret(&tokens, registry)
    }
}
