//! AfpDocument writer

use crate::Result;
use crate::syntax::{
    ATTR_COUNT, ATTR_NAME, ATTR_PROPERTY, ATTR_TYPE, DECLARATION, DOCUMENT_TAG,
    EMBEDDED_LIST_TAG, FIELD_TAG, NAMESPACE, SELECTION_LIST_TAG, SELECTION_TAG, TABLE_ROW_TAG, VALUE_TAG,
    escape,
};
use afp_model::{Entity, SubTable, Value};
use std::io::Write;
use tracing::{debug, trace};

/// Default indentation per nesting level
pub const DEFAULT_INDENT: usize = 2;

/// Serializer for entities in the AfpDocument format
#[derive(Debug, Clone)]
pub struct XmlWriter {
    indent: usize,
    embedded: Option<String>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            embedded: None,
        }
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spaces per nesting level
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Also write each top-level entity's embedded list `property`
    pub fn with_embedded(mut self, property: impl Into<String>) -> Self {
        self.embedded = Some(property.into());
        self
    }

    /// Write a complete document.
    ///
    /// Each selection declares its schema fields before its rows. Null
    /// fields are omitted from rows. Values whose text would read back as a
    /// different kind carry a `type` attribute.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from `out`.
    pub fn write<W: Write>(&self, mut out: W, entities: &[Entity]) -> Result<()> {
        writeln!(out, "{DECLARATION}")?;
        writeln!(out, "<{DOCUMENT_TAG} xmlns=\"{NAMESPACE}\">")?;
        for entity in entities {
            self.write_entity(&mut out, entity, 1, self.embedded.as_deref())?;
        }
        writeln!(out, "</{DOCUMENT_TAG}>")?;
        out.flush()?;
        debug!(entity_count = entities.len(), "Finished writing document");
        Ok(())
    }

    fn write_entity<W: Write>(
        &self,
        out: &mut W,
        entity: &Entity,
        depth: usize,
        embedded: Option<&str>,
    ) -> Result<()> {
        let pad = self.pad(depth);
        writeln!(
            out,
            "{pad}<{SELECTION_LIST_TAG} {ATTR_NAME}=\"{}\" {ATTR_TYPE}=\"{}\">",
            escape(&entity.name),
            escape(&entity.type_name)
        )?;
        for table in &entity.tables {
            self.write_table(out, table, depth + 1)?;
        }

        if let Some(property) = embedded {
            if let Some(related) = entity.embedded(property) {
                let inner = self.pad(depth + 1);
                writeln!(
                    out,
                    "{inner}<{EMBEDDED_LIST_TAG} {ATTR_PROPERTY}=\"{}\">",
                    escape(property)
                )?;
                for child in related {
                    self.write_entity(out, child, depth + 2, None)?;
                }
                writeln!(out, "{inner}</{EMBEDDED_LIST_TAG}>")?;
                trace!(property, count = related.len(), "Wrote embedded list");
            }
        }

        writeln!(out, "{pad}</{SELECTION_LIST_TAG}>")?;
        Ok(())
    }

    fn write_table<W: Write>(&self, out: &mut W, table: &SubTable, depth: usize) -> Result<()> {
        let pad = self.pad(depth);
        let row_pad = self.pad(depth + 1);
        writeln!(
            out,
            "{pad}<{SELECTION_TAG} {ATTR_NAME}=\"{}\">",
            escape(&table.name)
        )?;
        for field in &table.fields {
            writeln!(out, "{row_pad}<{FIELD_TAG} {ATTR_NAME}=\"{}\"/>", escape(field))?;
        }
        for index in 0..table.len() {
            writeln!(out, "{row_pad}<{TABLE_ROW_TAG} {ATTR_COUNT}=\"{index}\">")?;
            for (field, value) in table.row_values(index) {
                self.write_value(out, field, value, depth + 2)?;
            }
            writeln!(out, "{row_pad}</{TABLE_ROW_TAG}>")?;
        }
        writeln!(out, "{pad}</{SELECTION_TAG}>")?;
        Ok(())
    }

    fn write_value<W: Write>(
        &self,
        out: &mut W,
        field: &str,
        value: &Value,
        depth: usize,
    ) -> Result<()> {
        let pad = self.pad(depth);
        let name = escape(field);
        let text = escape(&value.to_string());
        if value.survives_coercion() {
            writeln!(out, "{pad}<{VALUE_TAG} {ATTR_NAME}=\"{name}\">{text}</{VALUE_TAG}>")?;
        } else {
            writeln!(
                out,
                "{pad}<{VALUE_TAG} {ATTR_NAME}=\"{name}\" {ATTR_TYPE}=\"{}\">{text}</{VALUE_TAG}>",
                value.kind()
            )?;
        }
        Ok(())
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(self.indent * depth)
    }
}
