//! Reconstruction of entities from a tag stream
//!
//! The default [`DocumentInterpreter`] understands the AfpDocument grammar:
//!
//! ```text
//! AfpDocument
//!   AfpSelectionList (type, name)        one entity
//!     AfpSelection (name)                one sub-table
//!       AfpField (name)                  one schema field, in order
//!       AfpTableRow (count)              one row
//!         AfpValue (name[, type])        one field
//!     AfpEmbeddedList (property)         related entities
//!       AfpSelectionList ...
//! ```
//!
//! Hosts with their own document layout implement [`Interpreter`] (a
//! closure is enough) and register it by name in an [`InterpreterRegistry`].

use crate::extractor::TagToken;
use crate::syntax::{
    ATTR_COUNT, ATTR_NAME, ATTR_PROPERTY, ATTR_TYPE, DOCUMENT_TAG, EMBEDDED_LIST_TAG, FIELD_TAG,
    SELECTION_LIST_TAG, SELECTION_TAG, TABLE_ROW_TAG, VALUE_TAG,
};
use crate::{Error, Result};
use afp_model::{Entity, EntityRegistry, Value, ValueKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Name under which the default grammar is registered
pub const DEFAULT_INTERPRETER: &str = "AfpDocument";

/// How far past the end of a table an explicit row count may point.
/// Larger counts are appended instead.
pub const MAX_ROW_GAP: usize = 10_000;

/// Turns a tag stream into entities
pub trait Interpreter: Send + Sync {
    /// Build the entities described by `tokens`, constructing them through
    /// `registry`
    fn interpret(&self, tokens: &[TagToken], registry: &EntityRegistry) -> Result<Vec<Entity>>;
}

impl<F> Interpreter for F
where
    F: Fn(&[TagToken], &EntityRegistry) -> Result<Vec<Entity>> + Send + Sync,
{
    fn interpret(&self, tokens: &[TagToken], registry: &EntityRegistry) -> Result<Vec<Entity>> {
        self(tokens, registry)
    }
}

/// Interpreter for the AfpDocument grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentInterpreter;

impl Interpreter for DocumentInterpreter {
    fn interpret(&self, tokens: &[TagToken], registry: &EntityRegistry) -> Result<Vec<Entity>> {
        let mut builder = DocumentBuilder::new(registry);
        for token in tokens {
            if builder.apply(token)? {
                break;
            }
        }
        let entities = builder.finish();
        debug!(entity_count = entities.len(), "Interpreted document");
        Ok(entities)
    }
}

#[derive(Debug)]
enum Frame {
    Document,
    SelectionList(Entity),
    EmbeddedList {
        property: String,
        entities: Vec<Entity>,
    },
    Selection(String),
    Row(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Document,
    SelectionList,
    EmbeddedList,
    Selection,
    Row,
}

impl Frame {
    fn kind(&self) -> FrameKind {
        match self {
            Frame::Document => FrameKind::Document,
            Frame::SelectionList(_) => FrameKind::SelectionList,
            Frame::EmbeddedList { .. } => FrameKind::EmbeddedList,
            Frame::Selection(_) => FrameKind::Selection,
            Frame::Row(_) => FrameKind::Row,
        }
    }
}

impl FrameKind {
    fn tag(self) -> &'static str {
        match self {
            FrameKind::Document => DOCUMENT_TAG,
            FrameKind::SelectionList => SELECTION_LIST_TAG,
            FrameKind::EmbeddedList => EMBEDDED_LIST_TAG,
            FrameKind::Selection => SELECTION_TAG,
            FrameKind::Row => TABLE_ROW_TAG,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            DOCUMENT_TAG => Some(FrameKind::Document),
            SELECTION_LIST_TAG => Some(FrameKind::SelectionList),
            EMBEDDED_LIST_TAG => Some(FrameKind::EmbeddedList),
            SELECTION_TAG => Some(FrameKind::Selection),
            TABLE_ROW_TAG => Some(FrameKind::Row),
            _ => None,
        }
    }
}

/// Parse state: the open frames, innermost last, and the finished entities
struct DocumentBuilder<'r> {
    registry: &'r EntityRegistry,
    stack: Vec<Frame>,
    entities: Vec<Entity>,
}

impl<'r> DocumentBuilder<'r> {
    fn new(registry: &'r EntityRegistry) -> Self {
        Self {
            registry,
            stack: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Apply one token; returns `true` once the document is closed
    fn apply(&mut self, token: &TagToken) -> Result<bool> {
        if let Some(closed) = token.tag_type.strip_prefix('/') {
            return Ok(self.apply_close(closed));
        }

        match token.tag_type.as_str() {
            DOCUMENT_TAG => {
                if self.stack.iter().any(|f| f.kind() == FrameKind::Document) {
                    trace!("Document already open");
                } else {
                    self.stack.push(Frame::Document);
                }
            }
            SELECTION_LIST_TAG => self.open_selection_list(token)?,
            EMBEDDED_LIST_TAG => self.open_embedded_list(token),
            SELECTION_TAG => self.open_selection(token),
            FIELD_TAG => self.declare_field(token),
            TABLE_ROW_TAG => self.open_row(token),
            VALUE_TAG => self.set_value(token),
            other => trace!(tag = other, "Ignoring unknown tag"),
        }
        Ok(false)
    }

    fn apply_close(&mut self, tag: &str) -> bool {
        match FrameKind::from_tag(tag) {
            Some(FrameKind::Document) => {
                self.close(FrameKind::Document);
                true
            }
            Some(kind) => {
                self.close(kind);
                false
            }
            None => {
                trace!(tag, "Ignoring unknown close tag");
                false
            }
        }
    }

    fn open_selection_list(&mut self, token: &TagToken) -> Result<()> {
        let type_name = token
            .attribute(ATTR_TYPE)
            .ok_or_else(|| Error::missing_attribute(SELECTION_LIST_TAG, ATTR_TYPE))?;
        let mut entity = self.registry.create(type_name)?;
        if let Some(name) = token.attribute(ATTR_NAME) {
            entity.name = name.to_string();
        }
        trace!(type_name, name = %entity.name, "Opened selection list");
        self.stack.push(Frame::SelectionList(entity));
        Ok(())
    }

    fn open_embedded_list(&mut self, token: &TagToken) {
        let Some(property) = token.attribute(ATTR_PROPERTY) else {
            warn!("Embedded list without property; its entities are kept with the enclosing list");
            return;
        };
        self.stack.push(Frame::EmbeddedList {
            property: property.to_string(),
            entities: Vec::new(),
        });
    }

    fn open_selection(&mut self, token: &TagToken) {
        let Some(name) = token.attribute(ATTR_NAME) else {
            warn!("Selection without name ignored");
            return;
        };
        let Some(entity) = self.current_entity_mut() else {
            warn!(table = name, "Selection outside of a selection list ignored");
            return;
        };
        entity.open_table(name);
        self.stack.push(Frame::Selection(name.to_string()));
    }

    fn declare_field(&mut self, token: &TagToken) {
        let Some(Frame::Selection(table)) = self.stack.last() else {
            warn!(
                field = ?token.attribute(ATTR_NAME),
                "Field declaration outside of a selection ignored"
            );
            return;
        };
        let table = table.clone();
        let Some(field) = token.attribute(ATTR_NAME) else {
            warn!(table = %table, "Field declaration without name ignored");
            return;
        };
        if let Some(entity) = self.current_entity_mut() {
            entity.open_table(&table).ensure_field(field);
        }
    }

    fn open_row(&mut self, token: &TagToken) {
        let Some(table) = self.current_table() else {
            warn!("Table row outside of a selection ignored");
            return;
        };
        let explicit = match token.attribute_value(ATTR_COUNT) {
            Some(Value::Integer(n)) => usize::try_from(n).ok(),
            _ => None,
        };
        if explicit.is_none() && token.attribute(ATTR_COUNT).is_some() {
            warn!(count = ?token.attribute(ATTR_COUNT), "Invalid row count, appending instead");
        }
        let Some(entity) = self.current_entity_mut() else {
            return;
        };
        let sub_table = entity.open_table(&table);
        let next = sub_table.len();
        let index = match explicit {
            Some(count) if count <= next.saturating_add(MAX_ROW_GAP) => count,
            Some(count) => {
                warn!(
                    count,
                    rows = next,
                    "Row count too far past the end of the table, appending instead"
                );
                next
            }
            None => next,
        };
        sub_table.row_at_mut(index);
        self.stack.push(Frame::Row(index));
    }

    fn set_value(&mut self, token: &TagToken) {
        let Some(Frame::Row(row)) = self.stack.last() else {
            warn!(field = ?token.attribute(ATTR_NAME), "Value outside of a table row ignored");
            return;
        };
        let row = *row;
        let Some(field) = token.attribute(ATTR_NAME) else {
            warn!(row, "Value without name ignored");
            return;
        };
        let Some(table) = self.current_table() else {
            return;
        };
        let value = token_value(token, field);
        if let Some(entity) = self.current_entity_mut() {
            entity.open_table(&table).set_value(row, field, value);
        }
    }

    /// Pop frames down to the innermost frame of `kind`, completing each
    fn close(&mut self, kind: FrameKind) {
        let Some(depth) = self.stack.iter().rposition(|f| f.kind() == kind) else {
            warn!(tag = kind.tag(), "Close tag without matching open tag ignored");
            return;
        };
        while self.stack.len() > depth + 1 {
            if let Some(frame) = self.stack.last() {
                warn!(
                    tag = frame.kind().tag(),
                    closed_by = kind.tag(),
                    "Element closed implicitly"
                );
            }
            self.pop_frame();
        }
        self.pop_frame();
    }

    fn pop_frame(&mut self) {
        match self.stack.pop() {
            Some(Frame::SelectionList(entity)) => self.deliver(entity),
            Some(Frame::EmbeddedList { property, entities }) => {
                match self.current_entity_mut() {
                    Some(owner) => owner.set_embedded(property, entities),
                    None => warn!(
                        property = %property,
                        dropped = entities.len(),
                        "Embedded list outside of a selection list dropped"
                    ),
                }
            }
            _ => {}
        }
    }

    /// Hand a finished entity to the enclosing embedded list, or the result
    fn deliver(&mut self, entity: Entity) {
        match self.stack.last_mut() {
            Some(Frame::EmbeddedList { entities, .. }) => entities.push(entity),
            _ => self.entities.push(entity),
        }
    }

    fn current_entity_mut(&mut self) -> Option<&mut Entity> {
        self.stack.iter_mut().rev().find_map(|frame| match frame {
            Frame::SelectionList(entity) => Some(entity),
            _ => None,
        })
    }

    fn current_table(&self) -> Option<String> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Selection(name) => Some(name.clone()),
            _ => None,
        })
    }

    fn finish(mut self) -> Vec<Entity> {
        while let Some(frame) = self.stack.last() {
            if frame.kind() != FrameKind::Document {
                warn!(tag = frame.kind().tag(), "Element not closed before end of document");
            }
            self.pop_frame();
        }
        self.entities
    }
}

/// Inline text as a value, honoring an explicit `type` attribute
fn token_value(token: &TagToken, field: &str) -> Option<Value> {
    let text = token.value.as_deref()?;
    let Some(kind) = token.attribute(ATTR_TYPE) else {
        return Some(Value::coerce(text));
    };
    match kind
        .parse::<ValueKind>()
        .and_then(|kind| Value::parse_as(kind, text))
    {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field, error = %e, "Typed value unreadable, inferring its type");
            Some(Value::coerce(text))
        }
    }
}

/// Named interpreters selectable through import options
#[derive(Clone)]
pub struct InterpreterRegistry {
    interpreters: HashMap<String, Arc<dyn Interpreter>>,
}

impl InterpreterRegistry {
    /// Registry holding only the default grammar
    pub fn new() -> Self {
        let mut registry = Self {
            interpreters: HashMap::new(),
        };
        registry.register(DEFAULT_INTERPRETER, DocumentInterpreter);
        registry
    }

    /// Register an interpreter, replacing any earlier one of the same name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        interpreter: impl Interpreter + 'static,
    ) -> &mut Self {
        let name = name.into();
        debug!(interpreter = %name, "Registered interpreter");
        self.interpreters.insert(name, Arc::new(interpreter));
        self
    }

    /// Look up an interpreter by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownInterpreter`] for unregistered names.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Interpreter>> {
        self.interpreters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_interpreter(name))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.interpreters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterpreterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterRegistry")
            .field("interpreters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use crate::syntax::TagVocabulary;
    use afp_model::SubTable;

    fn interpret(document: &str, registry: &EntityRegistry) -> Vec<Entity> {
        let tokens = extract(document.lines(), &TagVocabulary::default());
        DocumentInterpreter.interpret(&tokens, registry).unwrap()
    }

    const INVOICE: &str = r#"<AfpDocument>
<AfpSelectionList name="INV-1" type="Invoice">
<AfpSelection name="Lines">
<AfpTableRow count="0">
<AfpValue name="Item">A</AfpValue>
<AfpValue name="Qty">1</AfpValue>
</AfpTableRow>
<AfpTableRow count="1">
<AfpValue name="Item">B</AfpValue>
<AfpValue name="Qty">2</AfpValue>
</AfpTableRow>
</AfpSelection>
</AfpSelectionList>
</AfpDocument>"#;

    #[test]
    fn test_invoice_lines() {
        let entities = interpret(INVOICE, &EntityRegistry::permissive());
        assert_eq!(entities.len(), 1);
        let invoice = &entities[0];
        assert_eq!(invoice.type_name, "Invoice");
        assert_eq!(invoice.name, "INV-1");

        let lines = invoice.table("Lines").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.value(0, "Item"), Some(&Value::from("A")));
        assert_eq!(lines.value(1, "Qty"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_registered_prototype_keeps_schema() {
        let mut registry = EntityRegistry::new();
        registry.register_prototype(
            Entity::new("Invoice")
                .with_default_table("Lines")
                .with_table(SubTable::with_fields("Lines", ["Qty", "Item"])),
        );
        let entities = interpret(INVOICE, &registry);
        let lines = entities[0].primary_table().unwrap();
        assert_eq!(lines.fields, vec!["Qty", "Item"]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let tokens = extract(INVOICE.lines(), &TagVocabulary::default());
        let err = DocumentInterpreter
            .interpret(&tokens, &EntityRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Model(afp_model::Error::UnknownEntityType { .. })
        ));
    }

    #[test]
    fn test_rows_without_count_append() {
        let doc = r#"<AfpDocument><AfpSelectionList type="T">
<AfpSelection name="S">
<AfpTableRow><AfpValue name="n">1</AfpValue></AfpTableRow>
<AfpTableRow><AfpValue name="n">2</AfpValue></AfpTableRow>
<AfpTableRow count="5"><AfpValue name="n">6</AfpValue></AfpTableRow>
</AfpSelection></AfpSelectionList></AfpDocument>"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        let table = entities[0].table("S").unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.value(1, "n"), Some(&Value::Integer(2)));
        assert_eq!(table.value(3, "n"), None);
        assert_eq!(table.value(5, "n"), Some(&Value::Integer(6)));
    }

    #[test]
    fn test_oversized_row_count_appends() {
        let doc = r#"<AfpDocument><AfpSelectionList type="T">
<AfpSelection name="S">
<AfpTableRow count="9223372036854775807"><AfpValue name="n">1</AfpValue></AfpTableRow>
<AfpTableRow count="100000000"><AfpValue name="n">2</AfpValue></AfpTableRow>
<AfpTableRow count="-4"><AfpValue name="n">3</AfpValue></AfpTableRow>
</AfpSelection></AfpSelectionList></AfpDocument>"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        let table = entities[0].table("S").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.value(0, "n"), Some(&Value::Integer(1)));
        assert_eq!(table.value(1, "n"), Some(&Value::Integer(2)));
        assert_eq!(table.value(2, "n"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_row_count_within_gap_pads() {
        let doc = format!(
            r#"<AfpDocument><AfpSelectionList type="T"><AfpSelection name="S">
<AfpTableRow count="{MAX_ROW_GAP}"><AfpValue name="n">1</AfpValue></AfpTableRow>
</AfpSelection></AfpSelectionList></AfpDocument>"#
        );
        let entities = interpret(&doc, &EntityRegistry::permissive());
        assert_eq!(entities[0].table("S").unwrap().len(), MAX_ROW_GAP + 1);
    }

    #[test]
    fn test_field_declarations_fix_schema_order() {
        let doc = r#"<AfpDocument><AfpSelectionList type="T"><AfpSelection name="S">
<AfpField name="A"/>
<AfpField name="B"/>
<AfpField name="C"/>
<AfpTableRow count="0"><AfpValue name="B">b0</AfpValue></AfpTableRow>
</AfpSelection>
<AfpField name="stray"/>
</AfpSelectionList></AfpDocument>"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        let table = entities[0].table("S").unwrap();
        assert_eq!(table.fields, vec!["A", "B", "C"]);
        assert_eq!(table.value(0, "A"), None);
        assert_eq!(table.value(0, "B"), Some(&Value::from("b0")));
    }

    #[test]
    fn test_type_attribute_overrides_inference() {
        let doc = r#"<AfpDocument><AfpSelectionList type="T"><AfpSelection name="S"><AfpTableRow count="0">
<AfpValue name="code" type="string">007</AfpValue>
<AfpValue name="flag" type="integer">yes</AfpValue>
<AfpValue name="gone"/>
</AfpTableRow></AfpSelection></AfpSelectionList></AfpDocument>"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        let table = entities[0].table("S").unwrap();
        assert_eq!(table.value(0, "code"), Some(&Value::from("007")));
        assert_eq!(table.value(0, "flag"), Some(&Value::from("yes")));
        assert_eq!(table.value(0, "gone"), None);
    }

    #[test]
    fn test_multiple_entities_in_order() {
        let doc = r#"<AfpDocument>
<AfpSelectionList type="A" name="first"></AfpSelectionList>
<AfpSelectionList type="B" name="second"></AfpSelectionList>
</AfpDocument>"#;
        let names: Vec<String> = interpret(doc, &EntityRegistry::permissive())
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_embedded_list_attaches_to_owner() {
        let doc = r#"<AfpDocument>
<AfpSelectionList type="Order" name="O-1">
<AfpSelection name="Main"><AfpTableRow count="0"><AfpValue name="No">1</AfpValue></AfpTableRow></AfpSelection>
<AfpEmbeddedList property="Positions">
<AfpSelectionList type="Position" name="P-1"></AfpSelectionList>
<AfpSelectionList type="Position" name="P-2"></AfpSelectionList>
</AfpEmbeddedList>
</AfpSelectionList>
</AfpDocument>"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        assert_eq!(entities.len(), 1);
        let positions = entities[0].embedded("Positions").unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[1].name, "P-2");
    }

    #[test]
    fn test_mismatched_nesting_recovers() {
        // Row and selection never closed; the selection list close pops both
        let doc = r#"<AfpDocument>
<AfpSelectionList type="T" name="x">
<AfpSelection name="S"><AfpTableRow count="0"><AfpValue name="a">1</AfpValue>
</AfpSelectionList>
</AfpTableRow>
<AfpValue name="late">2</AfpValue>
</AfpDocument>"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        assert_eq!(entities.len(), 1);
        let table = entities[0].table("S").unwrap();
        assert_eq!(table.value(0, "a"), Some(&Value::Integer(1)));
        assert_eq!(table.field_index("late"), None);
    }

    #[test]
    fn test_unterminated_document_still_delivers() {
        let doc = r#"<AfpDocument><AfpSelectionList type="T" name="open">"#;
        let entities = interpret(doc, &EntityRegistry::permissive());
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "open");
    }

    #[test]
    fn test_closure_interpreter_in_registry() {
        let mut registry = InterpreterRegistry::new();
        registry.register(
            "count-only",
            |tokens: &[TagToken], _: &EntityRegistry| -> Result<Vec<Entity>> {
                let mut entity = Entity::new("Summary");
                entity
                    .primary_table_mut()
                    .append_record([("tags", Some(Value::Integer(tokens.len() as i64)))]);
                Ok(vec![entity])
            },
        );
        assert_eq!(registry.names(), vec!["AfpDocument", "count-only"]);

        let interpreter = registry.get("count-only").unwrap();
        let tokens = extract(INVOICE.lines(), &TagVocabulary::default());
        let entities = interpreter
            .interpret(&tokens, &EntityRegistry::new())
            .unwrap();
        assert_eq!(
            entities[0].primary_table().unwrap().value(0, "tags"),
            Some(&Value::Integer(tokens.len() as i64))
        );
        assert!(matches!(
            registry.get("missing"),
            Err(Error::UnknownInterpreter { .. })
        ));
    }
}
