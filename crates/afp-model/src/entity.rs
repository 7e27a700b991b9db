//! Entity, sub-table and row containers
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the sub-table used when an entity is built without one.
pub const DEFAULT_TABLE: &str = "Main";

/// A row flattened to field name → value, nulls omitted.
pub type Record = HashMap<String, Value>;

/// A named root record owning named sub-tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Dotted type name used to construct the entity by late binding
    pub type_name: String,

    /// Instance name (the `name` attribute of a selection list)
    pub name: String,

    /// Sub-table targeted by CSV import and ASCII/CSV export
    pub default_table: String,

    /// Owned sub-tables in insertion order
    pub tables: Vec<SubTable>,

    /// Named lists of related entities
    pub embedded: Vec<EmbeddedList>,
}

/// A list of related entities stored under a property name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedList {
    /// Property the list is read from
    pub property: String,

    /// Related entities in order
    pub entities: Vec<Entity>,
}

/// An ordered collection of rows sharing one field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTable {
    /// Table name
    pub name: String,

    /// Field names; row values line up with this list
    pub fields: Vec<String>,

    /// Rows in order
    pub rows: Vec<Row>,
}

/// One record of a sub-table, positionally aligned to the table's fields.
///
/// Fields past the end of `values` read as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Option<Value>>,
}

impl Entity {
    /// Create an empty entity of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: String::new(),
            default_table: DEFAULT_TABLE.to_string(),
            tables: Vec::new(),
            embedded: Vec::new(),
        }
    }

    /// Set the instance name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the default sub-table name
    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = table.into();
        self
    }

    /// Add (or replace) a sub-table
    pub fn with_table(mut self, table: SubTable) -> Self {
        match self.tables.iter().position(|t| t.name == table.name) {
            Some(pos) => self.tables[pos] = table,
            None => self.tables.push(table),
        }
        self
    }

    /// Find a sub-table by name
    pub fn table(&self, name: &str) -> Option<&SubTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Find a sub-table by name, mutably
    pub fn table_mut(&mut self, name: &str) -> Option<&mut SubTable> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Open a sub-table, creating it empty when missing
    pub fn open_table(&mut self, name: &str) -> &mut SubTable {
        let pos = match self.tables.iter().position(|t| t.name == name) {
            Some(pos) => pos,
            None => {
                self.tables.push(SubTable::new(name));
                self.tables.len() - 1
            }
        };
        &mut self.tables[pos]
    }

    /// The default sub-table, if it exists
    pub fn primary_table(&self) -> Option<&SubTable> {
        self.table(&self.default_table)
    }

    /// The default sub-table, created when missing
    pub fn primary_table_mut(&mut self) -> &mut SubTable {
        let name = self.default_table.clone();
        self.open_table(&name)
    }

    /// Related entities stored under `property`
    pub fn embedded(&self, property: &str) -> Option<&[Entity]> {
        self.embedded
            .iter()
            .find(|list| list.property == property)
            .map(|list| list.entities.as_slice())
    }

    /// Store related entities under `property`, replacing an earlier list
    pub fn set_embedded(&mut self, property: impl Into<String>, entities: Vec<Entity>) {
        let property = property.into();
        match self.embedded.iter_mut().find(|list| list.property == property) {
            Some(list) => list.entities = entities,
            None => self.embedded.push(EmbeddedList {
                property,
                entities,
            }),
        }
    }

    /// A fresh entity of the same type with the same table schemas and no rows
    pub fn initialized_copy(&self) -> Entity {
        Entity {
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            default_table: self.default_table.clone(),
            tables: self
                .tables
                .iter()
                .map(|t| SubTable::with_fields(t.name.clone(), t.fields.clone()))
                .collect(),
            embedded: Vec::new(),
        }
    }

    /// Total rows across all sub-tables
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(SubTable::len).sum()
    }
}

impl SubTable {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create an empty table with a preset schema
    pub fn with_fields<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a field in the schema
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Position of a field, appending it to the schema when missing
    pub fn ensure_field(&mut self, field: &str) -> usize {
        match self.field_index(field) {
            Some(index) => index,
            None => {
                self.fields.push(field.to_string());
                self.fields.len() - 1
            }
        }
    }

    /// Append a row and return its index
    pub fn push_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// Row at `index`, padding with empty rows when the table is shorter
    pub fn row_at_mut(&mut self, index: usize) -> &mut Row {
        if index >= self.rows.len() {
            self.rows.resize_with(index + 1, Row::default);
        }
        &mut self.rows[index]
    }

    /// Value of `field` in row `row`
    pub fn value(&self, row: usize, field: &str) -> Option<&Value> {
        let column = self.field_index(field)?;
        self.rows.get(row)?.get(column)
    }

    /// Set `field` in row `row`, extending the schema and the table as needed
    pub fn set_value(&mut self, row: usize, field: &str, value: Option<Value>) {
        let column = self.ensure_field(field);
        self.row_at_mut(row).set(column, value);
    }

    /// Append a row built from field/value pairs
    pub fn append_record<I, S>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = (S, Option<Value>)>,
        S: AsRef<str>,
    {
        let mut row = Row::default();
        for (field, value) in values {
            let column = self.ensure_field(field.as_ref());
            row.set(column, value);
        }
        self.push_row(row)
    }

    /// Row `row` flattened to a [`Record`]
    pub fn record(&self, row: usize) -> Option<Record> {
        let row = self.rows.get(row)?;
        Some(
            self.fields
                .iter()
                .enumerate()
                .filter_map(|(i, field)| row.get(i).map(|v| (field.clone(), v.clone())))
                .collect(),
        )
    }

    /// All rows flattened to records, in order
    pub fn records(&self) -> Vec<Record> {
        (0..self.rows.len()).filter_map(|i| self.record(i)).collect()
    }

    /// Iterate `(field, value)` pairs of one row, nulls skipped
    pub fn row_values(&self, row: usize) -> impl Iterator<Item = (&str, &Value)> + '_ {
        let values = self.rows.get(row).map(|r| r.values.as_slice()).unwrap_or(&[]);
        self.fields
            .iter()
            .zip(values.iter())
            .filter_map(|(field, value)| value.as_ref().map(|v| (field.as_str(), v)))
    }
}

impl Row {
    /// Value at a schema position
    pub fn get(&self, column: usize) -> Option<&Value> {
        self.values.get(column).and_then(Option::as_ref)
    }

    /// Set a schema position; setting null past the end is a no-op
    pub fn set(&mut self, column: usize, value: Option<Value>) {
        if column >= self.values.len() {
            if value.is_none() {
                return;
            }
            self.values.resize(column + 1, None);
        }
        self.values[column] = value;
    }

    /// Number of non-null values
    pub fn populated(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        let width = self.values.len().max(other.values.len());
        (0..width).all(|i| self.get(i) == other.get(i))
    }
}
