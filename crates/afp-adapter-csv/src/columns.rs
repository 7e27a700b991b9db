//! Column mapping from target fields to source columns

use afp_model::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::{trace, warn};

/// Where a target field's value comes from in a source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLocator {
    /// Literal zero-based column index
    Index(usize),
    /// Header name, or an index written as text when no header is used
    Name(String),
}

/// Ordered mapping of target field → column locator.
///
/// Deserializes from a map (`{Name: 0, Age: "Age"}`) and keeps the
/// document order of its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    entries: Vec<(String, ColumnLocator)>,
}

/// Column spec resolved against a concrete header (or none)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, Option<usize>)>,
}

impl ColumnSpec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a field to a literal column index
    pub fn index(mut self, field: impl Into<String>, column: usize) -> Self {
        self.entries.push((field.into(), ColumnLocator::Index(column)));
        self
    }

    /// Map a field to a header name
    pub fn name(mut self, field: impl Into<String>, header: impl Into<String>) -> Self {
        self.entries
            .push((field.into(), ColumnLocator::Name(header.into())));
        self
    }

    /// Map fields to consecutive columns starting at 0
    pub fn positional<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: fields
                .into_iter()
                .enumerate()
                .map(|(i, field)| (field.into(), ColumnLocator::Index(i)))
                .collect(),
        }
    }

    /// Map each header name to a field of the same name
    pub fn from_header(header: &[String]) -> Self {
        Self {
            entries: header
                .iter()
                .map(|name| {
                    let name = name.trim().to_string();
                    (name.clone(), ColumnLocator::Name(name))
                })
                .filter(|(name, _)| !name.is_empty())
                .collect(),
        }
    }

    /// Whether no field is mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in order
    pub fn entries(&self) -> &[(String, ColumnLocator)] {
        &self.entries
    }

    /// Resolve locators to indices.
    ///
    /// With a header, name locators are looked up in it; without one they
    /// must be numeric. Unresolvable locators are logged and left unmapped.
    pub fn resolve(&self, header: Option<&[String]>) -> ColumnMap {
        let entries = self
            .entries
            .iter()
            .map(|(field, locator)| {
                let index = match (locator, header) {
                    (ColumnLocator::Index(i), _) => Some(*i),
                    (ColumnLocator::Name(name), Some(header)) => {
                        let found = header.iter().position(|h| h.trim() == name.trim());
                        if found.is_none() {
                            warn!(field = %field, column = %name, "Column not found in header");
                        }
                        found
                    }
                    (ColumnLocator::Name(name), None) => match name.trim().parse::<usize>() {
                        Ok(i) => Some(i),
                        Err(_) => {
                            warn!(
                                field = %field,
                                column = %name,
                                "Column locator is not an index and no header is used"
                            );
                            None
                        }
                    },
                };
                (field.clone(), index)
            })
            .collect();
        ColumnMap { entries }
    }
}

impl ColumnMap {
    /// Resolved entries in order
    pub fn entries(&self) -> &[(String, Option<usize>)] {
        &self.entries
    }

    /// Map one tokenized line to field values.
    ///
    /// Fields whose column is unresolved or past the end of the line are
    /// omitted. An exactly empty cell maps to an explicit null.
    pub fn apply<'a>(&'a self, tokens: &[String]) -> Vec<(&'a str, Option<Value>)> {
        let mut values = Vec::with_capacity(self.entries.len());
        for (field, index) in &self.entries {
            let Some(raw) = index.and_then(|i| tokens.get(i)) else {
                trace!(field = %field, "No source column for field");
                continue;
            };
            let value = if raw.is_empty() {
                None
            } else {
                Some(Value::coerce(raw))
            };
            values.push((field.as_str(), value));
        }
        values
    }
}

impl Serialize for ColumnSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, locator) in &self.entries {
            map.serialize_entry(field, locator)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = ColumnSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to column index or header name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ColumnSpec, A::Error> {
                let mut spec = ColumnSpec::new();
                while let Some((field, locator)) = map.next_entry::<String, ColumnLocator>()? {
                    spec.entries.push((field, locator));
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}
