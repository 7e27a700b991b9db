//! Row-join enrichment
//!
//! Flattens columns of a related table into export records: for each record
//! one related row is fetched where the join field equals the record's key,
//! and the configured columns are copied in, optionally renamed.

use crate::Result;
use afp_model::{JoinSource, Record};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Join of export records against a related table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Field of the exported record holding the key
    pub key_field: String,
    /// Related table to look up
    pub table: String,
    /// Field of the related table matched against the key
    pub join_field: String,
    /// Columns copied from the related row
    #[serde(default)]
    pub columns: Vec<JoinColumn>,
}

/// One copied column, stored under `rename` when given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JoinColumnRepr")]
pub struct JoinColumn {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JoinColumnRepr {
    Name(String),
    Full {
        source: String,
        #[serde(default)]
        rename: Option<String>,
    },
}

impl From<JoinColumnRepr> for JoinColumn {
    fn from(repr: JoinColumnRepr) -> Self {
        match repr {
            JoinColumnRepr::Name(source) => JoinColumn {
                source,
                rename: None,
            },
            JoinColumnRepr::Full { source, rename } => JoinColumn { source, rename },
        }
    }
}

impl JoinColumn {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            rename: None,
        }
    }

    pub fn renamed(source: impl Into<String>, rename: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            rename: Some(rename.into()),
        }
    }

    /// Field name in the enriched record
    pub fn target(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.source)
    }
}

impl JoinSpec {
    pub fn new(
        key_field: impl Into<String>,
        table: impl Into<String>,
        join_field: impl Into<String>,
    ) -> Self {
        Self {
            key_field: key_field.into(),
            table: table.into(),
            join_field: join_field.into(),
            columns: Vec::new(),
        }
    }

    /// Copy a column under its own name
    pub fn column(mut self, source: impl Into<String>) -> Self {
        self.columns.push(JoinColumn::new(source));
        self
    }

    /// Copy a column under another name
    pub fn column_as(mut self, source: impl Into<String>, rename: impl Into<String>) -> Self {
        self.columns.push(JoinColumn::renamed(source, rename));
        self
    }

    /// Output field names added by this join
    pub fn targets(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(JoinColumn::target)
    }
}

/// Enrich `records` in place; returns how many found a related row.
///
/// Records without a key, or whose key has no related row, are left as
/// they are. Related columns that are null stay absent.
///
/// # Errors
///
/// Propagates lookup failures of `source`, such as an unknown table.
pub fn enrich_records(
    records: &mut [Record],
    join: &JoinSpec,
    source: &dyn JoinSource,
) -> Result<usize> {
    let mut matched = 0;
    for record in records.iter_mut() {
        let Some(key) = record.get(&join.key_field).cloned() else {
            trace!(key_field = %join.key_field, "Record without join key");
            continue;
        };
        let Some(related) = source.find_row(&join.table, &join.join_field, &key)? else {
            trace!(table = %join.table, key = %key, "No related row");
            continue;
        };
        for column in &join.columns {
            if let Some(value) = related.get(&column.source) {
                record.insert(column.target().to_string(), value.clone());
            }
        }
        matched += 1;
    }
    debug!(
        table = %join.table,
        records = records.len(),
        matched,
        "Enriched export records"
    );
    Ok(matched)
}
