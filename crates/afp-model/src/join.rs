//! Related-row lookups

use crate::entity::{Entity, Record};
use crate::value::Value;
use crate::{Error, Result};

/// A store that can fetch one related row by key.
///
/// Exports call this once per exported row; implementations backed by a real
/// store should expect that access pattern.
pub trait JoinSource {
    /// Fetch the first row of `table` whose `field` equals `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be queried. A missing row is
    /// `Ok(None)`.
    fn find_row(&self, table: &str, field: &str, key: &Value) -> Result<Option<Record>>;
}

impl JoinSource for Entity {
    fn find_row(&self, table: &str, field: &str, key: &Value) -> Result<Option<Record>> {
        let sub_table = self.table(table).ok_or_else(|| Error::table_not_found(table))?;
        let Some(column) = sub_table.field_index(field) else {
            return Ok(None);
        };
        let found = sub_table
            .rows
            .iter()
            .position(|row| row.get(column) == Some(key));
        Ok(found.and_then(|index| sub_table.record(index)))
    }
}

impl<T: JoinSource + ?Sized> JoinSource for &T {
    fn find_row(&self, table: &str, field: &str, key: &Value) -> Result<Option<Record>> {
        (**self).find_row(table, field, key)
    }
}
