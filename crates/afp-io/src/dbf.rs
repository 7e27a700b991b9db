//! DBF codec seam
//!
//! No DBF implementation ships with this crate. Hosts that need it install a
//! [`DbfCodec`] on the importer and exporter; without one, DBF export is
//! skipped with a warning and DBF import is a configuration error.

use crate::Result;
use afp_model::{Entity, Record};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column description of a DBF table: name, type letter and size parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorRepr")]
pub struct DbfFieldDescriptor {
    pub name: String,
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Triple((String, String, String)),
    Pair((String, String)),
    Full {
        name: String,
        field_type: String,
        #[serde(default)]
        param: Option<String>,
    },
}

impl From<DescriptorRepr> for DbfFieldDescriptor {
    fn from(repr: DescriptorRepr) -> Self {
        match repr {
            DescriptorRepr::Triple((name, field_type, param)) => Self {
                name,
                field_type,
                param: Some(param),
            },
            DescriptorRepr::Pair((name, field_type)) => Self {
                name,
                field_type,
                param: None,
            },
            DescriptorRepr::Full {
                name,
                field_type,
                param,
            } => Self {
                name,
                field_type,
                param,
            },
        }
    }
}

impl DbfFieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            param: None,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }
}

/// Table layout handed to the codec on export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbfLayout {
    /// Explicit column list
    Fields(Vec<DbfFieldDescriptor>),
    /// Existing DBF file whose structure is copied
    Template(PathBuf),
}

/// Pluggable DBF reader and writer
pub trait DbfCodec: Send + Sync {
    /// Read a DBF file into `target`
    fn read(&self, path: &Path, target: Entity) -> Result<Vec<Entity>>;

    /// Write `records` to a DBF file laid out by `layout`
    fn write(&self, path: &Path, layout: &DbfLayout, records: &[Record]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_from_yaml_lists() {
        let yaml = "fields:\n  - [Name, C, \"30\"]\n  - [Active, L]\n  - name: Qty\n    field_type: N\n    param: \"8,2\"\n";
        let layout: DbfLayout = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            layout,
            DbfLayout::Fields(vec![
                DbfFieldDescriptor::new("Name", "C").with_param("30"),
                DbfFieldDescriptor::new("Active", "L"),
                DbfFieldDescriptor::new("Qty", "N").with_param("8,2"),
            ])
        );
    }

    #[test]
    fn test_template_layout() {
        let layout: DbfLayout = serde_yaml::from_str("template: /data/template.dbf\n").unwrap();
        assert_eq!(layout, DbfLayout::Template(PathBuf::from("/data/template.dbf")));
    }
}
