//! File format detection by extension

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Fixed-width ASCII (export only)
    Ascii,
    /// Delimited text
    Csv,
    /// AfpDocument XML
    Xml,
    /// dBASE table, handled by a pluggable codec
    Dbf,
}

impl FileFormat {
    /// Detect the format from a file extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "asc" => Some(FileFormat::Ascii),
            "csv" => Some(FileFormat::Csv),
            "xml" => Some(FileFormat::Xml),
            "dbf" => Some(FileFormat::Dbf),
            _ => None,
        }
    }

    /// Canonical extension
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Ascii => "asc",
            FileFormat::Csv => "csv",
            FileFormat::Xml => "xml",
            FileFormat::Dbf => "dbf",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_ignores_case() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.CSV")), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_path(Path::new("out.Asc")), Some(FileFormat::Ascii));
        assert_eq!(FileFormat::from_path(Path::new("doc.xml")), Some(FileFormat::Xml));
        assert_eq!(FileFormat::from_path(Path::new("t.dbf")), Some(FileFormat::Dbf));
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(FileFormat::from_path(Path::new("report.pdf")), None);
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
        assert_eq!(FileFormat::from_path(Path::new(".csv")), None);
    }
}
