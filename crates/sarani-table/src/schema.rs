//! Table schema: column names, kinds, and per-column storage policy.

use sarani_core::{Config, Error, Result};
use serde::{Deserialize, Serialize};

/// Storage kind for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Fixed-width value stored inline in a packed buffer, no framing.
    Fixed { width: u32 },
    /// Variable-length value stored as a frame in the arena and addressed
    /// through the column's offset table. `dedup` selects whether repeated
    /// values share a single frame; the choice is made here, at schema
    /// time, never per call.
    Text { dedup: bool },
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Fixed-width column of `width` bytes per cell.
    pub fn fixed(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Fixed { width },
        }
    }

    /// Variable-length column with an explicit dedup policy.
    pub fn text(name: impl Into<String>, dedup: bool) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text { dedup },
        }
    }

    /// Variable-length column using the configured default dedup policy.
    pub fn text_default(name: impl Into<String>, config: &Config) -> Self {
        Self::text(name, config.dedup_text_columns)
    }
}

/// Ordered collection of column specs describing one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Create a schema, validating the column set.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the column set invariants.
    ///
    /// Deserialized schemas bypass `new`, so anything reading a schema from
    /// an untrusted source must call this before using it.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::Schema("table needs at least one column".into()));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if let ColumnKind::Fixed { width: 0 } = column.kind {
                return Err(Error::Schema(format!(
                    "fixed column {:?} has zero width",
                    column.name
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::Schema(format!(
                    "duplicate column name {:?}",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by index.
    pub fn column(&self, index: usize) -> Result<&ColumnSpec> {
        self.columns.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.columns.len(),
        })
    }

    /// Look up a column index by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_validation() {
        assert!(TableSchema::new(vec![]).is_err());
        assert!(TableSchema::new(vec![ColumnSpec::fixed("id", 0)]).is_err());
        assert!(TableSchema::new(vec![
            ColumnSpec::text("name", true),
            ColumnSpec::text("name", false),
        ])
        .is_err());
    }

    #[test]
    fn test_column_lookup() {
        let schema = TableSchema::new(vec![
            ColumnSpec::fixed("id", 8),
            ColumnSpec::text("payload", true),
        ])
        .unwrap();

        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.column_index("payload"), Some(1));
        assert_eq!(schema.column_index("missing"), None);
        assert_eq!(schema.column(0).unwrap().name, "id");
        assert!(schema.column(2).is_err());
    }

    #[test]
    fn test_text_default_follows_config() {
        let config = Config {
            dedup_text_columns: false,
            ..Default::default()
        };
        let column = ColumnSpec::text_default("payload", &config);
        assert_eq!(column.kind, ColumnKind::Text { dedup: false });
    }
}
