//! Read side of a finalized table.

use crate::schema::TableSchema;
use sarani_core::{Error, Result};
use sarani_store::{frame, ByteArena, ByteView, OffsetTable};

/// Storage for one column of a finalized table.
#[derive(Debug, Clone)]
pub(crate) enum ReadColumn {
    /// Packed fixed-width cells, `width` bytes per row.
    Fixed { width: u32, bytes: Vec<u8> },
    /// Variable-length cells addressed through an offset table.
    Text { offsets: OffsetTable },
}

/// Finalized, immutable table: cells are resolved through each column's
/// offset table (or fixed buffer) in O(1).
///
/// Nothing here has interior mutability, so a shared `&TableReader` can be
/// read from any number of threads without synchronization.
#[derive(Debug, Clone)]
pub struct TableReader {
    pub(crate) schema: TableSchema,
    pub(crate) arena: ByteArena,
    pub(crate) columns: Vec<ReadColumn>,
    pub(crate) rows: usize,
}

impl TableReader {
    pub(crate) fn new(
        schema: TableSchema,
        arena: ByteArena,
        columns: Vec<ReadColumn>,
        rows: usize,
    ) -> Self {
        Self {
            schema,
            arena,
            columns,
            rows,
        }
    }

    /// The table's schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of committed rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The arena holding all variable-length cell data.
    pub fn arena(&self) -> &ByteArena {
        &self.arena
    }

    /// Get the cell at (`row`, `column`).
    pub fn get_cell(&self, row: usize, column: usize) -> Result<ByteView<'_>> {
        if row >= self.rows {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.rows,
            });
        }
        let stored = self.columns.get(column).ok_or(Error::IndexOutOfRange {
            index: column,
            len: self.columns.len(),
        })?;

        match stored {
            ReadColumn::Fixed { width, bytes } => {
                let start = row * *width as usize;
                Ok(ByteView::new(&bytes[start..start + *width as usize]))
            }
            ReadColumn::Text { offsets } => {
                let offset = offsets.get(row)?;
                let (view, _) = frame::decode(self.arena.as_bytes(), offset)?;
                Ok(view)
            }
        }
    }

    /// Arena offset of the frame backing a text cell.
    ///
    /// Useful for callers that keep offsets instead of values; two rows that
    /// deduplicated to the same value report the same offset. Fixed columns
    /// have no frame and fail with a schema error.
    pub fn cell_offset(&self, row: usize, column: usize) -> Result<u32> {
        if row >= self.rows {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.rows,
            });
        }
        let stored = self.columns.get(column).ok_or(Error::IndexOutOfRange {
            index: column,
            len: self.columns.len(),
        })?;

        match stored {
            ReadColumn::Fixed { .. } => {
                let name = &self.schema.column(column)?.name;
                Err(Error::Schema(format!(
                    "column {name:?} is fixed-width and has no frame offset"
                )))
            }
            ReadColumn::Text { offsets } => offsets.get(row),
        }
    }

    /// Get a cell by column name.
    pub fn get_cell_by_name(&self, row: usize, name: &str) -> Result<ByteView<'_>> {
        let column = self
            .schema
            .column_index(name)
            .ok_or_else(|| Error::Schema(format!("unknown column {name:?}")))?;
        self.get_cell(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, TableSchema};
    use crate::writer::TableWriter;

    fn two_row_table() -> TableReader {
        let schema = TableSchema::new(vec![
            ColumnSpec::fixed("id", 4),
            ColumnSpec::text("payload", true),
        ])
        .unwrap();
        let mut writer = TableWriter::new(schema);

        for (id, payload) in [(1u32, b"first".as_slice()), (2u32, b"second".as_slice())] {
            writer.begin_row().unwrap();
            writer.put_cell(0, &id.to_le_bytes()).unwrap();
            writer.put_cell(1, payload).unwrap();
            writer.end_row().unwrap();
        }
        writer.finish()
    }

    #[test]
    fn test_get_cell_both_kinds() {
        let table = two_row_table();

        assert_eq!(table.get_cell(0, 0).unwrap().data(), &1u32.to_le_bytes());
        assert_eq!(table.get_cell(1, 0).unwrap().data(), &2u32.to_le_bytes());
        assert_eq!(table.get_cell(0, 1).unwrap().data(), b"first");
        assert_eq!(table.get_cell(1, 1).unwrap().data(), b"second");

        // Fixed cells live inline; only the text payloads are framed.
        assert_eq!(frame::count(table.arena().as_bytes()).unwrap(), 2);
    }

    #[test]
    fn test_row_and_column_bounds() {
        let table = two_row_table();

        assert!(matches!(
            table.get_cell(2, 0).unwrap_err(),
            Error::IndexOutOfRange { index: 2, len: 2 }
        ));
        assert!(matches!(
            table.get_cell(0, 2).unwrap_err(),
            Error::IndexOutOfRange { index: 2, len: 2 }
        ));
    }

    #[test]
    fn test_get_cell_by_name() {
        let table = two_row_table();

        assert_eq!(table.get_cell_by_name(0, "payload").unwrap().data(), b"first");
        assert!(matches!(
            table.get_cell_by_name(0, "nope").unwrap_err(),
            Error::Schema(_)
        ));
    }
}
