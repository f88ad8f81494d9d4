//! Write side: append rows cell by cell, publish them atomically per row.

use crate::reader::{ReadColumn, TableReader};
use crate::schema::{ColumnKind, TableSchema};
use sarani_core::{Config, Error, Result};
use sarani_store::{frame, ByteArena, DedupIndex, OffsetTable};
use tracing::debug;

/// Write-time storage for one column.
#[derive(Debug)]
enum WriteColumn {
    Fixed { width: u32, bytes: Vec<u8> },
    Text {
        /// Present when the column deduplicates repeated values.
        dedup: Option<DedupIndex>,
        offsets: OffsetTable,
    },
}

/// A cell staged for the currently open row.
#[derive(Debug)]
enum StagedCell {
    Fixed(Vec<u8>),
    /// Frame offset in the arena. The frame is fully written before it is
    /// staged, and reaches the offset table only in `end_row`, so a
    /// half-written or abandoned frame is never linked into the table.
    Text(u32),
}

/// Single-writer, append-only table builder.
///
/// Rows become visible to readers only when `end_row` completes;
/// `committed_rows` is the published row count and never counts an open row.
#[derive(Debug)]
pub struct TableWriter {
    schema: TableSchema,
    arena: ByteArena,
    columns: Vec<WriteColumn>,
    committed_rows: usize,
    pending: Option<Vec<Option<StagedCell>>>,
}

impl TableWriter {
    /// Create a writer for an empty table.
    pub fn new(schema: TableSchema) -> Self {
        Self::with_arena(schema, ByteArena::new())
    }

    /// Create a writer whose arena is pre-sized from the configuration.
    pub fn with_config(schema: TableSchema, config: &Config) -> Self {
        Self::with_arena(
            schema,
            ByteArena::with_capacity(config.arena_initial_capacity),
        )
    }

    fn with_arena(schema: TableSchema, arena: ByteArena) -> Self {
        let columns = schema
            .columns()
            .iter()
            .map(|spec| match spec.kind {
                ColumnKind::Fixed { width } => WriteColumn::Fixed {
                    width,
                    bytes: Vec::new(),
                },
                ColumnKind::Text { dedup } => WriteColumn::Text {
                    dedup: dedup.then(DedupIndex::new),
                    offsets: OffsetTable::new(),
                },
            })
            .collect();

        Self {
            schema,
            arena,
            columns,
            committed_rows: 0,
            pending: None,
        }
    }

    /// Reopen a finalized table for further appends.
    ///
    /// Dedup indexes are build-time structures and are not persisted; this
    /// rebuilds them from the arena for columns that deduplicate.
    pub fn resume(reader: TableReader) -> Result<Self> {
        let TableReader {
            schema,
            arena,
            columns,
            rows,
        } = reader;

        let mut write_columns = Vec::with_capacity(columns.len());
        for (spec, stored) in schema.columns().iter().zip(columns) {
            let column = match (spec.kind, stored) {
                (ColumnKind::Fixed { .. }, ReadColumn::Fixed { width, bytes }) => {
                    WriteColumn::Fixed { width, bytes }
                }
                (ColumnKind::Text { dedup }, ReadColumn::Text { offsets }) => WriteColumn::Text {
                    dedup: if dedup {
                        Some(DedupIndex::rebuild(&arena)?)
                    } else {
                        None
                    },
                    offsets,
                },
                _ => {
                    return Err(Error::Schema(
                        "column storage does not match schema".into(),
                    ))
                }
            };
            write_columns.push(column);
        }
        debug!(rows, "resumed table writer");

        Ok(Self {
            schema,
            arena,
            columns: write_columns,
            committed_rows: rows,
            pending: None,
        })
    }

    /// The table's schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows visible to readers. Never includes an open row.
    pub fn committed_rows(&self) -> usize {
        self.committed_rows
    }

    /// Bytes currently used by the arena, including frames not yet linked
    /// into any committed row.
    pub fn arena_size(&self) -> u32 {
        self.arena.size()
    }

    /// Open a new row for writing.
    pub fn begin_row(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::Schema("a row is already open".into()));
        }
        self.pending = Some((0..self.columns.len()).map(|_| None).collect());
        Ok(())
    }

    /// Stage the value for one cell of the open row.
    ///
    /// Variable-length values are framed into the arena immediately (through
    /// the dedup index when the column deduplicates); fixed-width values are
    /// validated against the column width and buffered.
    pub fn put_cell(&mut self, column: usize, value: &[u8]) -> Result<()> {
        let staged = self
            .pending
            .as_mut()
            .ok_or_else(|| Error::Schema("no open row; call begin_row first".into()))?;
        if column >= staged.len() {
            return Err(Error::IndexOutOfRange {
                index: column,
                len: staged.len(),
            });
        }
        if staged[column].is_some() {
            let name = &self.schema.column(column)?.name;
            return Err(Error::Schema(format!("cell {name:?} already set")));
        }

        let cell = match &mut self.columns[column] {
            WriteColumn::Fixed { width, .. } => {
                if value.len() != *width as usize {
                    let name = &self.schema.column(column)?.name;
                    return Err(Error::Schema(format!(
                        "cell {name:?} expects {width} bytes, got {}",
                        value.len()
                    )));
                }
                StagedCell::Fixed(value.to_vec())
            }
            WriteColumn::Text { dedup, .. } => {
                let offset = match dedup {
                    Some(index) => index.lookup_or_insert(&mut self.arena, value)?,
                    None => frame::encode(&mut self.arena, value)?,
                };
                StagedCell::Text(offset)
            }
        };

        if let Some(staged) = self.pending.as_mut() {
            staged[column] = Some(cell);
        }
        Ok(())
    }

    /// Commit the open row, making it visible to readers.
    ///
    /// Fails if any cell is missing; the row stays open so the caller can
    /// fill the gap and retry. No partially filled row is ever published.
    pub fn end_row(&mut self) -> Result<()> {
        let staged = self
            .pending
            .as_ref()
            .ok_or_else(|| Error::Schema("no open row to end".into()))?;

        if let Some(missing) = staged.iter().position(Option::is_none) {
            let name = &self.schema.column(missing)?.name;
            return Err(Error::Schema(format!("row is missing cell {name:?}")));
        }

        let staged = self.pending.take().unwrap_or_default();
        for (column, cell) in self.columns.iter_mut().zip(staged) {
            match (column, cell) {
                (WriteColumn::Fixed { bytes, .. }, Some(StagedCell::Fixed(value))) => {
                    bytes.extend_from_slice(&value);
                }
                (WriteColumn::Text { offsets, .. }, Some(StagedCell::Text(offset))) => {
                    offsets.append(offset);
                }
                _ => unreachable!("staged cell kind matches its column"),
            }
        }
        self.committed_rows += 1;
        Ok(())
    }

    /// Finalize the table for reading.
    ///
    /// Dedup indexes are discarded (they are rebuildable from the arena) and
    /// any open row is dropped unpublished.
    pub fn finish(self) -> TableReader {
        if self.pending.is_some() {
            debug!("discarding open row at finish");
        }
        let columns = self
            .columns
            .into_iter()
            .map(|column| match column {
                WriteColumn::Fixed { width, bytes } => ReadColumn::Fixed { width, bytes },
                WriteColumn::Text { offsets, .. } => ReadColumn::Text { offsets },
            })
            .collect();

        TableReader::new(self.schema, self.arena, columns, self.committed_rows)
    }
}
