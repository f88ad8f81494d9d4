//! On-disk table format: header, descriptor, then raw segments.
//!
//! ```text
//! [magic "SRNT" (4)] [format version u16 LE] [descriptor length u32 LE]
//! [bincode descriptor]
//! [column segment 0] ... [column segment N-1]   (schema order)
//! [arena segment]
//! ```
//!
//! A column segment is the packed little-endian `u32` offset table for a
//! text column, or the packed fixed-width cell buffer for a fixed column.
//! The descriptor records row count, schema, and every segment length, so a
//! reader can locate each segment independently and resolve cells straight
//! from the mapped file.

use crate::reader::{ReadColumn, TableReader};
use crate::schema::{ColumnKind, TableSchema};
use memmap2::Mmap;
use sarani_core::{Error, Result};
use sarani_store::{frame, ByteArena, ByteView, OffsetTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const MAGIC: &[u8; 4] = b"SRNT";
const FORMAT_VERSION: u16 = 1;
const HEADER_SIZE: usize = 10;

/// Table metadata persisted ahead of the segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableDescriptor {
    rows: u64,
    schema: TableSchema,
    /// Byte length of each column's segment, in schema order.
    column_lens: Vec<u64>,
    arena_len: u64,
}

/// Save a finalized table to `path`.
pub fn save(table: &TableReader, path: &Path) -> Result<()> {
    let column_lens = table
        .columns
        .iter()
        .map(|column| match column {
            ReadColumn::Fixed { bytes, .. } => bytes.len() as u64,
            ReadColumn::Text { offsets } => offsets.count() as u64 * 4,
        })
        .collect();

    let descriptor = TableDescriptor {
        rows: table.rows as u64,
        schema: table.schema.clone(),
        column_lens,
        arena_len: table.arena.size() as u64,
    };
    let descriptor_bytes =
        bincode::serialize(&descriptor).map_err(|e| Error::Serialization(e.to_string()))?;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&(descriptor_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&descriptor_bytes)?;

    for column in &table.columns {
        match column {
            ReadColumn::Fixed { bytes, .. } => writer.write_all(bytes)?,
            ReadColumn::Text { offsets } => {
                for offset in offsets.iter() {
                    writer.write_all(&offset.to_le_bytes())?;
                }
            }
        }
    }
    writer.write_all(table.arena.as_bytes())?;
    writer.flush()?;

    info!(path = %path.display(), rows = table.rows, "saved table");
    Ok(())
}

/// Load a table fully into memory.
pub fn load(path: &Path) -> Result<TableReader> {
    TableFile::open(path)?.to_reader()
}

/// A persisted table opened through a memory mapping.
///
/// Cells are resolved directly against the mapped file: the offset table
/// entry is read at `row * 4` inside the column's segment and the frame is
/// decoded in place, without loading the table.
#[derive(Debug)]
pub struct TableFile {
    mmap: Mmap,
    descriptor: TableDescriptor,
    /// Resolved `(start, end)` byte range per column segment.
    column_ranges: Vec<(usize, usize)>,
    arena_range: (usize, usize),
}

impl TableFile {
    /// Open and validate a table file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // The mapping is read-only; the format is append-then-finalize, so
        // no live writer mutates a saved file.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < HEADER_SIZE {
            return Err(Error::CorruptFrame("file too short for header".into()));
        }
        if &mmap[0..4] != MAGIC {
            return Err(Error::CorruptFrame("bad magic".into()));
        }
        let version = u16::from_le_bytes([mmap[4], mmap[5]]);
        if version != FORMAT_VERSION {
            return Err(Error::CorruptFrame(format!(
                "unsupported format version {version}"
            )));
        }
        let descriptor_len = u32::from_le_bytes([mmap[6], mmap[7], mmap[8], mmap[9]]) as usize;
        let data_start = HEADER_SIZE
            .checked_add(descriptor_len)
            .filter(|&start| start <= mmap.len())
            .ok_or_else(|| Error::CorruptFrame("truncated descriptor".into()))?;

        let descriptor: TableDescriptor =
            bincode::deserialize(&mmap[HEADER_SIZE..data_start])
                .map_err(|e| Error::Serialization(e.to_string()))?;

        // The descriptor came off disk, not through `TableSchema::new`;
        // re-check its invariants before trusting any of its numbers.
        if let Err(e) = descriptor.schema.validate() {
            return Err(Error::CorruptFrame(format!("invalid schema: {e}")));
        }
        if descriptor.column_lens.len() != descriptor.schema.column_count() {
            return Err(Error::CorruptFrame(
                "descriptor column count does not match schema".into(),
            ));
        }

        // Resolve segment ranges and validate them against the mapping and
        // the declared row count. All arithmetic on descriptor fields is
        // checked; a crafted file must fail with CorruptFrame, never panic.
        let file_len = mmap.len() as u64;
        let mut cursor = data_start as u64;
        let mut column_ranges = Vec::with_capacity(descriptor.column_lens.len());
        for (spec, &len) in descriptor
            .schema
            .columns()
            .iter()
            .zip(&descriptor.column_lens)
        {
            let cell_size = match spec.kind {
                ColumnKind::Fixed { width } => width as u64,
                ColumnKind::Text { .. } => 4,
            };
            let expected = descriptor.rows.checked_mul(cell_size).ok_or_else(|| {
                Error::CorruptFrame(format!(
                    "row count {} overflows segment size for column {:?}",
                    descriptor.rows, spec.name
                ))
            })?;
            if len != expected {
                return Err(Error::CorruptFrame(format!(
                    "segment for column {:?} has {len} bytes, expected {expected}",
                    spec.name
                )));
            }
            let end = cursor
                .checked_add(len)
                .filter(|&end| end <= file_len)
                .ok_or_else(|| Error::CorruptFrame("truncated column segment".into()))?;
            column_ranges.push((cursor as usize, end as usize));
            cursor = end;
        }

        let arena_end = cursor
            .checked_add(descriptor.arena_len)
            .filter(|&end| end <= file_len)
            .ok_or_else(|| Error::CorruptFrame("truncated arena segment".into()))?;
        if descriptor.arena_len % 4 != 0 {
            return Err(Error::CorruptFrame("arena segment is not 4-aligned".into()));
        }
        let arena_range = (cursor as usize, arena_end as usize);

        info!(path = %path.display(), rows = descriptor.rows, "opened table file");
        Ok(Self {
            mmap,
            descriptor,
            column_ranges,
            arena_range,
        })
    }

    /// The table's schema.
    pub fn schema(&self) -> &TableSchema {
        &self.descriptor.schema
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.descriptor.rows as usize
    }

    fn arena_bytes(&self) -> &[u8] {
        &self.mmap[self.arena_range.0..self.arena_range.1]
    }

    /// Get the cell at (`row`, `column`) straight from the mapped file.
    pub fn get_cell(&self, row: usize, column: usize) -> Result<ByteView<'_>> {
        if row >= self.rows() {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.rows(),
            });
        }
        let spec = self.descriptor.schema.column(column)?;
        let (start, _) = self.column_ranges[column];

        match spec.kind {
            ColumnKind::Fixed { width } => {
                let cell = start + row * width as usize;
                Ok(ByteView::new(&self.mmap[cell..cell + width as usize]))
            }
            ColumnKind::Text { .. } => {
                let entry = start + row * 4;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&self.mmap[entry..entry + 4]);
                let offset = u32::from_le_bytes(raw);
                let (view, _) = frame::decode(self.arena_bytes(), offset)?;
                Ok(view)
            }
        }
    }

    /// Copy the file contents into an owned, in-memory table.
    pub fn to_reader(&self) -> Result<TableReader> {
        let arena = ByteArena::from_bytes(self.arena_bytes().to_vec())?;

        let mut columns = Vec::with_capacity(self.column_ranges.len());
        for (spec, &(start, end)) in self
            .descriptor
            .schema
            .columns()
            .iter()
            .zip(&self.column_ranges)
        {
            let segment = &self.mmap[start..end];
            let column = match spec.kind {
                ColumnKind::Fixed { width } => ReadColumn::Fixed {
                    width,
                    bytes: segment.to_vec(),
                },
                ColumnKind::Text { .. } => {
                    let offsets = segment
                        .chunks_exact(4)
                        .map(|chunk| {
                            let mut raw = [0u8; 4];
                            raw.copy_from_slice(chunk);
                            u32::from_le_bytes(raw)
                        })
                        .collect();
                    ReadColumn::Text {
                        offsets: OffsetTable::from_offsets(offsets),
                    }
                }
            };
            columns.push(column);
        }

        Ok(TableReader::new(
            self.descriptor.schema.clone(),
            arena,
            columns,
            self.descriptor.rows as usize,
        ))
    }
}
