//! Per-row offset tables for O(1) random access into the arena.

use sarani_core::{Error, Result};

/// Append-only ordered sequence of arena offsets, one per logical row.
///
/// Row `i`'s entry is immutable once written; looking up row `i` never
/// requires scanning preceding records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u32>,
}

impl OffsetTable {
    /// Create a new empty offset table.
    pub fn new() -> Self {
        Self {
            offsets: Vec::new(),
        }
    }

    /// Reconstruct an offset table from previously persisted entries.
    pub fn from_offsets(offsets: Vec<u32>) -> Self {
        Self { offsets }
    }

    /// Append the offset for the next row.
    pub fn append(&mut self, offset: u32) {
        self.offsets.push(offset);
    }

    /// Get the arena offset for `row`.
    pub fn get(&self, row: usize) -> Result<u32> {
        self.offsets
            .get(row)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: row,
                len: self.offsets.len(),
            })
    }

    /// Number of rows recorded.
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Iterate over all offsets in row order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.offsets.iter().copied()
    }
}
