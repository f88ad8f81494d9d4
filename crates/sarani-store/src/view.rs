//! Non-owning, bounds-checked views over stored bytes.

use sarani_core::{Error, Result};

/// Borrowed reference to bytes stored in an arena or caller-supplied buffer.
///
/// A view never owns memory; the borrow ties its validity to the buffer it
/// came from, so no view can outlive the arena or observe a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteView<'a> {
    data: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// Create a view over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The viewed bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Length of the view in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the byte at `index`.
    ///
    /// Strict: an index at or past the end fails with `IndexOutOfRange`,
    /// never clamps.
    pub fn byte_at(&self, index: usize) -> Result<u8> {
        self.data
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.data.len(),
            })
    }

    /// Sub-view of up to `count` bytes starting at `pos`.
    ///
    /// A `pos` past the end fails with `IndexOutOfRange`, but `count` is
    /// clamped to the available remainder. This best-effort slice policy is
    /// deliberately asymmetric with the strict `byte_at` check.
    pub fn substr(&self, pos: usize, count: usize) -> Result<ByteView<'a>> {
        if pos > self.data.len() {
            return Err(Error::IndexOutOfRange {
                index: pos,
                len: self.data.len(),
            });
        }
        let end = pos + count.min(self.data.len() - pos);
        Ok(ByteView::new(&self.data[pos..end]))
    }

    /// Interpret the view as UTF-8 text.
    pub fn as_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.data).ok()
    }
}
