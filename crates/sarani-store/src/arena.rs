//! Append-only byte arena backing all frame data.

use sarani_core::{Error, Result};

/// Maximum arena size in bytes.
///
/// Every frame is addressed by a 32-bit offset, so the arena as a whole must
/// stay representable in 32 bits.
pub const MAX_ARENA_SIZE: u64 = u32::MAX as u64;

/// Growable, contiguous byte store with append-only semantics.
///
/// Bytes at offsets below `size()` are never mutated once written. All
/// external references are `(arena, offset)` pairs; offsets stay valid
/// across growth even though the backing allocation may move.
#[derive(Debug, Clone, Default)]
pub struct ByteArena {
    data: Vec<u8>,
}

impl ByteArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create an empty arena with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Reconstruct an arena from previously persisted bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() as u64 > MAX_ARENA_SIZE {
            return Err(Error::CapacityExceeded {
                requested: data.len() as u64,
                limit: MAX_ARENA_SIZE,
            });
        }
        Ok(Self { data })
    }

    /// Append bytes to the arena and return the offset they were written at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u32> {
        let new_size = self.data.len() as u64 + bytes.len() as u64;
        if new_size > MAX_ARENA_SIZE {
            return Err(Error::CapacityExceeded {
                requested: new_size,
                limit: MAX_ARENA_SIZE,
            });
        }

        let offset = self.data.len() as u32;
        self.ensure_capacity(new_size as usize);
        self.data.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Make sure the arena can hold at least `total` bytes without another
    /// reallocation.
    ///
    /// Growth is geometric (at least doubling) to amortize reallocation
    /// cost. Offsets handed out earlier remain valid; they are plain
    /// integers, not pointers.
    pub fn ensure_capacity(&mut self, total: usize) {
        if total > self.data.capacity() {
            let doubled = self.data.capacity().max(64) * 2;
            let target = doubled.max(total);
            self.data.reserve(target - self.data.len());
        }
    }

    /// Number of bytes currently used.
    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }

    /// Check if the arena holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw view over all written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_returns_sequential_offsets() {
        let mut arena = ByteArena::new();

        let off1 = arena.append(b"hello").unwrap();
        let off2 = arena.append(b"world").unwrap();

        assert_eq!(off1, 0);
        assert_eq!(off2, 5);
        assert_eq!(arena.size(), 10);
        assert_eq!(&arena.as_bytes()[..5], b"hello");
        assert_eq!(&arena.as_bytes()[5..], b"world");
    }

    #[test]
    fn test_earlier_bytes_survive_growth() {
        let mut arena = ByteArena::with_capacity(8);
        arena.append(b"abcd").unwrap();

        // Force several reallocations.
        for _ in 0..100 {
            arena.append(&[0xAB; 64]).unwrap();
        }

        assert_eq!(&arena.as_bytes()[..4], b"abcd");
    }

    #[test]
    fn test_ensure_capacity_grows_geometrically() {
        let mut arena = ByteArena::new();
        arena.ensure_capacity(1);
        let first = arena.as_bytes().len(); // still empty
        assert_eq!(first, 0);

        arena.append(b"x").unwrap();
        arena.ensure_capacity(100_000);
        arena.append(&[0u8; 99_999]).unwrap();
        assert_eq!(arena.size(), 100_000);
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let arena = ByteArena::from_bytes(b"abc".to_vec()).unwrap();
        assert_eq!(arena.size(), 3);
        assert_eq!(arena.as_bytes(), b"abc");
    }

    #[test]
    fn test_empty_arena() {
        let arena = ByteArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.size(), 0);
    }
}
