//! Content dedup index: hash -> first-occurrence offsets.
//!
//! The index is a candidate filter, not a source of truth: reuse of a stored
//! frame always requires a full byte-compare against the candidate payload.
//! A hash collision with unequal content is the expected, handled case and
//! simply selects the fresh-append path.

use crate::arena::ByteArena;
use crate::frame;
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;
use std::hash::{BuildHasher, Hasher};
use tracing::debug;

/// Maps content hashes to the arena offsets of stored frames.
///
/// Each hash value keeps a small bucket of offsets, one per distinct payload
/// that hashed to it, so deduplication stays idempotent even after a
/// collision. The hash algorithm is not part of the stored format; the type
/// is generic over [`BuildHasher`] and only requires a deterministic,
/// fixed-width digest.
#[derive(Debug, Clone)]
pub struct DedupIndex<S = DefaultHashBuilder> {
    buckets: HashMap<u64, Vec<u32>>,
    build_hasher: S,
}

impl DedupIndex {
    /// Create a new empty dedup index.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Rebuild an index from a persisted arena by walking its frames.
    ///
    /// The dedup index is a build-time structure and is not persisted; this
    /// reconstructs it when further writes are needed after a reload.
    pub fn rebuild(arena: &ByteArena) -> sarani_core::Result<Self> {
        Self::rebuild_with_hasher(arena, DefaultHashBuilder::default())
    }
}

impl Default for DedupIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BuildHasher> DedupIndex<S> {
    /// Create an empty index using the given hasher.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self {
            buckets: HashMap::new(),
            build_hasher,
        }
    }

    /// Rebuild an index from a persisted arena using the given hasher.
    pub fn rebuild_with_hasher(arena: &ByteArena, build_hasher: S) -> sarani_core::Result<Self> {
        let mut index = Self::with_hasher(build_hasher);
        for item in frame::frames(arena.as_bytes()) {
            let (offset, view) = item?;
            let hash = index.content_hash(view.data());
            let bucket = index.buckets.entry(hash).or_default();

            let mut seen = false;
            for &existing in bucket.iter() {
                let (stored, _) = frame::decode(arena.as_bytes(), existing)?;
                if stored.data() == view.data() {
                    seen = true;
                    break;
                }
            }
            if !seen {
                bucket.push(offset);
            }
        }
        debug!(values = index.len(), "rebuilt dedup index from arena");
        Ok(index)
    }

    /// Compute the content hash for a payload.
    pub fn content_hash(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.build_hasher.build_hasher();
        hasher.write(bytes);
        hasher.finish()
    }

    /// Return the offset of a frame holding `payload`, appending a new
    /// frame only when no identical value is already stored.
    ///
    /// On an exact byte match the existing offset is returned and the arena
    /// is untouched; on a hash collision with unequal content, or no entry,
    /// a fresh frame is appended and indexed.
    pub fn lookup_or_insert(
        &mut self,
        arena: &mut ByteArena,
        payload: &[u8],
    ) -> sarani_core::Result<u32> {
        let hash = self.content_hash(payload);

        if let Some(bucket) = self.buckets.get(&hash) {
            for &offset in bucket {
                let (stored, _) = frame::decode(arena.as_bytes(), offset)?;
                if stored.data() == payload {
                    return Ok(offset);
                }
            }
        }

        let offset = frame::encode(arena, payload)?;
        self.buckets.entry(hash).or_default().push(offset);
        Ok(offset)
    }

    /// Number of distinct values indexed.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build hasher that sends every payload to the same hash value,
    /// forcing collisions.
    #[derive(Debug, Clone, Default)]
    struct CollidingHasher;

    struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn write(&mut self, _bytes: &[u8]) {}

        fn finish(&self) -> u64 {
            0
        }
    }

    impl BuildHasher for CollidingHasher {
        type Hasher = ZeroHasher;

        fn build_hasher(&self) -> ZeroHasher {
            ZeroHasher
        }
    }

    #[test]
    fn test_dedup_idempotence() {
        let mut arena = ByteArena::new();
        let mut index = DedupIndex::new();

        let first = index.lookup_or_insert(&mut arena, b"alpha").unwrap();
        let size_after_first = arena.size();

        let second = index.lookup_or_insert(&mut arena, b"alpha").unwrap();
        assert_eq!(first, second);
        assert_eq!(arena.size(), size_after_first);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_distinct_values_get_distinct_offsets() {
        let mut arena = ByteArena::new();
        let mut index = DedupIndex::new();

        let a = index.lookup_or_insert(&mut arena, b"alpha").unwrap();
        let b = index.lookup_or_insert(&mut arena, b"beta").unwrap();
        assert_ne!(a, b);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_collision_with_unequal_content_appends_fresh() {
        let mut arena = ByteArena::new();
        let mut index = DedupIndex::with_hasher(CollidingHasher);

        // Both payloads hash to 0 but must resolve to distinct frames.
        let a = index.lookup_or_insert(&mut arena, b"alpha").unwrap();
        let b = index.lookup_or_insert(&mut arena, b"beta").unwrap();
        assert_ne!(a, b);

        let (view_a, _) = frame::decode(arena.as_bytes(), a).unwrap();
        let (view_b, _) = frame::decode(arena.as_bytes(), b).unwrap();
        assert_eq!(view_a.data(), b"alpha");
        assert_eq!(view_b.data(), b"beta");
    }

    #[test]
    fn test_idempotence_survives_collisions() {
        let mut arena = ByteArena::new();
        let mut index = DedupIndex::with_hasher(CollidingHasher);

        let a1 = index.lookup_or_insert(&mut arena, b"alpha").unwrap();
        index.lookup_or_insert(&mut arena, b"beta").unwrap();
        let a2 = index.lookup_or_insert(&mut arena, b"alpha").unwrap();

        assert_eq!(a1, a2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_rebuild_from_arena() {
        let mut arena = ByteArena::new();
        let mut index = DedupIndex::new();
        let alpha = index.lookup_or_insert(&mut arena, b"alpha").unwrap();
        index.lookup_or_insert(&mut arena, b"beta").unwrap();
        drop(index);

        let mut rebuilt = DedupIndex::rebuild(&arena).unwrap();
        assert_eq!(rebuilt.len(), 2);

        // Reinserting a stored value reuses the existing frame.
        let size_before = arena.size();
        let offset = rebuilt.lookup_or_insert(&mut arena, b"alpha").unwrap();
        assert_eq!(offset, alpha);
        assert_eq!(arena.size(), size_before);
    }

    #[test]
    fn test_rebuild_with_duplicate_frames_keeps_first() {
        let mut arena = ByteArena::new();
        // Two identical frames appended directly, bypassing dedup.
        let first = frame::encode(&mut arena, b"twice").unwrap();
        frame::encode(&mut arena, b"twice").unwrap();

        let mut rebuilt = DedupIndex::rebuild(&arena).unwrap();
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(
            rebuilt.lookup_or_insert(&mut arena, b"twice").unwrap(),
            first
        );
    }
}
