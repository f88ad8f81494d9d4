//! Framed record codec: length-prefixed, 4-aligned string records.
//!
//! One frame is a 4-byte little-endian length prefix, the payload bytes, and
//! 0-3 zero padding bytes so that every frame starts on a 4-byte boundary
//! and occupies a multiple of 4 bytes. The prefix can therefore always be
//! read as an aligned `u32`, at a padding cost of at most 3 bytes per frame.

use crate::arena::{ByteArena, MAX_ARENA_SIZE};
use crate::view::ByteView;
use sarani_core::{Error, Result};

/// Size of the length prefix in bytes.
pub const PREFIX_SIZE: u32 = 4;

/// Frame alignment in bytes.
pub const ALIGNMENT: u32 = 4;

const ZERO_PAD: [u8; 4] = [0; 4];

/// Round `n` up to the next multiple of the frame alignment.
fn align_up(n: u64) -> u64 {
    (n + (ALIGNMENT as u64 - 1)) & !(ALIGNMENT as u64 - 1)
}

/// Total encoded size (prefix + payload + trailing padding) for a payload
/// of `payload_len` bytes.
///
/// Fails with `CapacityExceeded` when the payload length does not fit the
/// 32-bit length prefix; this is a construction error, never a truncation.
pub fn encoded_size(payload_len: usize) -> Result<u64> {
    if payload_len as u64 > u32::MAX as u64 {
        return Err(Error::CapacityExceeded {
            requested: payload_len as u64,
            limit: u32::MAX as u64,
        });
    }
    Ok(align_up(payload_len as u64 + PREFIX_SIZE as u64))
}

/// Append one frame to the arena and return the offset of its length prefix.
///
/// If the arena end is not aligned, zero bytes are written first; the
/// returned offset never includes that leading padding. The capacity check
/// covers the whole frame up front, so a failed encode writes nothing.
pub fn encode(arena: &mut ByteArena, payload: &[u8]) -> Result<u32> {
    let lead = (align_up(arena.size() as u64) - arena.size() as u64) as usize;
    let frame_size = encoded_size(payload.len())?;

    let end = arena.size() as u64 + lead as u64 + frame_size;
    if end > MAX_ARENA_SIZE {
        return Err(Error::CapacityExceeded {
            requested: end,
            limit: MAX_ARENA_SIZE,
        });
    }
    arena.ensure_capacity(end as usize);

    if lead > 0 {
        arena.append(&ZERO_PAD[..lead])?;
    }
    let offset = arena.append(&(payload.len() as u32).to_le_bytes())?;
    arena.append(payload)?;

    let trailing = (frame_size - PREFIX_SIZE as u64 - payload.len() as u64) as usize;
    if trailing > 0 {
        arena.append(&ZERO_PAD[..trailing])?;
    }

    Ok(offset)
}

/// Decode the frame at `offset`.
///
/// Returns a view over the payload and the offset of the next frame
/// (past this frame's trailing padding), for sequential iteration.
pub fn decode(bytes: &[u8], offset: u32) -> Result<(ByteView<'_>, u32)> {
    if offset % ALIGNMENT != 0 {
        return Err(Error::CorruptFrame(format!(
            "frame offset {offset} is not {ALIGNMENT}-byte aligned"
        )));
    }

    let start = offset as usize;
    let payload_start = start + PREFIX_SIZE as usize;
    if payload_start > bytes.len() {
        return Err(Error::CorruptFrame(format!(
            "length prefix at offset {offset} runs past arena end {}",
            bytes.len()
        )));
    }

    let mut prefix = [0u8; PREFIX_SIZE as usize];
    prefix.copy_from_slice(&bytes[start..payload_start]);
    let payload_len = u32::from_le_bytes(prefix) as usize;

    let payload_end = payload_start + payload_len;
    if payload_end > bytes.len() {
        return Err(Error::CorruptFrame(format!(
            "frame at offset {offset} claims {payload_len} payload bytes, \
             arena holds only {}",
            bytes.len()
        )));
    }

    let view = ByteView::new(&bytes[payload_start..payload_end]);
    let next = align_up(payload_end as u64);
    Ok((view, next as u32))
}

/// Iterate over all frames in `bytes`, yielding `(offset, payload)` pairs.
pub fn frames(bytes: &[u8]) -> Frames<'_> {
    Frames { bytes, offset: 0 }
}

/// Count the frames stored in `bytes`.
pub fn count(bytes: &[u8]) -> Result<usize> {
    let mut n = 0;
    for item in frames(bytes) {
        item?;
        n += 1;
    }
    Ok(n)
}

/// Forward iterator over the frames in a buffer.
#[derive(Debug)]
pub struct Frames<'a> {
    bytes: &'a [u8],
    offset: u32,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<(u32, ByteView<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset as usize >= self.bytes.len() {
            return None;
        }
        match decode(self.bytes, self.offset) {
            Ok((view, next)) => {
                let offset = self.offset;
                self.offset = next;
                Some(Ok((offset, view)))
            }
            Err(e) => {
                // Stop after reporting a corrupt frame.
                self.offset = u32::MAX;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut arena = ByteArena::new();
        let offset = encode(&mut arena, b"hello world").unwrap();

        let (view, _) = decode(arena.as_bytes(), offset).unwrap();
        assert_eq!(view.data(), b"hello world");
    }

    #[test]
    fn test_alignment_invariant() {
        let mut arena = ByteArena::new();
        let payloads: &[&[u8]] = &[b"a", b"ab", b"abc", b"abcd", b"abcde", b""];

        for payload in payloads {
            let offset = encode(&mut arena, payload).unwrap();
            assert_eq!(offset % 4, 0);
        }
        assert_eq!(arena.size() % 4, 0);
    }

    #[test]
    fn test_empty_payload_is_exactly_prefix() {
        let mut arena = ByteArena::new();
        let offset = encode(&mut arena, b"").unwrap();

        assert_eq!(offset, 0);
        assert_eq!(arena.size(), 4);
        assert_eq!(arena.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_five_byte_payload_layout() {
        let mut arena = ByteArena::new();
        let offset = encode(&mut arena, b"hello").unwrap();
        assert_eq!(offset, 0);

        // prefix [0,4), payload [4,9), zero padding [9,12)
        assert_eq!(arena.size(), 12);
        assert_eq!(&arena.as_bytes()[0..4], &5u32.to_le_bytes());
        assert_eq!(&arena.as_bytes()[4..9], b"hello");
        assert_eq!(&arena.as_bytes()[9..12], &[0, 0, 0]);

        // next frame starts at 12
        let (_, next) = decode(arena.as_bytes(), 0).unwrap();
        assert_eq!(next, 12);
    }

    #[test]
    fn test_encode_realigns_after_raw_append() {
        let mut arena = ByteArena::new();
        arena.append(b"xyz").unwrap(); // leaves the end unaligned

        let offset = encode(&mut arena, b"data").unwrap();
        assert_eq!(offset, 4); // one leading pad byte, prefix at 4

        let (view, _) = decode(arena.as_bytes(), offset).unwrap();
        assert_eq!(view.data(), b"data");
    }

    #[test]
    fn test_decode_truncated_frame_fails() {
        let mut arena = ByteArena::new();
        // Claims 100 payload bytes but provides none.
        arena.append(&100u32.to_le_bytes()).unwrap();

        let err = decode(arena.as_bytes(), 0).unwrap_err();
        assert!(matches!(err, Error::CorruptFrame(_)));
    }

    #[test]
    fn test_decode_misaligned_offset_fails() {
        let mut arena = ByteArena::new();
        encode(&mut arena, b"hello").unwrap();

        assert!(matches!(
            decode(arena.as_bytes(), 2).unwrap_err(),
            Error::CorruptFrame(_)
        ));
    }

    #[test]
    fn test_decode_offset_past_end_fails() {
        let arena = ByteArena::new();
        assert!(matches!(
            decode(arena.as_bytes(), 0).unwrap_err(),
            Error::CorruptFrame(_)
        ));
    }

    #[test]
    fn test_frames_iteration_in_order() {
        let mut arena = ByteArena::new();
        let payloads: &[&[u8]] = &[b"alpha", b"", b"beta", b"gammagamma"];
        for payload in payloads {
            encode(&mut arena, payload).unwrap();
        }

        let decoded: Vec<_> = frames(arena.as_bytes())
            .map(|item| item.unwrap().1.data().to_vec())
            .collect();
        assert_eq!(decoded, payloads.iter().map(|p| p.to_vec()).collect::<Vec<_>>());
        assert_eq!(count(arena.as_bytes()).unwrap(), 4);
    }

    #[test]
    fn test_encoded_size_rejects_oversized_payload() {
        assert!(encoded_size(u32::MAX as usize + 1).is_err());
        assert_eq!(encoded_size(0).unwrap(), 4);
        assert_eq!(encoded_size(5).unwrap(), 12);
    }
}
