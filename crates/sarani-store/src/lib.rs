//! sarani-store: Byte arena, frame codec, string views, dedup index, and offset tables.

pub mod arena;
pub mod dedup;
pub mod frame;
pub mod offsets;
pub mod view;

pub use arena::ByteArena;
pub use dedup::DedupIndex;
pub use offsets::OffsetTable;
pub use view::ByteView;
