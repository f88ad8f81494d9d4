//! sarani-table: Schema, table writer/reader, and on-disk persistence.

pub mod persist;
pub mod reader;
pub mod schema;
pub mod writer;

pub use persist::TableFile;
pub use reader::TableReader;
pub use schema::{ColumnKind, ColumnSpec, TableSchema};
pub use writer::TableWriter;
