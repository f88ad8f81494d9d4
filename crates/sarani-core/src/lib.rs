//! sarani-core: Shared types, configuration, and logging for sarani.

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};
