//! PTY spawning and output streaming

pub mod config;
pub mod handle;
pub mod reader;

pub use config::PtyConfig;
pub use handle::PtyHandle;
pub use reader::{spawn_output_reader, ReaderHandle};
