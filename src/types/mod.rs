//! Data types shared by the exporter components

mod entry;
mod span;

pub use entry::{LogEntry, Page, PageCursor};
pub use span::{Chunk, Chunks, TimeSpan};
