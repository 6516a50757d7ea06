//! Chunked export of the remote log stream
//!
//! ```text
//! load position ─► span [pos-buffer, now) ─► chunks ─┐
//!                                                     ▼
//!            ┌──────────── next page ◄── more? ◄── query ─► order ─► append
//!            │                              │
//!            │                          exhausted
//!            │                              ▼
//!            └──────────────────────── save chunk end ─► pace ─► next chunk
//! ```

mod exporter;
pub mod ordering;
mod sink;

pub use exporter::{ExportConfig, ExportSummary, Exporter};
pub use ordering::{order_entries, order_streams, Ordered};
pub use sink::{EntrySink, FileSink, OutputLayout};
