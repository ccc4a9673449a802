//! File serving subsystem.
//!
//! # Data Flow
//! ```text
//! GET /some/path
//!     → file.rs resolve (decode, confine to root)
//!     → directory: 301 redirect / index file / listing.rs HTML
//!     → file: range.rs (parse + resolve Range header)
//!     → 200 or 206 streamed response (seek + take + ReaderStream)
//! ```
//!
//! # Design Decisions
//! - Path confinement is lexical: any `..` segment rejects the request
//! - Only `bytes=<first>-[<last>]` ranges are honored; everything else
//!   is a 400, never silently a full response
//! - Responses stream in fixed-size chunks, bodies are never buffered

pub mod file;
pub mod listing;
pub mod mime;
pub mod range;

pub use file::FileServer;
pub use range::{parse_range, ByteRange, RangeError, RangeSpec};
