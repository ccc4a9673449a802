//! Upload subsystem.
//!
//! # Data Flow
//! ```text
//! POST body (buffered, capped)
//!     → multipart.rs (boundary extraction, part splitting)
//!     → ingest.rs (per-part validation: size → name → extension)
//!     → accepted parts persisted under the target directory
//!     → 303 back to the listing, or 400 naming the first rejection
//! ```
//!
//! # Design Decisions
//! - The parser handles exactly the browser `multipart/form-data` shape;
//!   it is not a general MIME implementation
//! - Validation order is fixed so clients get deterministic errors
//! - The first rejected part aborts the batch; files persisted before it
//!   stay on disk

pub mod ingest;
pub mod multipart;

pub use ingest::{IngestError, UploadIngestor, UploadOutcome, UploadRejection};
pub use multipart::{boundary_from_content_type, parse_multipart, MultipartError};
