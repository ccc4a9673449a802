//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TcpListener
//!     → server.rs router (wildcard GET/POST)
//!     → layer stack: trace → request-id → timeout → access gate
//!     → handlers delegate to serve/ and upload/
//!     → error.rs maps every failure to a status + plain-text body
//! ```

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
