//! LAN file-sharing server.
//!
//! Serves a directory tree over HTTP for browsers on a local network:
//! directory listings with an upload form, whole-file and byte-range
//! downloads, and multipart uploads. Every request passes an admission
//! gate (network allow-list plus a per-client sliding-window rate
//! limit) before it reaches a handler.

pub mod access;
pub mod config;
pub mod http;
pub mod observability;
pub mod serve;
pub mod upload;

pub use config::{load_config, ShareConfig};
pub use http::HttpServer;
