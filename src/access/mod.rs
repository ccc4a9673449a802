//! Access control subsystem.
//!
//! # Data Flow
//! ```text
//! incoming request
//!     → gate.rs middleware (resolve client address)
//!     → policy.rs (network allow-list)
//!     → limiter.rs (sliding-window rate check)
//!     → admitted request continues to handlers
//!     → denial short-circuits with 403/429
//! ```
//!
//! # Design Decisions
//! - Fail closed: an unresolvable client address is denied, not admitted
//! - The network check runs before the rate check, so blocked networks
//!   never consume rate budget
//! - Denied requests are not recorded in the rate window

pub mod gate;
pub mod limiter;
pub mod policy;

pub use gate::{access_gate_middleware, AccessDenied, AccessGate};
pub use limiter::RateLimiter;
pub use policy::AccessPolicy;
