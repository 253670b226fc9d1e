//! Sesscgi Core - shared request types, the session store contract and ambient plumbing
//!
//! Everything here is independent of how a request actually arrives; the CGI
//! adapter and the handlers both build on these definitions.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
