//! Utility functions module
//!
//! This module contains endpoint construction, backoff schedules, the
//! injectable clock, HTTP client setup and console formatting.

pub mod clock;
pub mod endpoint;
pub mod format;
pub mod network;
pub mod retry;

pub use clock::*;
pub use endpoint::*;
pub use format::*;
pub use network::*;
pub use retry::*;
