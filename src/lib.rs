//! subvend - Azure subscription provisioning
//!
//! Creates subscriptions through the `Microsoft.Subscription/aliases` API
//! using a service principal, then follows the asynchronous provisioning
//! operation until the subscription exists.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod subscription;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, SubvendError};
