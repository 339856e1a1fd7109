//! Subscription provisioning module
//!
//! This module creates Azure subscriptions through the
//! `Microsoft.Subscription/aliases` API and tracks the asynchronous
//! provisioning operation to completion.

pub mod manager;
pub mod models;
pub mod operations;

pub use manager::*;
pub use models::*;
pub use operations::*;
