//! Authentication module for Azure services
//!
//! This module obtains service principal access tokens for the Azure
//! Resource Manager using the client-credentials flow.

pub mod provider;

pub use provider::*;
