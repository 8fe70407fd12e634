//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod api_client;
pub mod clock;
pub mod config;
pub mod memory;
pub mod ports;
