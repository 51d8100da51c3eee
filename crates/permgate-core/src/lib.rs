//! `permgate` Core Library
//!
//! Shared functionality for `permgate` components:
//! - Permission records and the rule for combining them
//! - Configuration resolution
//! - Common error types
//! - Tracing initialization

pub mod config;
pub mod error;
pub mod permission;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use permission::Permission;
