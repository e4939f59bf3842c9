//! MailReach Common - Shared types and utilities
//!
//! This crate provides configuration, the error taxonomy, logging setup
//! and the enums shared by the client and state crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
