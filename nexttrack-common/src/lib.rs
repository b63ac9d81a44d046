//! # NextTrack Common Library
//!
//! Shared code for the NextTrack recommendation service:
//! - Error types
//! - Configuration loading (TOML file + environment overrides)

pub mod config;
pub mod error;

pub use error::{Error, Result};
