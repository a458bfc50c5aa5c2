//! multiout Core Library
//!
//! Shared types, errors, and configuration for driving chains of shift-register
//! output boards from simulator telemetry. This crate is used by the hardware
//! crate and by applications that describe their boards declaratively.

pub mod board;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use board::*;
pub use config::{BindingSettings, BoardSettings, OutputsConfig};
pub use error::*;
pub use types::*;
