//! Core types and data structures for multiout

use serde::{Deserialize, Serialize};

/// Default value at or above which a digital binding switches its output on
pub const DEFAULT_ON_THRESHOLD: f32 = 0.2;

/// Per-binding diagnostic verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    /// No per-change diagnostics
    #[default]
    Off,
    /// Report every output switch
    Output,
    /// Also report value changes that leave the output untouched
    Value,
}

impl std::str::FromStr for DebugLevel {
    type Err = crate::OutputError;

    /// Parse a debug level name
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// use multiout_core::types::DebugLevel;
    ///
    /// assert_eq!(DebugLevel::from_str("value").unwrap(), DebugLevel::Value);
    /// assert!(DebugLevel::from_str("loud").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Ok(DebugLevel::Off),
            "output" | "1" => Ok(DebugLevel::Output),
            "value" | "2" => Ok(DebugLevel::Value),
            _ => Err(crate::OutputError::Config(format!(
                "Unknown debug level: '{}'. Valid options: off, output, value",
                s
            ))),
        }
    }
}

/// Handle to a telemetry signal, issued by the telemetry link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalHandle(pub u32);

/// Index of a board inside an output registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardId(pub usize);

/// Position of a binding: its board and its index in that board's bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId {
    pub board: BoardId,
    pub index: usize,
}

/// Validation state of a binding
///
/// `Unvalidated` moves to `Enabled` or `Disabled` exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingState {
    #[default]
    Unvalidated,
    Enabled,
    Disabled,
}

impl BindingState {
    pub fn is_enabled(self) -> bool {
        self == BindingState::Enabled
    }
}
