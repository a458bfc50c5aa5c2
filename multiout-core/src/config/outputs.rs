//! Declarative board and binding configuration
//!
//! Read-only after the registry has been built from it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::board::{BoardPins, DEFAULT_CHAIN_LENGTH};
use crate::types::{DebugLevel, DEFAULT_ON_THRESHOLD};
use crate::{OutputError, Result};

fn default_chain_length() -> usize {
    DEFAULT_CHAIN_LENGTH
}

fn default_threshold() -> f32 {
    DEFAULT_ON_THRESHOLD
}

/// One board: its bus wiring and number of shift registers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    /// Bus wiring
    #[serde(default)]
    pub pins: BoardPins,
    /// Number of cascaded 8-bit registers
    #[serde(default = "default_chain_length")]
    pub chain_length: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            pins: BoardPins::default(),
            chain_length: DEFAULT_CHAIN_LENGTH,
        }
    }
}

/// One binding between a telemetry signal and a board output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSettings {
    /// Index into [`OutputsConfig::boards`]; the first board when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<usize>,
    /// 1-based output number on the board
    pub pin: usize,
    /// Signal (dataref) name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Switching threshold
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Output is on at or below the threshold instead of at or above
    #[serde(default)]
    pub inverted: bool,
    /// Diagnostic verbosity
    #[serde(default)]
    pub debug: DebugLevel,
}

impl BindingSettings {
    /// Binding of `signal` to output `pin` of the first board
    pub fn new(pin: usize, signal: impl Into<String>) -> Self {
        Self {
            board: None,
            pin,
            signal: Some(signal.into()),
            threshold: DEFAULT_ON_THRESHOLD,
            inverted: false,
            debug: DebugLevel::Off,
        }
    }
}

/// Complete description of an application's boards and bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// Boards in declaration order; the first one receives unassigned bindings
    #[serde(default)]
    pub boards: Vec<BoardSettings>,
    /// Bindings in declaration order
    #[serde(default)]
    pub bindings: Vec<BindingSettings>,
}

impl OutputsConfig {
    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| OutputError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Check cross-references between bindings and boards.
    ///
    /// Pin ranges and chain lengths are checked when the boards start, the same
    /// way as for boards built in code.
    pub fn validate(&self) -> Result<()> {
        for (index, board) in self.boards.iter().enumerate() {
            if board.chain_length == 0 {
                return Err(OutputError::Config(format!(
                    "Board {} declares an empty chain",
                    index
                )));
            }
        }
        for binding in &self.bindings {
            if let Some(board) = binding.board {
                if board >= self.boards.len() {
                    return Err(OutputError::Config(format!(
                        "Binding for output {} refers to board {}, but only {} board(s) are declared",
                        binding.pin,
                        board,
                        self.boards.len()
                    )));
                }
            }
            if binding.pin == 0 {
                return Err(OutputError::Config(
                    "Output numbers start at 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
