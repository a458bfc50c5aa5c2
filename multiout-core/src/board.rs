//! Board definitions and pin assignments
//!
//! This module provides trait-based abstractions for shift-register output card
//! profiles. Each card type implements the `ChainConfig` trait with its default
//! wiring and chain limits.
//!
//! Note: Actual bus I/O is in the `multiout-hardware` crate. This module only
//! contains card specifications and pin assignment types.

use serde::{Deserialize, Serialize};

/// Output card profile trait
///
/// Each card variant implements this trait to define its default bus wiring and
/// how many registers a chain of such cards may contain.
///
/// # Example
///
/// ```
/// use multiout_core::board::{ChainConfig, MultiOutputCard};
///
/// const MAX: usize = MultiOutputCard::MAX_CHAIN_LENGTH;
/// assert_eq!(MAX, 48);
/// ```
pub trait ChainConfig: 'static {
    /// Human-readable card name
    const NAME: &'static str;

    /// Default serial data pin
    const DATA_PIN: u8;

    /// Default shift clock pin
    const CLOCK_PIN: u8;

    /// Default latch (strobe) pin
    const STROBE_PIN: u8;

    /// Default output enable pin
    const ENABLE_PIN: u8;

    /// Shift registers on a single card
    const REGISTERS_PER_CARD: usize;

    /// Cards that may be daisy-chained on one bus
    const MAX_CARDS: usize;

    /// Largest chain a board buffer can hold
    const MAX_CHAIN_LENGTH: usize = Self::REGISTERS_PER_CARD * Self::MAX_CARDS;
}

/// Multi Output card
///
/// - 6 cascaded 8-bit shift registers (48 outputs) per card
/// - up to 8 cards on one bus
/// - wired by default as data 5, clock 2, strobe 3, enable 4
pub struct MultiOutputCard;

impl ChainConfig for MultiOutputCard {
    const NAME: &'static str = "Multi Output card";
    const DATA_PIN: u8 = 5;
    const CLOCK_PIN: u8 = 2;
    const STROBE_PIN: u8 = 3;
    const ENABLE_PIN: u8 = 4;
    const REGISTERS_PER_CARD: usize = 6;
    const MAX_CARDS: usize = 8;
}

/// Default card profile used throughout the codebase
pub type DefaultChain = MultiOutputCard;

/// Registers in a chain built from a single default card
pub const DEFAULT_CHAIN_LENGTH: usize = DefaultChain::REGISTERS_PER_CARD;

/// Capacity of every board buffer, in registers
pub const MAX_CHAIN_LENGTH: usize = DefaultChain::MAX_CHAIN_LENGTH;

/// Number of 1-based outputs exposed by a chain of `chain_length` registers
#[inline]
pub fn outputs_for(chain_length: usize) -> usize {
    chain_length * 8
}

/// Optional output-enable line of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnablePin {
    /// Pin number
    pub pin: u8,
    /// Outputs are enabled while the pin is driven low
    #[serde(default)]
    pub active_low: bool,
}

impl EnablePin {
    /// Level (`true` = high) that enables the chain's outputs
    pub fn active_level(&self) -> bool {
        !self.active_low
    }

    /// Level (`true` = high) that disables the chain's outputs
    pub fn inactive_level(&self) -> bool {
        self.active_low
    }
}

/// Bus wiring of one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPins {
    /// Serial data line
    pub data: u8,
    /// Shift clock line
    pub clock: u8,
    /// Latch line; a rising edge copies the shifted bits to the outputs
    pub strobe: u8,
    /// Output enable line, if wired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<EnablePin>,
}

impl BoardPins {
    /// Three-wire bus without an enable line
    pub fn new(data: u8, clock: u8, strobe: u8) -> Self {
        Self {
            data,
            clock,
            strobe,
            enable: None,
        }
    }

    /// Add an enable line
    pub fn with_enable(mut self, pin: u8, active_low: bool) -> Self {
        self.enable = Some(EnablePin { pin, active_low });
        self
    }

    /// Default wiring of a card profile
    pub fn for_chain<C: ChainConfig>() -> Self {
        Self::new(C::DATA_PIN, C::CLOCK_PIN, C::STROBE_PIN).with_enable(C::ENABLE_PIN, false)
    }
}

impl Default for BoardPins {
    fn default() -> Self {
        Self::for_chain::<DefaultChain>()
    }
}
