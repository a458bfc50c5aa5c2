//! In-memory mirror of a shift-register chain
//!
//! One byte per 8-bit register, index 0 being the register closest to the
//! controller. Output numbers are 1-based: output 1 is bit 0 of register 0.

use embedded_hal::digital::PinState;
use multiout_core::{outputs_for, BoardPins, OutputError, Result, MAX_CHAIN_LENGTH};
use tracing::{debug, error};

use crate::pins::{BitOrder, PinIo};

/// Bit buffer of one chain, with change tracking
#[derive(Debug)]
pub struct ShiftChain {
    registers: [u8; MAX_CHAIN_LENGTH],
    chain_length: usize,
    dirty: bool,
    initialized: bool,
}

impl ShiftChain {
    /// Create an uninitialized chain of `chain_length` registers
    pub fn new(chain_length: usize) -> Self {
        Self {
            registers: [0; MAX_CHAIN_LENGTH],
            chain_length,
            dirty: false,
            initialized: false,
        }
    }

    /// Number of registers in the chain
    pub fn chain_length(&self) -> usize {
        self.chain_length
    }

    /// Number of 1-based outputs
    pub fn outputs(&self) -> usize {
        outputs_for(self.chain_length)
    }

    /// Whether the buffer differs from what was last latched
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Clear every output without touching the bus
    pub(crate) fn clear(&mut self) {
        self.registers = [0; MAX_CHAIN_LENGTH];
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Report and fail unless the chain has been started
    pub(crate) fn ensure_initialized(&self, operation: &'static str) -> Result<()> {
        if !self.initialized {
            let err = OutputError::NotInitialized { operation };
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    /// Register index and bit mask of a 1-based output
    fn locate(&self, pin: usize) -> Result<(usize, u8)> {
        // Strict: the last valid register is chain_length - 1.
        let index = match pin.checked_sub(1) {
            Some(index) if index >> 3 < self.chain_length => index,
            _ => {
                let err = OutputError::PinOutOfRange {
                    pin,
                    outputs: self.outputs(),
                };
                error!("{}", err);
                return Err(err);
            }
        };
        Ok((index >> 3, 1 << (index & 7)))
    }

    /// Set or clear a 1-based output
    ///
    /// Returns `Ok(true)` when the bit changed. Writing the current value leaves
    /// the dirty flag untouched.
    pub fn set_bit(&mut self, pin: usize, value: bool) -> Result<bool> {
        self.ensure_initialized("OutputBoard::set_bit")?;
        let (register, mask) = self.locate(pin)?;

        let current = self.registers[register] & mask != 0;
        if current == value {
            return Ok(false);
        }

        if value {
            self.registers[register] |= mask;
        } else {
            self.registers[register] &= !mask;
        }
        self.dirty = true;
        Ok(true)
    }

    /// Current value of a 1-based output
    pub fn try_get_bit(&self, pin: usize) -> Result<bool> {
        self.ensure_initialized("OutputBoard::get_bit")?;
        let (register, mask) = self.locate(pin)?;
        Ok(self.registers[register] & mask != 0)
    }

    /// Current value of a 1-based output, `false` when the read is refused
    pub fn get_bit(&self, pin: usize) -> bool {
        self.try_get_bit(pin).unwrap_or(false)
    }

    /// Force the next flush to write the whole chain
    pub fn flush<P: PinIo + ?Sized>(&mut self, io: &mut P, pins: &BoardPins) -> Result<()> {
        self.ensure_initialized("OutputBoard::flush")?;
        self.dirty = true;
        self.flush_if_dirty(io, pins).map(|_| ())
    }

    /// Latch the buffer onto the chain if anything changed
    ///
    /// Returns `Ok(true)` when the bus was written.
    pub fn flush_if_dirty<P: PinIo + ?Sized>(&mut self, io: &mut P, pins: &BoardPins) -> Result<bool> {
        self.ensure_initialized("OutputBoard::flush_if_dirty")?;
        if !self.dirty {
            return Ok(false);
        }
        self.write_frame(io, pins);
        Ok(true)
    }

    /// Shift the whole buffer out and latch it
    ///
    /// The farthest register is shifted first so that register 0 ends up next
    /// to the controller once all bytes are clocked in.
    pub(crate) fn write_frame<P: PinIo + ?Sized>(&mut self, io: &mut P, pins: &BoardPins) {
        debug!("Latching {} shift registers", self.chain_length);

        io.write(pins.strobe, PinState::Low);
        for register in self.registers[..self.chain_length].iter().rev() {
            io.shift_out(pins.data, pins.clock, BitOrder::MsbFirst, *register);
        }
        io.write(pins.strobe, PinState::High);

        self.dirty = false;
    }
}
