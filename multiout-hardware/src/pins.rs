//! Pin I/O for the shift-register bus
//!
//! Provides the narrow GPIO contract the board driver needs, plus a recording
//! implementation for tests and host-side simulation.

use embedded_hal::digital::PinState;
use tracing::trace;

/// Order in which the bits of a byte are clocked out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Trait for pin I/O abstraction
///
/// This trait enables testing of `OutputBoard` without real hardware by allowing
/// mock implementations. All calls are synchronous and cannot fail; a broken
/// wire is invisible at this layer.
pub trait PinIo {
    /// Configure a pin as a push-pull output
    fn configure_output(&mut self, pin: u8);

    /// Drive a pin to a level
    fn write(&mut self, pin: u8, level: PinState);

    /// Clock one byte out on `data`, pulsing `clock` once per bit
    fn shift_out(&mut self, data: u8, clock: u8, order: BitOrder, byte: u8) {
        for i in 0..8 {
            let bit = match order {
                BitOrder::MsbFirst => (byte >> (7 - i)) & 1,
                BitOrder::LsbFirst => (byte >> i) & 1,
            };
            self.write(data, PinState::from(bit == 1));
            self.write(clock, PinState::High);
            self.write(clock, PinState::Low);
        }
    }
}

/// One operation seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Configure(u8),
    Write(u8, PinState),
    Shift {
        data: u8,
        clock: u8,
        order: BitOrder,
        byte: u8,
    },
}

/// Pin I/O that records every operation instead of driving hardware
///
/// Byte shifts are recorded as a single [`BusOp::Shift`] rather than as the
/// individual clock pulses.
#[derive(Debug, Default)]
pub struct RecordingPins {
    ops: Vec<BusOp>,
}

impl RecordingPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations recorded so far
    pub fn ops(&self) -> &[BusOp] {
        &self.ops
    }

    /// Recorded byte shifts, in the order they were clocked out
    pub fn shifted_bytes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BusOp::Shift { byte, .. } => Some(*byte),
                _ => None,
            })
            .collect()
    }

    /// Last level written to `pin`, if any
    pub fn level(&self, pin: u8) -> Option<PinState> {
        self.ops.iter().rev().find_map(|op| match op {
            BusOp::Write(p, level) if *p == pin => Some(*level),
            _ => None,
        })
    }

    /// Forget the recorded operations
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl PinIo for RecordingPins {
    fn configure_output(&mut self, pin: u8) {
        trace!("configure pin {} as output", pin);
        self.ops.push(BusOp::Configure(pin));
    }

    fn write(&mut self, pin: u8, level: PinState) {
        trace!("pin {} -> {:?}", pin, level);
        self.ops.push(BusOp::Write(pin, level));
    }

    fn shift_out(&mut self, data: u8, clock: u8, order: BitOrder, byte: u8) {
        trace!("shift out {:#04x} ({:?})", byte, order);
        self.ops.push(BusOp::Shift {
            data,
            clock,
            order,
            byte,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pin I/O keeping only the raw writes, to exercise the default `shift_out`
    #[derive(Default)]
    struct WriteLog {
        writes: Vec<(u8, PinState)>,
    }

    impl PinIo for WriteLog {
        fn configure_output(&mut self, _pin: u8) {}

        fn write(&mut self, pin: u8, level: PinState) {
            self.writes.push((pin, level));
        }
    }

    fn data_bits(log: &WriteLog, data: u8) -> Vec<u8> {
        log.writes
            .iter()
            .filter(|(pin, _)| *pin == data)
            .map(|(_, level)| u8::from(*level == PinState::High))
            .collect()
    }

    #[test]
    fn test_default_shift_out_msb_first() {
        let mut log = WriteLog::default();
        log.shift_out(5, 2, BitOrder::MsbFirst, 0b1010_0001);

        assert_eq!(data_bits(&log, 5), vec![1, 0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_default_shift_out_lsb_first() {
        let mut log = WriteLog::default();
        log.shift_out(5, 2, BitOrder::LsbFirst, 0b1010_0001);

        assert_eq!(data_bits(&log, 5), vec![1, 0, 0, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_default_shift_out_pulses_clock_per_bit() {
        let mut log = WriteLog::default();
        log.shift_out(5, 2, BitOrder::MsbFirst, 0xFF);

        let clock: Vec<PinState> = log
            .writes
            .iter()
            .filter(|(pin, _)| *pin == 2)
            .map(|(_, level)| *level)
            .collect();
        assert_eq!(clock.len(), 16);
        assert!(clock
            .chunks(2)
            .all(|pulse| pulse == [PinState::High, PinState::Low]));
    }

    #[test]
    fn test_recording_pins() {
        let mut pins = RecordingPins::new();
        pins.configure_output(3);
        pins.write(3, PinState::Low);
        pins.shift_out(5, 2, BitOrder::MsbFirst, 0x42);
        pins.write(3, PinState::High);

        assert_eq!(pins.ops().len(), 4);
        assert_eq!(pins.ops()[0], BusOp::Configure(3));
        assert_eq!(pins.shifted_bytes(), vec![0x42]);
        assert_eq!(pins.level(3), Some(PinState::High));
        assert_eq!(pins.level(9), None);

        pins.clear();
        assert!(pins.ops().is_empty());
    }
}
