//! Output Board - one chain of shift registers and the bindings driving it
//!
//! Keeps an in-memory mirror of every output and pushes it onto the bus only
//! when something changed.

use embedded_hal::digital::PinState;
use multiout_core::{
    BoardPins, BoardSettings, OutputError, Result, SignalHandle, DEFAULT_CHAIN_LENGTH,
    MAX_CHAIN_LENGTH,
};
use tracing::{error, info, warn};

use crate::binding::OutputBinding;
use crate::pins::PinIo;
use crate::shift_chain::ShiftChain;
use crate::telemetry::TelemetryLink;

/// Output board interface
///
/// Generic over the pin I/O, allowing real GPIO or recording pins for testing.
pub struct OutputBoard<P: PinIo> {
    io: P,
    pins: BoardPins,
    chain: ShiftChain,
    bindings: Vec<OutputBinding>,
    was_connected: bool,
}

impl<P: PinIo> OutputBoard<P> {
    /// Capture the wiring and chain length; no I/O happens until `begin()`
    pub fn new(io: P, pins: BoardPins, chain_length: usize) -> Self {
        Self {
            io,
            pins,
            chain: ShiftChain::new(chain_length),
            bindings: Vec::new(),
            was_connected: false,
        }
    }

    /// Board with the default card wiring and a single card
    pub fn with_defaults(io: P) -> Self {
        Self::new(io, BoardPins::default(), DEFAULT_CHAIN_LENGTH)
    }

    pub fn from_settings(io: P, settings: &BoardSettings) -> Self {
        Self::new(io, settings.pins, settings.chain_length)
    }

    pub fn pins(&self) -> &BoardPins {
        &self.pins
    }

    pub fn chain_length(&self) -> usize {
        self.chain.chain_length()
    }

    /// Number of 1-based outputs
    pub fn outputs(&self) -> usize {
        self.chain.outputs()
    }

    pub fn is_initialized(&self) -> bool {
        self.chain.is_initialized()
    }

    pub fn is_dirty(&self) -> bool {
        self.chain.is_dirty()
    }

    pub fn io(&self) -> &P {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut P {
        &mut self.io
    }

    /// Bindings in attachment order
    pub fn bindings(&self) -> &[OutputBinding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&OutputBinding> {
        self.bindings.get(index)
    }

    /// Attach a binding, returning its index on this board
    pub fn attach(&mut self, binding: impl Into<OutputBinding>) -> usize {
        self.bindings.push(binding.into());
        self.bindings.len() - 1
    }

    fn ensure_not_started(&self, operation: &'static str) -> Result<()> {
        if self.chain.is_initialized() {
            let err = OutputError::AlreadyInitialized { operation };
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    pub fn set_data_pin(&mut self, pin: u8) -> Result<()> {
        self.ensure_not_started("OutputBoard::set_data_pin")?;
        self.pins.data = pin;
        Ok(())
    }

    pub fn set_clock_pin(&mut self, pin: u8) -> Result<()> {
        self.ensure_not_started("OutputBoard::set_clock_pin")?;
        self.pins.clock = pin;
        Ok(())
    }

    pub fn set_strobe_pin(&mut self, pin: u8) -> Result<()> {
        self.ensure_not_started("OutputBoard::set_strobe_pin")?;
        self.pins.strobe = pin;
        Ok(())
    }

    pub fn set_enable_pin(&mut self, pin: u8, active_low: bool) -> Result<()> {
        self.ensure_not_started("OutputBoard::set_enable_pin")?;
        self.pins = self.pins.with_enable(pin, active_low);
        Ok(())
    }

    /// Start the board: clear the chain, validate and subscribe its bindings
    pub fn begin<L: TelemetryLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        self.begin_checked(link, 0)
    }

    /// `begin()` for a board whose registry holds `orphans` unattached bindings
    pub(crate) fn begin_checked<L: TelemetryLink + ?Sized>(
        &mut self,
        link: &mut L,
        orphans: usize,
    ) -> Result<()> {
        self.ensure_not_started("OutputBoard::begin")?;

        let chain_length = self.chain.chain_length();
        if chain_length > MAX_CHAIN_LENGTH {
            let err = OutputError::ChainTooLong {
                chain_length,
                max: MAX_CHAIN_LENGTH,
            };
            error!("{}", err);
            return Err(err);
        }

        if chain_length == 0 {
            error!("{}", OutputError::EmptyChain);
            return Err(OutputError::EmptyChain);
        }

        self.reset_hardware();

        if orphans > 0 {
            let err = OutputError::OrphanedBindings { count: orphans };
            error!("{}", err);
            return Err(err);
        }

        if self.bindings.is_empty() {
            warn!("No bindings defined for output board");
        }

        let max_pin = self.chain.outputs();
        for binding in &mut self.bindings {
            // Failures only disable the binding concerned.
            let _ = binding.validate(max_pin, link);
        }

        self.chain.set_initialized(true);
        info!(
            "Output board started: {} shift registers, {} of {} bindings enabled",
            chain_length,
            self.bindings.iter().filter(|b| b.is_enabled()).count(),
            self.bindings.len()
        );
        Ok(())
    }

    /// Configure the bus and latch an all-off state onto the chain
    fn reset_hardware(&mut self) {
        self.chain.clear();

        let pins = self.pins;
        for pin in [pins.clock, pins.data, pins.strobe] {
            self.io.configure_output(pin);
            self.io.write(pin, PinState::Low);
        }
        if let Some(enable) = pins.enable {
            self.io.configure_output(enable.pin);
            self.io.write(enable.pin, PinState::from(enable.inactive_level()));
        }

        self.chain.mark_dirty();
        self.chain.write_frame(&mut self.io, &pins);

        if let Some(enable) = pins.enable {
            self.io.write(enable.pin, PinState::from(enable.active_level()));
        }
    }

    /// Set or clear a 1-based output; returns `Ok(true)` if it changed
    pub fn set_bit(&mut self, pin: usize, value: bool) -> Result<bool> {
        self.chain.set_bit(pin, value)
    }

    /// Current value of a 1-based output, `false` when the read is refused
    pub fn get_bit(&self, pin: usize) -> bool {
        self.chain.get_bit(pin)
    }

    pub fn try_get_bit(&self, pin: usize) -> Result<bool> {
        self.chain.try_get_bit(pin)
    }

    /// Write the whole chain regardless of changes
    pub fn flush(&mut self) -> Result<()> {
        self.chain.flush(&mut self.io, &self.pins)
    }

    /// Write the chain if any output changed since the last write
    pub fn flush_if_dirty(&mut self) -> Result<bool> {
        self.chain.flush_if_dirty(&mut self.io, &self.pins)
    }

    /// Route a signal change to the bindings listening to it
    pub fn dispatch(&mut self, handle: SignalHandle, value: f32) {
        for binding in &self.bindings {
            if binding.signal_handle() == Some(handle) {
                let _ = binding.notify(value, &mut self.chain);
            }
        }
    }

    /// Track host connectivity; on reconnection every enabled binding rewrites
    /// its output from the latest value
    pub(crate) fn sync_link<L: TelemetryLink + ?Sized>(&mut self, link: &L) {
        let connected = link.is_connected();
        if connected == self.was_connected {
            return;
        }

        if connected {
            info!("Connection with simulator established");
            for binding in self.bindings.iter().filter(|b| b.is_enabled()) {
                let _ = binding.force_resync(link, &mut self.chain);
            }
        } else {
            warn!("Connection with simulator lost");
        }
        self.was_connected = connected;
    }

    /// One control cycle: resync on reconnection, then flush
    ///
    /// Value changes are not polled here. The link is shared by every board,
    /// so its changes are drained once per cycle and routed through
    /// [`OutputBoard::dispatch`], usually by `OutputRegistry::poll`.
    pub fn tick<L: TelemetryLink + ?Sized>(&mut self, link: &L) -> Result<()> {
        self.chain.ensure_initialized("OutputBoard::tick")?;
        self.sync_link(link);
        self.flush_if_dirty().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::DigitalBinding;
    use crate::pins::{BitOrder, BusOp, RecordingPins};
    use crate::telemetry::SimulatedLink;
    use multiout_core::BindingState;

    fn board(chain_length: usize) -> OutputBoard<RecordingPins> {
        OutputBoard::new(RecordingPins::new(), BoardPins::new(5, 2, 3), chain_length)
    }

    fn started(chain_length: usize) -> OutputBoard<RecordingPins> {
        let mut board = board(chain_length);
        board.begin(&mut SimulatedLink::new()).unwrap();
        board.io_mut().clear();
        board
    }

    #[test]
    fn test_construction_does_no_io() {
        let board = OutputBoard::with_defaults(RecordingPins::new());
        assert!(board.io().ops().is_empty());
        assert!(!board.is_initialized());
        assert_eq!(board.chain_length(), 6);
        assert_eq!(board.outputs(), 48);
    }

    #[test]
    fn test_begin_configures_bus_and_clears_chain() {
        let mut board = OutputBoard::new(
            RecordingPins::new(),
            BoardPins::new(5, 2, 3).with_enable(4, true),
            2,
        );
        board.begin(&mut SimulatedLink::new()).unwrap();

        let ops = board.io().ops();
        assert_eq!(
            &ops[..8],
            &[
                BusOp::Configure(2),
                BusOp::Write(2, PinState::Low),
                BusOp::Configure(5),
                BusOp::Write(5, PinState::Low),
                BusOp::Configure(3),
                BusOp::Write(3, PinState::Low),
                BusOp::Configure(4),
                BusOp::Write(4, PinState::High),
            ]
        );
        assert_eq!(board.io().shifted_bytes(), vec![0, 0]);
        // Outputs are enabled once the all-off state is latched.
        assert_eq!(ops.last(), Some(&BusOp::Write(4, PinState::Low)));
        assert!(board.is_initialized());
        assert!(!board.is_dirty());
    }

    #[test]
    fn test_begin_rejects_long_chain() {
        let mut board = board(MAX_CHAIN_LENGTH + 1);
        let result = board.begin(&mut SimulatedLink::new());

        assert!(matches!(result, Err(OutputError::ChainTooLong { .. })));
        assert!(!board.is_initialized());
        assert!(board.io().ops().is_empty());
    }

    #[test]
    fn test_begin_rejects_empty_chain() {
        let mut board = board(0);
        board.attach(DigitalBinding::new(1).with_signal("sim/a"));
        let result = board.begin(&mut SimulatedLink::new());

        assert!(matches!(result, Err(OutputError::EmptyChain)));
        assert!(!board.is_initialized());
        assert!(board.io().ops().is_empty());
        assert_eq!(board.bindings()[0].state(), BindingState::Unvalidated);
    }

    #[test]
    fn test_begin_accepts_max_chain() {
        let mut board = board(MAX_CHAIN_LENGTH);
        board.begin(&mut SimulatedLink::new()).unwrap();
        assert_eq!(board.io().shifted_bytes().len(), MAX_CHAIN_LENGTH);
    }

    #[test]
    fn test_begin_twice_is_reported() {
        let mut board = started(1);
        let result = board.begin(&mut SimulatedLink::new());

        assert!(matches!(result, Err(OutputError::AlreadyInitialized { .. })));
        assert!(board.io().ops().is_empty());
    }

    #[test]
    fn test_begin_with_orphans_aborts() {
        let mut board = board(1);
        let result = board.begin_checked(&mut SimulatedLink::new(), 2);

        assert!(matches!(
            result,
            Err(OutputError::OrphanedBindings { count: 2 })
        ));
        assert!(!board.is_initialized());
    }

    #[test]
    fn test_pin_setters_only_before_begin() {
        let mut board = board(1);
        board.set_data_pin(10).unwrap();
        board.set_clock_pin(11).unwrap();
        board.set_strobe_pin(12).unwrap();
        board.set_enable_pin(13, true).unwrap();
        assert_eq!(board.pins().data, 10);
        assert_eq!(board.pins().clock, 11);
        assert_eq!(board.pins().strobe, 12);
        assert_eq!(board.pins().enable.map(|e| e.pin), Some(13));

        board.begin(&mut SimulatedLink::new()).unwrap();
        assert!(matches!(
            board.set_data_pin(20),
            Err(OutputError::AlreadyInitialized { .. })
        ));
        assert_eq!(board.pins().data, 10);
    }

    #[test]
    fn test_data_path_before_begin_is_noop() {
        let mut board = board(1);

        assert!(board.set_bit(1, true).is_err());
        assert!(!board.get_bit(1));
        assert!(board.flush().is_err());
        assert!(board.flush_if_dirty().is_err());
        assert!(board.tick(&SimulatedLink::new()).is_err());
        assert!(board.io().ops().is_empty());
    }

    #[test]
    fn test_set_bit_then_flush() {
        let mut board = started(2);

        assert!(board.set_bit(9, true).unwrap());
        assert!(board.flush_if_dirty().unwrap());
        assert_eq!(board.io().shifted_bytes(), vec![0x01, 0x00]);

        board.io_mut().clear();
        assert!(!board.flush_if_dirty().unwrap());
        assert!(board.io().ops().is_empty());
    }

    #[test]
    fn test_flush_always_writes() {
        let mut board = started(2);
        board.flush().unwrap();

        assert_eq!(
            board.io().ops().first(),
            Some(&BusOp::Write(3, PinState::Low))
        );
        assert!(board.io().ops().contains(&BusOp::Shift {
            data: 5,
            clock: 2,
            order: BitOrder::MsbFirst,
            byte: 0
        }));
        assert_eq!(board.io().shifted_bytes().len(), 2);
    }

    #[test]
    fn test_bindings_validated_against_this_chain() {
        let mut board = board(1);
        let inside = board.attach(DigitalBinding::new(8).with_signal("sim/a"));
        let outside = board.attach(DigitalBinding::new(9).with_signal("sim/b"));
        let unnamed = board.attach(DigitalBinding::new(2));

        board.begin(&mut SimulatedLink::new()).unwrap();

        assert_eq!(board.binding(inside).unwrap().state(), BindingState::Enabled);
        assert_eq!(board.binding(outside).unwrap().state(), BindingState::Disabled);
        assert_eq!(board.binding(unnamed).unwrap().state(), BindingState::Disabled);
        assert!(board.is_initialized());
    }

    #[test]
    fn test_tick_flushes_dispatched_changes() {
        let mut link = SimulatedLink::new();
        link.set_connected(true);
        let mut board = board(1);
        board.attach(DigitalBinding::new(1).with_signal("sim/a"));
        board.begin(&mut link).unwrap();
        board.tick(&link).unwrap();
        board.io_mut().clear();

        link.set("sim/a", 1.0);
        link.poll_updates(&mut |handle, value| board.dispatch(handle, value));
        assert!(board.is_dirty());
        board.tick(&link).unwrap();

        assert!(board.get_bit(1));
        assert_eq!(board.io().shifted_bytes(), vec![0x01]);
    }

    #[test]
    fn test_tick_leaves_pending_changes_on_link() {
        let mut link = SimulatedLink::new();
        link.set_connected(true);
        let mut board = board(1);
        board.attach(DigitalBinding::new(1).with_signal("sim/a"));
        board.begin(&mut link).unwrap();

        link.set("sim/a", 1.0);
        board.tick(&link).unwrap();

        assert_eq!(link.pending(), 1);
    }

    #[test]
    fn test_dispatch_ignores_other_signals() {
        let mut link = SimulatedLink::new();
        let mut board = board(1);
        board.attach(DigitalBinding::new(1).with_signal("sim/a"));
        board.begin(&mut link).unwrap();

        let other = link.bind("sim/other");
        board.dispatch(other, 5.0);

        assert!(!board.get_bit(1));
        assert!(!board.is_dirty());
    }
}
