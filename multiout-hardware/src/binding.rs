//! Bindings between telemetry signals and board outputs
//!
//! A binding is validated once, when its board starts, and is then either
//! enabled for the rest of the process or permanently disabled.

use multiout_core::{
    BindingState, DebugLevel, OutputError, Result, SignalHandle, DEFAULT_ON_THRESHOLD,
};
use tracing::{debug, error, info};

use crate::shift_chain::ShiftChain;
use crate::telemetry::TelemetryLink;

/// Why validation disabled a binding
#[derive(Debug, Clone, Copy)]
enum Fault {
    PinOutOfRange { outputs: usize },
    MissingSignal,
}

/// State shared by every binding kind
#[derive(Debug, Clone)]
struct BindingCore {
    pin: usize,
    state: BindingState,
    fault: Option<Fault>,
    debug: DebugLevel,
}

impl BindingCore {
    fn new(pin: usize) -> Self {
        Self {
            pin,
            state: BindingState::Unvalidated,
            fault: None,
            debug: DebugLevel::Off,
        }
    }

    fn error(&self, fault: Fault) -> OutputError {
        match fault {
            Fault::PinOutOfRange { outputs } => OutputError::PinOutOfRange {
                pin: self.pin,
                outputs,
            },
            Fault::MissingSignal => OutputError::MissingSignal { pin: self.pin },
        }
    }

    fn disable(&mut self, fault: Fault) -> OutputError {
        self.state = BindingState::Disabled;
        self.fault = Some(fault);
        self.error(fault)
    }

    /// Outcome of an earlier validation, `None` while unvalidated
    fn outcome(&self) -> Option<Result<()>> {
        match (self.state, self.fault) {
            (BindingState::Unvalidated, _) => None,
            (_, Some(fault)) => Some(Err(self.error(fault))),
            (_, None) => Some(Ok(())),
        }
    }

    fn validate_pin(&mut self, max_pin: usize) -> Result<()> {
        if self.pin == 0 || self.pin > max_pin {
            let err = self.disable(Fault::PinOutOfRange { outputs: max_pin });
            error!("Binding disabled: {}", err);
            return Err(err);
        }
        self.state = BindingState::Enabled;
        Ok(())
    }
}

/// Binding that switches an output on when a signal crosses a threshold
#[derive(Debug, Clone)]
pub struct DigitalBinding {
    core: BindingCore,
    signal: Option<String>,
    handle: Option<SignalHandle>,
    threshold: f32,
    inverted: bool,
}

impl DigitalBinding {
    /// Binding for 1-based output `pin` with the default threshold
    pub fn new(pin: usize) -> Self {
        Self {
            core: BindingCore::new(pin),
            signal: None,
            handle: None,
            threshold: DEFAULT_ON_THRESHOLD,
            inverted: false,
        }
    }

    pub fn with_signal(mut self, name: impl Into<String>) -> Self {
        self.set_signal(name);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Switch the output on at or below the threshold instead
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn with_debug(mut self, level: DebugLevel) -> Self {
        self.core.debug = level;
        self
    }

    /// Assign the signal (dataref) name
    pub fn set_signal(&mut self, name: impl Into<String>) {
        self.signal = Some(name.into());
        self.handle = None;
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub fn signal(&self) -> Option<&str> {
        self.signal.as_deref()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Output state for a signal value; closed on the threshold in both
    /// polarities
    pub fn target_state(&self, value: f32) -> bool {
        if self.inverted {
            value <= self.threshold
        } else {
            value >= self.threshold
        }
    }

    /// Check the binding against a board of `max_pin` outputs and subscribe to
    /// its signal
    pub fn validate<L: TelemetryLink + ?Sized>(&mut self, max_pin: usize, link: &mut L) -> Result<()> {
        if let Some(outcome) = self.core.outcome() {
            return outcome;
        }
        self.core.validate_pin(max_pin)?;

        let name = match self.signal.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                let err = self.core.disable(Fault::MissingSignal);
                error!("{}. Please assign one!", err);
                return Err(err);
            }
        };

        let handle = link.bind(name);
        link.subscribe(handle);
        self.handle = Some(handle);
        info!("Output {} bound to {}", self.core.pin, name);
        Ok(())
    }

    /// React to a new signal value
    ///
    /// Returns `Ok(true)` when the output was switched.
    pub fn notify(&self, value: f32, chain: &mut ShiftChain) -> Result<bool> {
        if !self.core.state.is_enabled() {
            return Ok(false);
        }

        let name = self.signal.as_deref().unwrap_or_default();
        let target = self.target_state(value);
        if chain.try_get_bit(self.core.pin)? == target {
            if self.core.debug >= DebugLevel::Value {
                debug!(
                    "Signal {} changed to {}, no change on output {}",
                    name, value, self.core.pin
                );
            }
            return Ok(false);
        }

        if self.core.debug >= DebugLevel::Output {
            info!(
                "Signal {} changed to {}, output {} will be turned {}",
                name,
                value,
                self.core.pin,
                if target { "ON" } else { "OFF" }
            );
        }
        chain.set_bit(self.core.pin, target)
    }

    /// Re-apply the latest known signal value
    pub fn force_resync<L: TelemetryLink + ?Sized>(&self, link: &L, chain: &mut ShiftChain) -> Result<bool> {
        match self.handle {
            Some(handle) if self.core.state.is_enabled() => self.notify(link.read(handle), chain),
            _ => Ok(false),
        }
    }
}

/// Any binding a board can own
#[derive(Debug, Clone)]
pub enum OutputBinding {
    Digital(DigitalBinding),
}

impl OutputBinding {
    fn core(&self) -> &BindingCore {
        match self {
            OutputBinding::Digital(binding) => &binding.core,
        }
    }

    fn core_mut(&mut self) -> &mut BindingCore {
        match self {
            OutputBinding::Digital(binding) => &mut binding.core,
        }
    }

    /// 1-based output number
    pub fn pin(&self) -> usize {
        self.core().pin
    }

    pub fn state(&self) -> BindingState {
        self.core().state
    }

    pub fn is_enabled(&self) -> bool {
        self.core().state.is_enabled()
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.core().debug
    }

    pub fn set_debug(&mut self, level: DebugLevel) {
        self.core_mut().debug = level;
    }

    /// Handle of the signal driving this binding, once validated
    pub fn signal_handle(&self) -> Option<SignalHandle> {
        match self {
            OutputBinding::Digital(binding) => binding.handle,
        }
    }

    pub fn validate<L: TelemetryLink + ?Sized>(&mut self, max_pin: usize, link: &mut L) -> Result<()> {
        match self {
            OutputBinding::Digital(binding) => binding.validate(max_pin, link),
        }
    }

    pub fn notify(&self, value: f32, chain: &mut ShiftChain) -> Result<bool> {
        match self {
            OutputBinding::Digital(binding) => binding.notify(value, chain),
        }
    }

    pub fn force_resync<L: TelemetryLink + ?Sized>(&self, link: &L, chain: &mut ShiftChain) -> Result<bool> {
        match self {
            OutputBinding::Digital(binding) => binding.force_resync(link, chain),
        }
    }
}

impl From<DigitalBinding> for OutputBinding {
    fn from(binding: DigitalBinding) -> Self {
        OutputBinding::Digital(binding)
    }
}
