//! Telemetry link to the simulator host
//!
//! The host publishes named floating-point signals and reports their changes.
//! Changes are delivered synchronously from inside [`TelemetryLink::poll_updates`],
//! so a handler cannot poll again while it runs.

use std::collections::{BTreeSet, VecDeque};

use multiout_core::SignalHandle;
use tracing::debug;

/// Trait for telemetry host abstraction
pub trait TelemetryLink {
    /// Drain pending value changes, calling `on_change` for each change of a
    /// subscribed signal
    fn poll_updates(&mut self, on_change: &mut dyn FnMut(SignalHandle, f32));

    /// Whether the host is currently connected
    fn is_connected(&self) -> bool;

    /// Resolve a signal name to a handle
    fn bind(&mut self, name: &str) -> SignalHandle;

    /// Latest known value of a signal
    fn read(&self, handle: SignalHandle) -> f32;

    /// Ask for change notifications of a signal
    fn subscribe(&mut self, handle: SignalHandle);
}

#[derive(Debug)]
struct Signal {
    name: String,
    value: f32,
}

/// In-memory telemetry host
///
/// Values set with [`SimulatedLink::set`] are queued and delivered on the next
/// poll. While disconnected, values still update but no changes are delivered.
#[derive(Debug, Default)]
pub struct SimulatedLink {
    signals: Vec<Signal>,
    subscribed: BTreeSet<SignalHandle>,
    pending: VecDeque<SignalHandle>,
    connected: bool,
}

impl SimulatedLink {
    /// Create a disconnected link with no signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the host as connected or disconnected
    pub fn set_connected(&mut self, connected: bool) {
        if connected != self.connected {
            debug!(
                "Simulated host {}",
                if connected { "connected" } else { "disconnected" }
            );
        }
        self.connected = connected;
    }

    /// Publish a new value for a signal, binding the name if needed
    pub fn set(&mut self, name: &str, value: f32) {
        let handle = self.bind(name);
        let signal = &mut self.signals[handle.0 as usize];
        if signal.value == value {
            return;
        }
        signal.value = value;
        if self.connected && !self.pending.contains(&handle) {
            self.pending.push_back(handle);
        }
    }

    /// Latest value of a signal by name
    pub fn value(&self, name: &str) -> Option<f32> {
        self.signals
            .iter()
            .find(|signal| signal.name == name)
            .map(|signal| signal.value)
    }

    /// Whether anything registered interest in a signal
    pub fn is_subscribed(&self, name: &str) -> bool {
        self.signals
            .iter()
            .position(|signal| signal.name == name)
            .map(|index| self.subscribed.contains(&SignalHandle(index as u32)))
            .unwrap_or(false)
    }

    /// Changes waiting for the next poll
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl TelemetryLink for SimulatedLink {
    fn poll_updates(&mut self, on_change: &mut dyn FnMut(SignalHandle, f32)) {
        while let Some(handle) = self.pending.pop_front() {
            if self.subscribed.contains(&handle) {
                on_change(handle, self.signals[handle.0 as usize].value);
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn bind(&mut self, name: &str) -> SignalHandle {
        if let Some(index) = self.signals.iter().position(|signal| signal.name == name) {
            return SignalHandle(index as u32);
        }
        self.signals.push(Signal {
            name: name.to_string(),
            value: 0.0,
        });
        SignalHandle((self.signals.len() - 1) as u32)
    }

    fn read(&self, handle: SignalHandle) -> f32 {
        self.signals
            .get(handle.0 as usize)
            .map(|signal| signal.value)
            .unwrap_or(0.0)
    }

    fn subscribe(&mut self, handle: SignalHandle) {
        self.subscribed.insert(handle);
    }
}
