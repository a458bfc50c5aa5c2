//! multiout-hardware
//!
//! Driver crate for chains of shift-register output boards and the bindings
//! that switch their outputs from simulator telemetry.
//
//! Public API:
//! - `output_board::OutputBoard` — one chain: bit buffer, bus writes, bindings
//! - `binding::DigitalBinding` — threshold binding of a signal to one output
//! - `registry::OutputRegistry` — every board of an application, first-board lookup
//! - `pins::PinIo` / `telemetry::TelemetryLink` — the platform contracts

pub mod binding;
pub mod logging;
pub mod output_board;
pub mod pins;
pub mod registry;
pub mod shift_chain;
pub mod telemetry;

pub use binding::{DigitalBinding, OutputBinding};
pub use output_board::OutputBoard;
pub use pins::{BitOrder, BusOp, PinIo, RecordingPins};
pub use registry::OutputRegistry;
pub use shift_chain::ShiftChain;
pub use telemetry::{SimulatedLink, TelemetryLink};
