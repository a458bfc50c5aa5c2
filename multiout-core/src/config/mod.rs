//! Configuration types for multiout
//!
//! An application may describe its boards and bindings in a TOML document
//! instead of constructing them by hand:
//! - [`BoardSettings`] - bus wiring and chain length of one board
//! - [`BindingSettings`] - one signal-to-output binding
//! - [`OutputsConfig`] - the whole set, in declaration order

mod outputs;

pub use outputs::{BindingSettings, BoardSettings, OutputsConfig};
