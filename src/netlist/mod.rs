//! Netlist representation built from parsed declarations.
//!
//! This is a deliberately small model: nets, pads, components and the
//! connections between them. [`Circuit::from_network`] shows how a caller
//! turns the `network` section of a DSN tree into one.

mod circuit;
mod types;

pub use circuit::{BaseComponent, Circuit, Component, Connection};
pub use types::{Net, Pad};
