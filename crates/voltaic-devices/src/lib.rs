//! Device models for the Voltaic simulator.
//!
//! This crate provides the closed set of idealized devices the netlist
//! lowering can place:
//! - Passive elements: resistor, capacitor, coil (trapezoidal companions)
//! - Junction devices: diode, bipolar transistor
//! - Sources: independent current source
//! - Constraint devices: ideal op-amp, voltage-controlled voltage source
//!
//! Each module holds the device primitive (the closed-form stamp formulas,
//! with no notion of pins) and the adapter implementing the
//! [`Component`](voltaic_core::Component) contract on top of it.

pub mod controlled;
pub mod diode;
pub mod passive;
pub mod sources;
pub mod transistor;

pub use controlled::{OpAmp, Vcvs};
pub use diode::{Diode, DiodeParams};
pub use passive::{Capacitor, Coil, Resistor};
pub use sources::CurrentSource;
pub use transistor::{Transistor, TransistorParams};
