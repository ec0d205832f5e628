//! Core circuit representation for the Voltaic simulator.
//!
//! This crate provides:
//! - Pin classification (static / input / dynamic) and pin references
//! - The component contract implemented by every device model
//! - The circuit model owning components, pin adjacency and voltage state
//! - SPICE value scaling used by the netlist front end

pub mod circuit;
pub mod component;
pub mod error;
pub mod pin;
pub mod units;

pub use circuit::{Circuit, EquationClaims};
pub use component::{Component, VoltageView};
pub use error::{Error, Result};
pub use pin::{Pin, PinType};
