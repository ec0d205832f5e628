//! Solver and sample driver for the Voltaic simulator.
//!
//! [`NewtonRaphson`] drives the Kirchhoff residuals of a circuit's dynamic
//! pins to zero; [`CircuitFilter`] wraps a circuit and a solver into the
//! per-sample processing loop of an audio filter, including the steady-state
//! warm-up ramp at setup.

pub mod filter;
pub mod newton;

pub use filter::{CircuitFilter, DEFAULT_WARMUP_STEPS};
pub use newton::{ConvergenceCriteria, NewtonRaphson};
