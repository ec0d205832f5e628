//! Error types for circuit construction and introspection.

use thiserror::Error;

use crate::pin::PinType;

/// Errors surfaced while building or querying a circuit.
///
/// Per-sample processing never fails: the Newton-Raphson loop keeps its
/// last iterate on non-convergence, so every variant here is a
/// construction-time or introspection error.
#[derive(Debug, Error)]
pub enum Error {
    /// A component references a pin index beyond the declared class size.
    #[error("pin {index} is out of range for the {pin_type:?} class ({count} pins declared)")]
    PinOutOfRange {
        pin_type: PinType,
        index: usize,
        count: usize,
    },

    /// A vector length does not match the declared pin count.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Two components tried to own the same custom-equation row.
    #[error("dynamic pin {row} already carries a custom equation")]
    DuplicateClaim { row: usize },

    /// A constraint device needs a dynamic pin on a terminal that is not one.
    #[error("the {terminal} terminal of a constraint component must be a dynamic pin")]
    StaticConstraint { terminal: &'static str },

    /// Components cannot be added once the circuit has been frozen.
    #[error("circuit is frozen; components must be added before setup")]
    Frozen,

    /// The host negotiated different input and output sampling rates.
    #[error("input sampling rate {input} Hz does not match output sampling rate {output} Hz")]
    SamplingRateMismatch { input: usize, output: usize },

    /// Setup ran before any sampling rate was negotiated.
    #[error("sampling rates must be set before setup")]
    SamplingRateUnset,

    /// `parameter`/`set_parameter` with an identifier nothing exposes.
    #[error("no parameter with identifier {identifier}")]
    UnknownParameter { identifier: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
