//! Parser and lowering errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed token or line in the netlist text.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A component entry carries the wrong number of arguments.
    #[error("component {component} has {found} arguments, expected {expected}")]
    Arity {
        component: String,
        expected: usize,
        found: usize,
    },

    /// A value argument turned out to be a bare name.
    #[error("component {component}: expected a numeric value, found {found}")]
    ExpectedNumber { component: String, found: String },

    /// A voltage entry references no net that is grounded or already known.
    #[error("voltage source {component} references no grounded net")]
    Grounding { component: String },

    /// A device references a model that was never defined.
    #[error("unknown model {name}")]
    UnknownModel { name: String },

    /// A device references a model of the wrong kind.
    #[error("model {name} is not a {expected} model")]
    ModelKindMismatch { name: String, expected: &'static str },

    /// The leading character of a component name keys no device class.
    #[error("unknown device class for component {name}")]
    UnknownDevice { name: String },

    /// Two supplies drive the same net.
    #[error("net {net} is already driven by a supply")]
    DuplicateSupply { net: String },

    #[error(transparent)]
    Circuit(#[from] voltaic_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
