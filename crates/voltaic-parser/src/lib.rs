//! SPICE netlist front end for the Voltaic simulator.
//!
//! Parsing happens in two stages. [`parse`] turns netlist text into an
//! [`ast::NetlistAst`] of component entries and model definitions;
//! [`lower::build_circuit`] classifies the referenced nets into static,
//! input and dynamic pins and instantiates the devices into a
//! [`Circuit`](voltaic_core::Circuit) ready for the solver.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod parser;

pub use ast::{ComponentLine, ModelDefinition, ModelKind, NetlistArg, NetlistAst};
pub use error::{Error, Result};
pub use lower::build_circuit;
pub use parser::parse;
