//! Netlist AST: component entries plus model definitions.

use std::collections::HashMap;
use std::fmt;

/// One argument of a component entry: a net name or a resolved value.
#[derive(Debug, Clone, PartialEq)]
pub enum NetlistArg {
    Name(String),
    Number(f64),
}

impl NetlistArg {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NetlistArg::Number(value) => Some(*value),
            NetlistArg::Name(_) => None,
        }
    }

    /// The argument read as a net name; numeric nets (`0`, `12`) format back
    /// to their digit form.
    pub fn to_name(&self) -> String {
        match self {
            NetlistArg::Name(name) => name.clone(),
            NetlistArg::Number(value) => format!("{value}"),
        }
    }
}

impl fmt::Display for NetlistArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetlistArg::Name(name) => write!(f, "{name}"),
            NetlistArg::Number(value) => write!(f, "{value}"),
        }
    }
}

/// A component entry: lowercased name plus its ordered argument list. The
/// first character of the name keys the device class.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentLine {
    pub name: String,
    pub args: Vec<NetlistArg>,
}

impl fmt::Display for ComponentLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Device class of a `.model` definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Diode,
    Npn,
    Pnp,
}

/// A `.model` definition: its kind plus keyed parameter overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub kind: ModelKind,
    pub parameters: HashMap<String, f64>,
}

impl ModelDefinition {
    /// The override for `key`, or `default` when the model leaves it out.
    pub fn parameter(&self, key: &str, default: f64) -> f64 {
        self.parameters.get(key).copied().unwrap_or(default)
    }
}

/// Result of parsing a netlist: component entries in file order plus the
/// model map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetlistAst {
    pub components: Vec<ComponentLine>,
    pub models: HashMap<String, ModelDefinition>,
}
