//! Pin classification for the nodal model.
//!
//! Every net of a lowered circuit becomes a pin tagged with one of three
//! classes. Static pins hold a fixed supply voltage, input pins follow the
//! upstream sample stream, and dynamic pins are solved at every sample.

/// Voltage class of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinType {
    /// Fixed voltage for the lifetime of the simulation (ground, DC rails).
    Static,
    /// Driven by an upstream sample stream, one pin per input port.
    Input,
    /// Solved by the Newton-Raphson iteration.
    Dynamic,
}

/// Reference to a pin: its class plus its index within that class.
///
/// Pin references are immutable once the circuit is frozen; index 0 of the
/// static class is reserved for ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin {
    pub pin_type: PinType,
    pub index: usize,
}

impl Pin {
    /// Ground, held at 0 V.
    pub const GROUND: Pin = Pin {
        pin_type: PinType::Static,
        index: 0,
    };

    pub const fn new(pin_type: PinType, index: usize) -> Self {
        Self { pin_type, index }
    }

    /// A static pin (`static` itself is a reserved word).
    pub const fn fixed(index: usize) -> Self {
        Self::new(PinType::Static, index)
    }

    pub const fn input(index: usize) -> Self {
        Self::new(PinType::Input, index)
    }

    pub const fn dynamic(index: usize) -> Self {
        Self::new(PinType::Dynamic, index)
    }

    pub const fn is_ground(&self) -> bool {
        matches!(self.pin_type, PinType::Static) && self.index == 0
    }

    pub const fn is_dynamic(&self) -> bool {
        matches!(self.pin_type, PinType::Dynamic)
    }
}
