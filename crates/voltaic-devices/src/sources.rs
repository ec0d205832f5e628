//! Independent sources.
//!
//! Voltage sources never become components: the netlist lowering turns them
//! into static or input pins. Only the current source injects directly.

use voltaic_core::{Component, Pin, VoltageView};

/// Independent current source, driving its current from pin 0 towards pin 1.
pub struct CurrentSource {
    value: f64,
    pins: Vec<Pin>,
}

impl CurrentSource {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            pins: Vec::new(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Component for CurrentSource {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn precompute(&mut self, _voltages: &dyn VoltageView, _steady_state: bool) {}

    fn current(&self, pin_index: usize, _steady_state: bool) -> f64 {
        self.value * if pin_index == 0 { -1.0 } else { 1.0 }
    }

    fn gradient(&self, _pin_index_ref: usize, _pin_index: usize, _steady_state: bool) -> f64 {
        0.0
    }
}
