//! Passive elements: resistor, capacitor, coil.
//!
//! The capacitor and coil are discretized with the trapezoidal rule; their
//! companion state (an equivalent source next to a fixed admittance) is the
//! only carrier of history between samples.

use voltaic_core::{Component, Error, Pin, Result, VoltageView};

// ────────────────────── Resistor ──────────────────────

/// Ohmic conductance between two pins.
#[derive(Debug, Clone, Copy)]
struct ResistorModel {
    g: f64,
}

impl ResistorModel {
    fn new(resistance: f64) -> Self {
        Self { g: 1.0 / resistance }
    }

    fn current(&self, v0: f64, v1: f64) -> f64 {
        (v1 - v0) * self.g
    }

    fn gradient(&self) -> f64 {
        self.g
    }

    fn resistance(&self) -> f64 {
        1.0 / self.g
    }
}

/// Linear resistor.
///
/// Exposes its resistance as a runtime parameter so a lowered potentiometer
/// can be swept while the model runs.
pub struct Resistor {
    inner: ResistorModel,
    pins: Vec<Pin>,
    v0: f64,
    v1: f64,
}

impl Resistor {
    pub fn new(resistance: f64) -> Self {
        Self {
            inner: ResistorModel::new(resistance),
            pins: Vec::new(),
            v0: 0.0,
            v1: 0.0,
        }
    }

    pub fn resistance(&self) -> f64 {
        self.inner.resistance()
    }
}

impl Component for Resistor {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn precompute(&mut self, voltages: &dyn VoltageView, _steady_state: bool) {
        self.v0 = voltages.retrieve_voltage(self.pins[0]);
        self.v1 = voltages.retrieve_voltage(self.pins[1]);
    }

    fn current(&self, pin_index: usize, _steady_state: bool) -> f64 {
        self.inner.current(self.v0, self.v1) * if pin_index == 0 { 1.0 } else { -1.0 }
    }

    fn gradient(&self, pin_index_ref: usize, pin_index: usize, _steady_state: bool) -> f64 {
        self.inner.gradient()
            * if pin_index_ref == 0 { 1.0 } else { -1.0 }
            * if pin_index == 1 { 1.0 } else { -1.0 }
    }

    fn num_parameters(&self) -> usize {
        1
    }

    fn parameter_name(&self, identifier: usize) -> Result<&'static str> {
        match identifier {
            0 => Ok("resistance"),
            _ => Err(Error::UnknownParameter { identifier }),
        }
    }

    fn parameter(&self, identifier: usize) -> Result<f64> {
        match identifier {
            0 => Ok(self.inner.resistance()),
            _ => Err(Error::UnknownParameter { identifier }),
        }
    }

    fn set_parameter(&mut self, identifier: usize, value: f64) -> Result<()> {
        match identifier {
            0 => {
                self.inner = ResistorModel::new(value);
                Ok(())
            }
            _ => Err(Error::UnknownParameter { identifier }),
        }
    }
}

// ────────────────────── Capacitor ──────────────────────

/// Trapezoidal companion model of a capacitor.
///
/// `c2t = 2C / dt` is the discretized admittance, `iceq` the equivalent
/// current source encoding the voltage history.
#[derive(Debug, Clone, Copy)]
struct CapacitorModel {
    c: f64,
    c2t: f64,
    iceq: f64,
}

impl CapacitorModel {
    fn new(capacitance: f64) -> Self {
        Self {
            c: capacitance,
            c2t: 0.0,
            iceq: 0.0,
        }
    }

    fn update_steady_state(&mut self, dt: f64, v0: f64, v1: f64) {
        self.c2t = 2.0 * self.c / dt;
        self.iceq = self.c2t * (v1 - v0);
    }

    fn update_state(&mut self, v0: f64, v1: f64) {
        self.iceq = 2.0 * self.c2t * (v1 - v0) - self.iceq;
    }

    fn current(&self, v0: f64, v1: f64) -> f64 {
        (v1 - v0) * self.c2t - self.iceq
    }

    fn gradient(&self) -> f64 {
        self.c2t
    }
}

/// Capacitor. Open circuit in steady state, trapezoidal companion otherwise.
pub struct Capacitor {
    inner: CapacitorModel,
    pins: Vec<Pin>,
    v0: f64,
    v1: f64,
}

impl Capacitor {
    pub fn new(capacitance: f64) -> Self {
        Self {
            inner: CapacitorModel::new(capacitance),
            pins: Vec::new(),
            v0: 0.0,
            v1: 0.0,
        }
    }

    pub fn capacitance(&self) -> f64 {
        self.inner.c
    }

    #[cfg(test)]
    fn iceq(&self) -> f64 {
        self.inner.iceq
    }

    #[cfg(test)]
    fn c2t(&self) -> f64 {
        self.inner.c2t
    }
}

impl Component for Capacitor {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn update_steady_state(&mut self, voltages: &dyn VoltageView, dt: f64) {
        let v0 = voltages.retrieve_voltage(self.pins[0]);
        let v1 = voltages.retrieve_voltage(self.pins[1]);
        self.inner.update_steady_state(dt, v0, v1);
    }

    fn update_state(&mut self, voltages: &dyn VoltageView) {
        let v0 = voltages.retrieve_voltage(self.pins[0]);
        let v1 = voltages.retrieve_voltage(self.pins[1]);
        self.inner.update_state(v0, v1);
    }

    fn precompute(&mut self, voltages: &dyn VoltageView, _steady_state: bool) {
        self.v0 = voltages.retrieve_voltage(self.pins[0]);
        self.v1 = voltages.retrieve_voltage(self.pins[1]);
    }

    fn current(&self, pin_index: usize, steady_state: bool) -> f64 {
        if steady_state {
            return 0.0;
        }
        self.inner.current(self.v0, self.v1) * if pin_index == 0 { 1.0 } else { -1.0 }
    }

    fn gradient(&self, pin_index_ref: usize, pin_index: usize, steady_state: bool) -> f64 {
        if steady_state {
            return 0.0;
        }
        self.inner.gradient()
            * if pin_index_ref == 0 { 1.0 } else { -1.0 }
            * if pin_index == 1 { 1.0 } else { -1.0 }
    }
}

// ────────────────────── Coil ──────────────────────

/// Large finite conductance standing in for the coil's DC short while the
/// steady state is computed.
const STEADY_STATE_CONDUCTANCE: f64 = 1e6;

/// Trapezoidal companion model of a coil.
///
/// `veq` is the equivalent voltage source encoding the current history and
/// `i` the through current refreshed at every precompute.
#[derive(Debug, Clone, Copy)]
struct CoilModel {
    l: f64,
    l2t: f64,
    invl2t: f64,
    veq: f64,
    i: f64,
}

impl CoilModel {
    fn new(inductance: f64) -> Self {
        Self {
            l: inductance,
            l2t: 0.0,
            invl2t: 0.0,
            veq: 0.0,
            i: 0.0,
        }
    }

    fn update_steady_state(&mut self, dt: f64) {
        self.l2t = 2.0 * self.l / dt;
        self.invl2t = 1.0 / self.l2t;
        self.veq = self.l2t * self.i;
    }

    fn update_state(&mut self) {
        self.veq = 2.0 * self.l2t * self.i - self.veq;
    }

    fn precompute(&mut self, v0: f64, v1: f64, steady_state: bool) {
        if steady_state {
            self.i = (v1 - v0) * STEADY_STATE_CONDUCTANCE;
        } else {
            self.i = (v1 - v0 + self.veq) * self.invl2t;
        }
    }

    fn current(&self) -> f64 {
        self.i
    }

    fn gradient(&self, steady_state: bool) -> f64 {
        if steady_state {
            STEADY_STATE_CONDUCTANCE
        } else {
            self.invl2t
        }
    }
}

/// Coil (inductor). Near-short in steady state, trapezoidal companion
/// otherwise.
pub struct Coil {
    inner: CoilModel,
    pins: Vec<Pin>,
}

impl Coil {
    pub fn new(inductance: f64) -> Self {
        Self {
            inner: CoilModel::new(inductance),
            pins: Vec::new(),
        }
    }

    pub fn inductance(&self) -> f64 {
        self.inner.l
    }
}

impl Component for Coil {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn update_steady_state(&mut self, _voltages: &dyn VoltageView, dt: f64) {
        self.inner.update_steady_state(dt);
    }

    fn update_state(&mut self, _voltages: &dyn VoltageView) {
        self.inner.update_state();
    }

    fn precompute(&mut self, voltages: &dyn VoltageView, steady_state: bool) {
        let v0 = voltages.retrieve_voltage(self.pins[0]);
        let v1 = voltages.retrieve_voltage(self.pins[1]);
        self.inner.precompute(v0, v1, steady_state);
    }

    fn current(&self, pin_index: usize, _steady_state: bool) -> f64 {
        self.inner.current() * if pin_index == 0 { 1.0 } else { -1.0 }
    }

    fn gradient(&self, pin_index_ref: usize, pin_index: usize, steady_state: bool) -> f64 {
        self.inner.gradient(steady_state)
            * if pin_index_ref == 0 { 1.0 } else { -1.0 }
            * if pin_index == 1 { 1.0 } else { -1.0 }
    }
}
