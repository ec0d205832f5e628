//! Constraint devices: ideal op-amp and VCVS (E element).
//!
//! These impose equations instead of injecting current. Each claims the
//! dynamic row of its output pin and writes its own residual and Jacobian
//! line there; `current` and `gradient` stay zero so the claimed pins take
//! no part in Kirchhoff summation.

use nalgebra::{DMatrix, DVector};
use voltaic_core::{Component, EquationClaims, Error, Pin, Result, VoltageView};

// ────────────────────── Ideal op-amp ──────────────────────

/// Ideal operational amplifier, local pins (in+, in-, out).
///
/// Infinite open-loop gain collapses to the constraint `V(in+) = V(in-)`;
/// the output pin delivers whatever current the constraint demands.
pub struct OpAmp {
    pins: Vec<Pin>,
}

impl OpAmp {
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }
}

impl Default for OpAmp {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for OpAmp {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn update_model(&self, claims: &mut EquationClaims<'_>) -> Result<()> {
        let out = self.pins[2];
        if !out.is_dynamic() {
            return Err(Error::StaticConstraint { terminal: "output" });
        }
        claims.set_custom_equation(out.index, 0)
    }

    fn current(&self, _pin_index: usize, _steady_state: bool) -> f64 {
        0.0
    }

    fn gradient(&self, _pin_index_ref: usize, _pin_index: usize, _steady_state: bool) -> f64 {
        0.0
    }

    fn add_equation(
        &self,
        eq_index: usize,
        _eq_id: usize,
        voltages: &dyn VoltageView,
        eqs: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
        _steady_state: bool,
    ) {
        eqs[eq_index] =
            voltages.retrieve_voltage(self.pins[1]) - voltages.retrieve_voltage(self.pins[0]);
        if self.pins[0].is_dynamic() {
            jacobian[(eq_index, self.pins[0].index)] -= 1.0;
        }
        if self.pins[1].is_dynamic() {
            jacobian[(eq_index, self.pins[1].index)] += 1.0;
        }
    }
}

// ────────────────────── VCVS (E element) ──────────────────────

/// Voltage-controlled voltage source, local pins (in+, in-, out+, out-).
///
/// Imposes `gain * (V(in+) - V(in-)) = V(out+) - V(out-)` on the dynamic
/// row of `out+`.
pub struct Vcvs {
    gain: f64,
    pins: Vec<Pin>,
}

impl Vcvs {
    pub fn new(gain: f64) -> Self {
        Self {
            gain,
            pins: Vec::new(),
        }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Component for Vcvs {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn update_model(&self, claims: &mut EquationClaims<'_>) -> Result<()> {
        let out = self.pins[2];
        if !out.is_dynamic() {
            return Err(Error::StaticConstraint { terminal: "out+" });
        }
        claims.set_custom_equation(out.index, 0)
    }

    fn current(&self, _pin_index: usize, _steady_state: bool) -> f64 {
        0.0
    }

    fn gradient(&self, _pin_index_ref: usize, _pin_index: usize, _steady_state: bool) -> f64 {
        0.0
    }

    fn add_equation(
        &self,
        eq_index: usize,
        _eq_id: usize,
        voltages: &dyn VoltageView,
        eqs: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
        _steady_state: bool,
    ) {
        let v_in = voltages.retrieve_voltage(self.pins[0]) - voltages.retrieve_voltage(self.pins[1]);
        let v_out =
            voltages.retrieve_voltage(self.pins[2]) - voltages.retrieve_voltage(self.pins[3]);
        eqs[eq_index] = self.gain * v_in - v_out;

        if self.pins[0].is_dynamic() {
            jacobian[(eq_index, self.pins[0].index)] += self.gain;
        }
        if self.pins[1].is_dynamic() {
            jacobian[(eq_index, self.pins[1].index)] -= self.gain;
        }
        if self.pins[2].is_dynamic() {
            jacobian[(eq_index, self.pins[2].index)] -= 1.0;
        }
        if self.pins[3].is_dynamic() {
            jacobian[(eq_index, self.pins[3].index)] += 1.0;
        }
    }
}
