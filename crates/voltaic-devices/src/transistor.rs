//! Bipolar junction transistor (Ebers-Moll).
//!
//! One primitive covers both polarities through a sign parameter; the NPN
//! and PNP adapters differ only in the sign handed to the model. Local pin
//! order is (base, collector, emitter).

use voltaic_core::{Component, Pin, VoltageView};

/// Ebers-Moll parameters.
#[derive(Debug, Clone, Copy)]
pub struct TransistorParams {
    /// Saturation current (A).
    pub is: f64,
    /// Thermal voltage (V).
    pub vt: f64,
    /// Emission coefficient, multiplies `vt`.
    pub ne: f64,
    /// Reverse beta.
    pub br: f64,
    /// Forward beta.
    pub bf: f64,
}

impl Default for TransistorParams {
    fn default() -> Self {
        Self {
            is: 1e-12,
            vt: 26e-3,
            ne: 1.0,
            br: 1.0,
            bf: 100.0,
        }
    }
}

/// Ebers-Moll junction currents, parameterized by polarity.
///
/// `sign` is +1 for NPN and -1 for PNP. The junction partials
/// (`ib_vbe` and friends) are derivatives with respect to the junction
/// voltages and are polarity-independent; the node-voltage Jacobian in the
/// adapter carries the polarity.
#[derive(Debug, Clone, Copy)]
struct TransistorModel {
    is: f64,
    /// Thermal voltage already scaled by the emission coefficient.
    vt: f64,
    br: f64,
    bf: f64,
    sign: f64,
    exp_vbe: f64,
    exp_vbc: f64,
}

impl TransistorModel {
    fn new(params: TransistorParams, sign: f64) -> Self {
        Self {
            is: params.is,
            vt: params.vt * params.ne,
            br: params.br,
            bf: params.bf,
            sign,
            exp_vbe: 0.0,
            exp_vbc: 0.0,
        }
    }

    fn precompute(&mut self, vb: f64, vc: f64, ve: f64) {
        self.exp_vbe = (self.sign * (vb - ve) / self.vt).exp();
        self.exp_vbc = (self.sign * (vb - vc) / self.vt).exp();
    }

    fn ib(&self) -> f64 {
        self.sign * self.is * ((self.exp_vbe - 1.0) / self.bf + (self.exp_vbc - 1.0) / self.br)
    }

    fn ic(&self) -> f64 {
        self.sign
            * self.is
            * ((self.exp_vbe - self.exp_vbc) - (self.exp_vbc - 1.0) / self.br)
    }

    fn ib_vbe(&self) -> f64 {
        self.is * self.exp_vbe / (self.vt * self.bf)
    }

    fn ib_vbc(&self) -> f64 {
        self.is * self.exp_vbc / (self.vt * self.br)
    }

    fn ic_vbe(&self) -> f64 {
        self.is * self.exp_vbe / self.vt
    }

    fn ic_vbc(&self) -> f64 {
        -self.is * (self.exp_vbc + self.exp_vbc / self.br) / self.vt
    }
}

/// Bipolar transistor, local pins (base, collector, emitter).
pub struct Transistor {
    inner: TransistorModel,
    pins: Vec<Pin>,
}

impl Transistor {
    pub fn npn(params: TransistorParams) -> Self {
        Self {
            inner: TransistorModel::new(params, 1.0),
            pins: Vec::new(),
        }
    }

    pub fn pnp(params: TransistorParams) -> Self {
        Self {
            inner: TransistorModel::new(params, -1.0),
            pins: Vec::new(),
        }
    }

    pub fn is_npn(&self) -> bool {
        self.inner.sign > 0.0
    }
}

impl Component for Transistor {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn precompute(&mut self, voltages: &dyn VoltageView, _steady_state: bool) {
        let vb = voltages.retrieve_voltage(self.pins[0]);
        let vc = voltages.retrieve_voltage(self.pins[1]);
        let ve = voltages.retrieve_voltage(self.pins[2]);
        self.inner.precompute(vb, vc, ve);
    }

    fn current(&self, pin_index: usize, _steady_state: bool) -> f64 {
        let s = self.inner.sign;
        match pin_index {
            0 => -s * self.inner.ib(),
            1 => -s * self.inner.ic(),
            _ => s * (self.inner.ib() + self.inner.ic()),
        }
    }

    fn gradient(&self, pin_index_ref: usize, pin_index: usize, _steady_state: bool) -> f64 {
        let m = &self.inner;
        let s = m.sign;
        match (pin_index_ref, pin_index) {
            (0, 0) => -s * (m.ib_vbe() + m.ib_vbc()),
            (0, 1) => s * m.ib_vbc(),
            (0, 2) => s * m.ib_vbe(),
            (1, 0) => -s * (m.ic_vbe() + m.ic_vbc()),
            (1, 1) => s * m.ic_vbc(),
            (1, 2) => s * m.ic_vbe(),
            (2, 0) => s * (m.ib_vbe() + m.ib_vbc() + m.ic_vbe() + m.ic_vbc()),
            (2, 1) => -s * (m.ib_vbc() + m.ic_vbc()),
            _ => -s * (m.ib_vbe() + m.ic_vbe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use voltaic_core::Component;

    use super::*;
    use crate::testing::Voltages;

    fn at_operating_point(q: &mut Transistor, vb: f64, vc: f64, ve: f64) {
        let voltages = Voltages {
            dynamic: vec![vb, vc, ve],
            ..Default::default()
        };
        q.set_pins(vec![Pin::dynamic(0), Pin::dynamic(1), Pin::dynamic(2)]);
        q.precompute(&voltages, false);
    }

    #[test]
    fn npn_forward_active_beta() {
        let params = TransistorParams::default();
        let mut q = Transistor::npn(params);
        at_operating_point(&mut q, 0.65, 5.0, 0.0);

        let ib = -q.current(0, false);
        let ic = -q.current(1, false);
        // with the base-collector junction off, ic/ib approaches bf
        assert_relative_eq!(ic / ib, params.bf, max_relative = 1e-6);
        // emitter carries the sum back out
        assert_relative_eq!(q.current(2, false), ib + ic, max_relative = 1e-12);
    }

    #[test]
    fn pnp_matches_npn_under_mirrored_bias() {
        // the polarity sign flips both the junction orientation and the
        // node-current directions, so mirrored bias reproduces the same
        // node currents
        let params = TransistorParams::default();
        let mut npn = Transistor::npn(params);
        let mut pnp = Transistor::pnp(params);
        at_operating_point(&mut npn, 0.65, 5.0, 0.0);
        at_operating_point(&mut pnp, -0.65, -5.0, 0.0);

        for pin in 0..3 {
            assert_relative_eq!(
                pnp.current(pin, false),
                npn.current(pin, false),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn currents_sum_to_zero() {
        let mut q = Transistor::npn(TransistorParams::default());
        at_operating_point(&mut q, 0.7, 0.3, 0.0);
        let total: f64 = (0..3).map(|pin| q.current(pin, false)).sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let params = TransistorParams::default();
        let step = 1e-9;
        let base = [0.62, 2.5, 0.05];

        for polarity in [1.0f64, -1.0] {
            let mut q = if polarity > 0.0 {
                Transistor::npn(params)
            } else {
                Transistor::pnp(params)
            };
            let v = if polarity > 0.0 {
                base
            } else {
                [-base[0], -base[1], -base[2]]
            };
            at_operating_point(&mut q, v[0], v[1], v[2]);
            let gradients: Vec<f64> = (0..3)
                .flat_map(|r| (0..3).map(move |p| (r, p)))
                .map(|(r, p)| q.gradient(r, p, false))
                .collect();

            for pin in 0..3 {
                let mut bumped = v;
                bumped[pin] += step;
                let mut probe = if polarity > 0.0 {
                    Transistor::npn(params)
                } else {
                    Transistor::pnp(params)
                };
                at_operating_point(&mut probe, bumped[0], bumped[1], bumped[2]);
                for row in 0..3 {
                    let numeric = (probe.current(row, false) - q.current(row, false)) / step;
                    let analytic = gradients[row * 3 + pin];
                    assert_relative_eq!(analytic, numeric, max_relative = 1e-4, epsilon = 1e-12);
                }
            }
        }
    }
}
