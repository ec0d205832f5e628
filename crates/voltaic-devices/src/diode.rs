//! Junction diode, including anti-parallel pairs for clipping stages.

use voltaic_core::{Component, Pin, VoltageView};

/// Shockley model parameters.
#[derive(Debug, Clone, Copy)]
pub struct DiodeParams {
    /// Saturation current (A).
    pub is: f64,
    /// Emission coefficient.
    pub n: f64,
    /// Thermal voltage (V).
    pub vt: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self {
            is: 1e-14,
            n: 1.24,
            vt: 26e-3,
        }
    }
}

/// Shockley law with polarity coefficients.
///
/// `direct` counts junctions conducting when pin 1 sits above pin 0,
/// `indirect` junctions mounted the other way round; `(1, 1)` models the
/// anti-parallel pair of a symmetric clipper.
#[derive(Debug, Clone, Copy)]
struct DiodeModel {
    is: f64,
    n: f64,
    vt: f64,
    direct: i8,
    indirect: i8,
    /// exp((V1 - V0) / (N * Vt)), refreshed by precompute.
    e: f64,
}

impl DiodeModel {
    fn new(params: DiodeParams, direct: i8, indirect: i8) -> Self {
        Self {
            is: params.is,
            n: params.n,
            vt: params.vt,
            direct,
            indirect,
            e: 0.0,
        }
    }

    fn precompute(&mut self, v0: f64, v1: f64) {
        self.e = ((v1 - v0) / (self.n * self.vt)).exp();
    }

    fn current(&self) -> f64 {
        let direct = f64::from(self.direct);
        let indirect = f64::from(self.indirect);
        self.is * (direct * (self.e - 1.0) - indirect * (1.0 / self.e - 1.0))
    }

    fn gradient(&self) -> f64 {
        let direct = f64::from(self.direct);
        let indirect = f64::from(self.indirect);
        self.is / (self.n * self.vt) * (direct * self.e + indirect / self.e)
    }
}

/// Diode component.
///
/// In the [`forward`](Diode::forward) orientation the device conducts when
/// pin 1 sits above pin 0 and delivers the conducted current into pin 0.
pub struct Diode {
    inner: DiodeModel,
    pins: Vec<Pin>,
}

impl Diode {
    pub fn new(params: DiodeParams, direct: i8, indirect: i8) -> Self {
        Self {
            inner: DiodeModel::new(params, direct, indirect),
            pins: Vec::new(),
        }
    }

    /// Single junction.
    pub fn forward(params: DiodeParams) -> Self {
        Self::new(params, 1, 0)
    }

    /// Anti-parallel pair, as found in symmetric clipping stages.
    pub fn antiparallel(params: DiodeParams) -> Self {
        Self::new(params, 1, 1)
    }
}

impl Component for Diode {
    fn set_pins(&mut self, pins: Vec<Pin>) {
        self.pins = pins;
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn precompute(&mut self, voltages: &dyn VoltageView, _steady_state: bool) {
        let v0 = voltages.retrieve_voltage(self.pins[0]);
        let v1 = voltages.retrieve_voltage(self.pins[1]);
        self.inner.precompute(v0, v1);
    }

    fn current(&self, pin_index: usize, _steady_state: bool) -> f64 {
        self.inner.current() * if pin_index == 0 { 1.0 } else { -1.0 }
    }

    fn gradient(&self, pin_index_ref: usize, pin_index: usize, _steady_state: bool) -> f64 {
        self.inner.gradient()
            * if pin_index_ref == 0 { 1.0 } else { -1.0 }
            * if pin_index == 1 { 1.0 } else { -1.0 }
    }
}
