//! Damped Newton-Raphson iteration over the dynamic pins.

use nalgebra::{DMatrix, DVector};
use voltaic_core::Circuit;

/// Iteration limit and tolerances for the Newton-Raphson loop.
///
/// The defaults match the behavior the device models were tuned against;
/// they are fields rather than constants so convergence edge cases can be
/// probed in tests.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceCriteria {
    /// Iteration cap per solve; the last iterate is kept when it is reached.
    pub max_iterations: usize,
    /// Convergence threshold on both the residual and the update.
    pub tolerance: f64,
    /// Infinity-norm clamp applied to every Newton step.
    pub max_step: f64,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-8,
            max_step: 1e-1,
        }
    }
}

/// Newton-Raphson solver over a circuit's dynamic voltage vector.
///
/// The residual, Jacobian and step buffers are sized once at construction;
/// `solve` allocates nothing beyond the factorization itself.
pub struct NewtonRaphson {
    criteria: ConvergenceCriteria,
    eqs: DVector<f64>,
    jacobian: DMatrix<f64>,
}

impl NewtonRaphson {
    pub fn new(nb_dynamic_pins: usize) -> Self {
        Self::with_criteria(nb_dynamic_pins, ConvergenceCriteria::default())
    }

    pub fn with_criteria(nb_dynamic_pins: usize, criteria: ConvergenceCriteria) -> Self {
        Self {
            criteria,
            eqs: DVector::zeros(nb_dynamic_pins),
            jacobian: DMatrix::zeros(nb_dynamic_pins, nb_dynamic_pins),
        }
    }

    pub fn criteria(&self) -> &ConvergenceCriteria {
        &self.criteria
    }

    /// Iterates until convergence or the iteration cap, whichever comes
    /// first, and returns the number of updates applied.
    ///
    /// Non-convergence is not an error: the last iterate stays in the
    /// circuit and processing continues, trading transient accuracy for
    /// real-time determinism.
    pub fn solve(&mut self, circuit: &mut Circuit, steady_state: bool) -> usize {
        let mut iteration = 0;
        while iteration < self.criteria.max_iterations && !self.iterate(circuit, steady_state) {
            iteration += 1;
        }
        log::trace!("newton: {iteration} iterations (steady_state: {steady_state})");
        iteration
    }

    fn iterate(&mut self, circuit: &mut Circuit, steady_state: bool) -> bool {
        if self.eqs.is_empty() {
            return true;
        }

        circuit.precompute(steady_state);
        circuit.assemble_equations(&mut self.eqs, &mut self.jacobian, steady_state);

        if below(&self.eqs, self.criteria.tolerance) {
            return true;
        }

        let mut delta = match self.jacobian.clone().col_piv_qr().solve(&self.eqs) {
            Some(delta) => delta,
            // Singular Jacobian at a cutoff or saturation knee: take the
            // least-squares step and let the clamp below absorb it.
            None => self.least_squares_step(),
        };

        if below(&delta, self.criteria.tolerance) {
            return true;
        }

        let largest = infinity_norm(&delta);
        if largest > self.criteria.max_step {
            delta *= self.criteria.max_step / largest;
        }

        circuit.step_dynamic_state(&delta);
        false
    }

    fn least_squares_step(&self) -> DVector<f64> {
        self.jacobian
            .clone()
            .try_svd(true, true, f64::EPSILON, 1000)
            .and_then(|svd| svd.solve(&self.eqs, self.criteria.tolerance).ok())
            .unwrap_or_else(|| DVector::zeros(self.eqs.len()))
    }
}

/// True when every entry is strictly inside the tolerance band. A NaN entry
/// is never inside, so a poisoned residual keeps iterating instead of being
/// declared converged.
fn below(values: &DVector<f64>, tolerance: f64) -> bool {
    values.iter().all(|value| value.abs() < tolerance)
}

fn infinity_norm(values: &DVector<f64>) -> f64 {
    values.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()))
}
