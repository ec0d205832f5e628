//! The contract every placed device fulfils towards the solver.

use nalgebra::{DMatrix, DVector};

use crate::circuit::EquationClaims;
use crate::error::{Error, Result};
use crate::pin::Pin;

/// Read access to the three voltage vectors, keyed by pin reference.
///
/// Components never hold a reference back to their owning circuit; the
/// current view is handed to them whenever they need voltages. This keeps
/// ownership acyclic and teardown order irrelevant.
pub trait VoltageView {
    /// Constant-time lookup of the voltage at `pin`.
    fn retrieve_voltage(&self, pin: Pin) -> f64;
}

/// A placed device: a companion-model primitive bound to a pin list.
///
/// Local pin numbering is device-specific (a diode's pin 0 is not a
/// transistor's pin 0); the circuit translates local pins to rows through
/// the adjacency it records at [`Circuit::add_component`].
///
/// Within one solver iteration, [`precompute`](Component::precompute) runs
/// for every component before any [`current`](Component::current) or
/// [`gradient`](Component::gradient) call, so implementations cache the
/// voltages and exponentials they need there.
///
/// [`Circuit::add_component`]: crate::circuit::Circuit::add_component
pub trait Component {
    /// Stores the pin references assigned by the circuit.
    fn set_pins(&mut self, pins: Vec<Pin>);

    /// The pin references this component is connected to, in local order.
    fn pins(&self) -> &[Pin];

    /// Called once when the component joins a circuit, after
    /// [`set_pins`](Component::set_pins), so implementations may inspect
    /// their pin assignment. Constraint devices (op-amp, VCVS) claim their
    /// custom-equation row here.
    fn update_model(&self, _claims: &mut EquationClaims<'_>) -> Result<()> {
        Ok(())
    }

    /// Refreshes the discretized state for a new time increment and records
    /// the current voltages as the steady-state operating point.
    fn update_steady_state(&mut self, _voltages: &dyn VoltageView, _dt: f64) {}

    /// Commits the companion state after a converged sample.
    fn update_state(&mut self, _voltages: &dyn VoltageView) {}

    /// Caches everything `current`/`gradient` will ask for this iteration.
    fn precompute(&mut self, _voltages: &dyn VoltageView, _steady_state: bool) {}

    /// Current flowing from the component into the node at `pin_index`.
    fn current(&self, pin_index: usize, steady_state: bool) -> f64;

    /// Partial derivative of the `pin_index_ref` current with respect to the
    /// voltage at local pin `pin_index`.
    fn gradient(&self, pin_index_ref: usize, pin_index: usize, steady_state: bool) -> f64;

    /// Writes a substitute equation into row `eq_index` of the residual and
    /// Jacobian. Only called for components that claimed the row during
    /// [`update_model`](Component::update_model).
    fn add_equation(
        &self,
        _eq_index: usize,
        _eq_id: usize,
        _voltages: &dyn VoltageView,
        _eqs: &mut DVector<f64>,
        _jacobian: &mut DMatrix<f64>,
        _steady_state: bool,
    ) {
    }

    /// Number of runtime-tunable parameters this component exposes.
    fn num_parameters(&self) -> usize {
        0
    }

    fn parameter_name(&self, identifier: usize) -> Result<&'static str> {
        Err(Error::UnknownParameter { identifier })
    }

    fn parameter(&self, identifier: usize) -> Result<f64> {
        Err(Error::UnknownParameter { identifier })
    }

    fn set_parameter(&mut self, identifier: usize, _value: f64) -> Result<()> {
        Err(Error::UnknownParameter { identifier })
    }
}
