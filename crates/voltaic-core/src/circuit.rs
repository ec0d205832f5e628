//! The circuit model: component ownership, pin adjacency and voltage state.

use nalgebra::{DMatrix, DVector};

use crate::component::{Component, VoltageView};
use crate::error::{Error, Result};
use crate::pin::{Pin, PinType};

/// The three dense voltage vectors of a circuit.
///
/// Kept as its own struct so the circuit can hand components a read view of
/// the voltages while iterating over them mutably.
#[derive(Debug, Clone)]
struct VoltageState {
    static_state: DVector<f64>,
    input_state: DVector<f64>,
    dynamic_state: DVector<f64>,
}

impl VoltageView for VoltageState {
    fn retrieve_voltage(&self, pin: Pin) -> f64 {
        match pin.pin_type {
            PinType::Static => self.static_state[pin.index],
            PinType::Input => self.input_state[pin.index],
            PinType::Dynamic => self.dynamic_state[pin.index],
        }
    }
}

/// Registrar handed to [`Component::update_model`] so constraint devices can
/// claim a dynamic row for their own equation.
pub struct EquationClaims<'a> {
    component: usize,
    slots: &'a mut [Option<(usize, usize)>],
}

impl EquationClaims<'_> {
    /// Replaces the Kirchhoff residual at `row` with equation `eq_id` of the
    /// registering component. At most one component may claim a given row.
    pub fn set_custom_equation(&mut self, row: usize, eq_id: usize) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(row)
            .ok_or(Error::PinOutOfRange {
                pin_type: PinType::Dynamic,
                index: row,
                count,
            })?;
        if slot.is_some() {
            return Err(Error::DuplicateClaim { row });
        }
        *slot = Some((self.component, eq_id));
        Ok(())
    }
}

/// A lowered circuit: owns its components and everything the solver needs
/// to assemble the residual vector and Jacobian over the dynamic pins.
///
/// Components are appended before the circuit is frozen and iterated in
/// insertion order ever after, which keeps the assembly deterministic and
/// the output streams bit-reproducible across runs.
pub struct Circuit {
    nb_dynamic_pins: usize,
    nb_static_pins: usize,
    nb_input_pins: usize,

    components: Vec<Box<dyn Component>>,
    /// For each dynamic pin, every (component, device-local pin) touching it.
    dynamic_pins: Vec<Vec<(usize, usize)>>,
    /// For each dynamic pin, the (component, equation id) that replaces its
    /// Kirchhoff residual, if any component claimed the row.
    dynamic_pin_equations: Vec<Option<(usize, usize)>>,

    state: VoltageState,

    static_pin_names: Vec<String>,
    input_pin_names: Vec<String>,
    dynamic_pin_names: Vec<String>,

    frozen: bool,
}

impl Circuit {
    /// Creates an empty circuit with the declared pin counts.
    ///
    /// Static pin 0 is ground and stays at 0 V whatever state is supplied
    /// later.
    pub fn new(nb_dynamic_pins: usize, nb_static_pins: usize, nb_input_pins: usize) -> Self {
        Self {
            nb_dynamic_pins,
            nb_static_pins,
            nb_input_pins,
            components: Vec::new(),
            dynamic_pins: vec![Vec::new(); nb_dynamic_pins],
            dynamic_pin_equations: vec![None; nb_dynamic_pins],
            state: VoltageState {
                static_state: DVector::zeros(nb_static_pins),
                input_state: DVector::zeros(nb_input_pins),
                dynamic_state: DVector::zeros(nb_dynamic_pins),
            },
            static_pin_names: vec![String::new(); nb_static_pins],
            input_pin_names: vec![String::new(); nb_input_pins],
            dynamic_pin_names: vec![String::new(); nb_dynamic_pins],
            frozen: false,
        }
    }

    fn class_size(&self, pin_type: PinType) -> usize {
        match pin_type {
            PinType::Static => self.nb_static_pins,
            PinType::Input => self.nb_input_pins,
            PinType::Dynamic => self.nb_dynamic_pins,
        }
    }

    fn check_pin(&self, pin: Pin) -> Result<()> {
        let count = self.class_size(pin.pin_type);
        if pin.index >= count {
            return Err(Error::PinOutOfRange {
                pin_type: pin.pin_type,
                index: pin.index,
                count,
            });
        }
        Ok(())
    }

    /// Transfers a component into the circuit, wired to `pins` in the
    /// device's local pin order.
    ///
    /// Records the dynamic-pin adjacency used by the residual assembly and
    /// lets the component claim custom-equation rows. Must be called before
    /// [`freeze`](Circuit::freeze).
    pub fn add_component(&mut self, mut component: Box<dyn Component>, pins: Vec<Pin>) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        for pin in &pins {
            self.check_pin(*pin)?;
        }

        let index = self.components.len();
        component.set_pins(pins);
        let mut claims = EquationClaims {
            component: index,
            slots: &mut self.dynamic_pin_equations,
        };
        component.update_model(&mut claims)?;

        for (local, pin) in component.pins().iter().enumerate() {
            if pin.is_dynamic() {
                self.dynamic_pins[pin.index].push((index, local));
            }
        }
        self.components.push(component);
        Ok(())
    }

    /// Freezes the component set; called by the driver at setup.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn nb_dynamic_pins(&self) -> usize {
        self.nb_dynamic_pins
    }

    pub fn nb_static_pins(&self) -> usize {
        self.nb_static_pins
    }

    pub fn nb_input_pins(&self) -> usize {
        self.nb_input_pins
    }

    pub fn nb_components(&self) -> usize {
        self.components.len()
    }

    /// Installs the supply voltages. Index 0 is ground and is pinned back to
    /// 0 V regardless of the supplied value.
    pub fn set_static_state(&mut self, static_state: DVector<f64>) -> Result<()> {
        if static_state.len() != self.nb_static_pins {
            return Err(Error::DimensionMismatch {
                expected: self.nb_static_pins,
                actual: static_state.len(),
            });
        }
        self.state.static_state = static_state;
        if self.nb_static_pins > 0 {
            self.state.static_state[0] = 0.0;
        }
        Ok(())
    }

    pub fn static_state(&self) -> &DVector<f64> {
        &self.state.static_state
    }

    pub fn input_state(&self) -> &DVector<f64> {
        &self.state.input_state
    }

    pub fn dynamic_state(&self) -> &DVector<f64> {
        &self.state.dynamic_state
    }

    /// Writes one input-port sample; called by the driver once per sample.
    pub fn set_input_voltage(&mut self, index: usize, voltage: f64) {
        self.state.input_state[index] = voltage;
    }

    /// Applies a damped Newton update: `V_dynamic -= delta`.
    pub fn step_dynamic_state(&mut self, delta: &DVector<f64>) {
        self.state.dynamic_state -= delta;
    }

    pub fn set_pin_name(&mut self, pin: Pin, name: impl Into<String>) -> Result<()> {
        self.check_pin(pin)?;
        let names = match pin.pin_type {
            PinType::Static => &mut self.static_pin_names,
            PinType::Input => &mut self.input_pin_names,
            PinType::Dynamic => &mut self.dynamic_pin_names,
        };
        names[pin.index] = name.into();
        Ok(())
    }

    pub fn static_pin_name(&self, index: usize) -> Result<&str> {
        self.check_pin(Pin::fixed(index))?;
        Ok(&self.static_pin_names[index])
    }

    pub fn input_pin_name(&self, index: usize) -> Result<&str> {
        self.check_pin(Pin::input(index))?;
        Ok(&self.input_pin_names[index])
    }

    pub fn dynamic_pin_name(&self, index: usize) -> Result<&str> {
        self.check_pin(Pin::dynamic(index))?;
        Ok(&self.dynamic_pin_names[index])
    }

    /// Refreshes every component's cached values for this iteration.
    pub fn precompute(&mut self, steady_state: bool) {
        let state = &self.state;
        for component in &mut self.components {
            component.precompute(state, steady_state);
        }
    }

    /// Re-discretizes every companion model for time increment `dt`, taking
    /// the present voltages as the operating point.
    pub fn update_steady_state(&mut self, dt: f64) {
        let state = &self.state;
        for component in &mut self.components {
            component.update_steady_state(state, dt);
        }
    }

    /// Commits every companion model one time step forward.
    pub fn update_state(&mut self) {
        let state = &self.state;
        for component in &mut self.components {
            component.update_state(state);
        }
    }

    /// Assembles the residual vector and Jacobian over the dynamic pins.
    ///
    /// Rows are filled in ascending dynamic-pin order; a row claimed by a
    /// custom equation is written by its component, every other row is the
    /// Kirchhoff current sum over the adjacency recorded at
    /// [`add_component`](Circuit::add_component).
    pub fn assemble_equations(
        &self,
        eqs: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
        steady_state: bool,
    ) {
        eqs.fill(0.0);
        jacobian.fill(0.0);

        for row in 0..self.nb_dynamic_pins {
            match self.dynamic_pin_equations[row] {
                Some((component, eq_id)) => {
                    self.components[component].add_equation(
                        row,
                        eq_id,
                        &self.state,
                        eqs,
                        jacobian,
                        steady_state,
                    );
                }
                None => self.assemble_kcl_row(row, eqs, jacobian, steady_state),
            }
        }
    }

    fn assemble_kcl_row(
        &self,
        row: usize,
        eqs: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
        steady_state: bool,
    ) {
        for &(index, local_pin) in &self.dynamic_pins[row] {
            let component = &self.components[index];
            eqs[row] += component.current(local_pin, steady_state);

            for (other, pin) in component.pins().iter().enumerate() {
                if pin.is_dynamic() {
                    jacobian[(row, pin.index)] +=
                        component.gradient(local_pin, other, steady_state);
                }
            }
        }
    }

    /// True when no component claimed row `row`.
    pub fn is_kcl_row(&self, row: usize) -> bool {
        self.dynamic_pin_equations[row].is_none()
    }

    pub fn num_parameters(&self) -> usize {
        self.components.iter().map(|c| c.num_parameters()).sum()
    }

    fn locate_parameter(&self, identifier: usize) -> Result<(usize, usize)> {
        let mut offset = identifier;
        for (index, component) in self.components.iter().enumerate() {
            let count = component.num_parameters();
            if offset < count {
                return Ok((index, offset));
            }
            offset -= count;
        }
        Err(Error::UnknownParameter { identifier })
    }

    pub fn parameter_name(&self, identifier: usize) -> Result<&'static str> {
        let (component, local) = self.locate_parameter(identifier)?;
        self.components[component].parameter_name(local)
    }

    pub fn parameter(&self, identifier: usize) -> Result<f64> {
        let (component, local) = self.locate_parameter(identifier)?;
        self.components[component].parameter(local)
    }

    pub fn set_parameter(&mut self, identifier: usize, value: f64) -> Result<()> {
        let (component, local) = self.locate_parameter(identifier)?;
        self.components[component].set_parameter(local, value)
    }
}

impl VoltageView for Circuit {
    fn retrieve_voltage(&self, pin: Pin) -> f64 {
        self.state.retrieve_voltage(pin)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;

    use super::*;

    /// Minimal two-pin ohmic test double.
    struct TestConductance {
        g: f64,
        pins: Vec<Pin>,
        v0: f64,
        v1: f64,
    }

    impl TestConductance {
        fn boxed(g: f64) -> Box<Self> {
            Box::new(Self {
                g,
                pins: Vec::new(),
                v0: 0.0,
                v1: 0.0,
            })
        }
    }

    impl Component for TestConductance {
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
            (self.v1 - self.v0) * self.g * if pin_index == 0 { 1.0 } else { -1.0 }
        }

        fn gradient(&self, pin_index_ref: usize, pin_index: usize, _steady_state: bool) -> f64 {
            self.g
                * if pin_index_ref == 0 { 1.0 } else { -1.0 }
                * if pin_index == 1 { 1.0 } else { -1.0 }
        }

        fn num_parameters(&self) -> usize {
            1
        }

        fn parameter_name(&self, identifier: usize) -> crate::Result<&'static str> {
            match identifier {
                0 => Ok("conductance"),
                _ => Err(Error::UnknownParameter { identifier }),
            }
        }

        fn parameter(&self, identifier: usize) -> crate::Result<f64> {
            match identifier {
                0 => Ok(self.g),
                _ => Err(Error::UnknownParameter { identifier }),
            }
        }

        fn set_parameter(&mut self, identifier: usize, value: f64) -> crate::Result<()> {
            match identifier {
                0 => {
                    self.g = value;
                    Ok(())
                }
                _ => Err(Error::UnknownParameter { identifier }),
            }
        }
    }

    /// Test double claiming a custom row.
    struct TestConstraint {
        pins: Vec<Pin>,
    }

    impl Component for TestConstraint {
        fn set_pins(&mut self, pins: Vec<Pin>) {
            self.pins = pins;
        }

        fn pins(&self) -> &[Pin] {
            &self.pins
        }

        fn update_model(&self, claims: &mut EquationClaims<'_>) -> crate::Result<()> {
            claims.set_custom_equation(self.pins[0].index, 0)
        }

        fn current(&self, _pin_index: usize, _steady_state: bool) -> f64 {
            0.0
        }

        fn gradient(&self, _pin_index_ref: usize, _pin_index: usize, _steady_state: bool) -> f64 {
            0.0
        }
    }

    #[test]
    fn pin_out_of_range_is_rejected() {
        let mut circuit = Circuit::new(1, 1, 0);
        let result = circuit.add_component(
            TestConductance::boxed(1.0),
            vec![Pin::fixed(0), Pin::dynamic(4)],
        );
        assert!(matches!(
            result,
            Err(Error::PinOutOfRange {
                pin_type: PinType::Dynamic,
                index: 4,
                count: 1
            })
        ));
    }

    #[test]
    fn frozen_circuit_rejects_components() {
        let mut circuit = Circuit::new(1, 1, 0);
        circuit.freeze();
        let result =
            circuit.add_component(TestConductance::boxed(1.0), vec![Pin::fixed(0), Pin::dynamic(0)]);
        assert!(matches!(result, Err(Error::Frozen)));
    }

    #[test]
    fn duplicate_claim_is_rejected() {
        let mut circuit = Circuit::new(1, 1, 0);
        circuit
            .add_component(
                Box::new(TestConstraint { pins: Vec::new() }),
                vec![Pin::dynamic(0)],
            )
            .unwrap();
        let result = circuit.add_component(
            Box::new(TestConstraint { pins: Vec::new() }),
            vec![Pin::dynamic(0)],
        );
        assert!(matches!(result, Err(Error::DuplicateClaim { row: 0 })));
        assert!(!circuit.is_kcl_row(0));
    }

    #[test]
    fn ground_stays_at_zero() {
        let mut circuit = Circuit::new(0, 2, 0);
        circuit.set_static_state(dvector![3.0, 5.0]).unwrap();
        assert_eq!(circuit.retrieve_voltage(Pin::GROUND), 0.0);
        assert_eq!(circuit.retrieve_voltage(Pin::fixed(1)), 5.0);
    }

    #[test]
    fn static_state_dimension_is_checked() {
        let mut circuit = Circuit::new(0, 2, 0);
        let result = circuit.set_static_state(dvector![0.0]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn kcl_row_assembly_sums_adjacent_components() {
        let mut circuit = Circuit::new(1, 2, 0);
        circuit.set_static_state(dvector![0.0, 1.0]).unwrap();
        circuit
            .add_component(TestConductance::boxed(0.5), vec![Pin::dynamic(0), Pin::fixed(1)])
            .unwrap();
        circuit
            .add_component(TestConductance::boxed(0.25), vec![Pin::dynamic(0), Pin::GROUND])
            .unwrap();

        circuit.precompute(false);
        let mut eqs = DVector::zeros(1);
        let mut jacobian = DMatrix::zeros(1, 1);
        circuit.assemble_equations(&mut eqs, &mut jacobian, false);

        // (1 - 0) * 0.5 + (0 - 0) * 0.25 into the dynamic pin
        assert_eq!(eqs[0], 0.5);
        // both conductances pull the diagonal towards -G
        assert_eq!(jacobian[(0, 0)], -0.75);
    }

    #[test]
    fn parameters_enumerate_across_components() {
        let mut circuit = Circuit::new(1, 1, 0);
        circuit
            .add_component(TestConductance::boxed(0.5), vec![Pin::dynamic(0), Pin::GROUND])
            .unwrap();
        circuit
            .add_component(TestConductance::boxed(0.125), vec![Pin::dynamic(0), Pin::GROUND])
            .unwrap();

        assert_eq!(circuit.num_parameters(), 2);
        assert_eq!(circuit.parameter(1).unwrap(), 0.125);
        circuit.set_parameter(1, 0.25).unwrap();
        assert_eq!(circuit.parameter(1).unwrap(), 0.25);
        assert!(matches!(
            circuit.parameter(2),
            Err(Error::UnknownParameter { identifier: 2 })
        ));
    }

    #[test]
    fn pin_names_round_trip() {
        let mut circuit = Circuit::new(1, 1, 1);
        circuit.set_pin_name(Pin::GROUND, "0").unwrap();
        circuit.set_pin_name(Pin::dynamic(0), "out").unwrap();
        circuit.set_pin_name(Pin::input(0), "in").unwrap();
        assert_eq!(circuit.static_pin_name(0).unwrap(), "0");
        assert_eq!(circuit.dynamic_pin_name(0).unwrap(), "out");
        assert_eq!(circuit.input_pin_name(0).unwrap(), "in");
        assert!(circuit.dynamic_pin_name(1).is_err());
    }
}
