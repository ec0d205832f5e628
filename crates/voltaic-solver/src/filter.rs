//! Per-sample driver: input loading, solving, companion committal, output
//! emission, and the steady-state warm-up ramp.

use voltaic_core::{Circuit, Error, Pin, PinType, Result};

use crate::newton::{ConvergenceCriteria, NewtonRaphson};

/// Number of steps of the static-state ramp run on first setup.
pub const DEFAULT_WARMUP_STEPS: usize = 10;

/// Audio-rate driver around a lowered circuit.
///
/// Owns per-port input and output blocks; the host writes a block of input
/// samples, calls [`process`](CircuitFilter::process), and reads the output
/// blocks back. Every dynamic pin is an output port, in dynamic-pin order.
///
/// The solver state persists across samples, so each sample warm-starts
/// from the previous solution and converges in a handful of iterations.
pub struct CircuitFilter {
    circuit: Circuit,
    solver: NewtonRaphson,
    input_sampling_rate: usize,
    output_sampling_rate: usize,
    warmup_steps: usize,
    initialized: bool,
    inputs: Vec<Vec<f64>>,
    outputs: Vec<Vec<f64>>,
}

impl CircuitFilter {
    pub fn new(circuit: Circuit) -> Self {
        Self::with_criteria(circuit, ConvergenceCriteria::default())
    }

    pub fn with_criteria(circuit: Circuit, criteria: ConvergenceCriteria) -> Self {
        let solver = NewtonRaphson::with_criteria(circuit.nb_dynamic_pins(), criteria);
        let inputs = vec![Vec::new(); circuit.nb_input_pins()];
        let outputs = vec![Vec::new(); circuit.nb_dynamic_pins()];
        Self {
            circuit,
            solver,
            input_sampling_rate: 0,
            output_sampling_rate: 0,
            warmup_steps: DEFAULT_WARMUP_STEPS,
            initialized: false,
            inputs,
            outputs,
        }
    }

    pub fn set_input_sampling_rate(&mut self, rate: usize) {
        self.input_sampling_rate = rate;
    }

    pub fn set_output_sampling_rate(&mut self, rate: usize) {
        self.output_sampling_rate = rate;
    }

    /// Overrides the warm-up ramp length (minimum 1 step).
    pub fn set_warmup_steps(&mut self, steps: usize) {
        self.warmup_steps = steps.max(1);
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn nb_static_pins(&self) -> usize {
        self.circuit.nb_static_pins()
    }

    pub fn nb_input_pins(&self) -> usize {
        self.circuit.nb_input_pins()
    }

    pub fn nb_dynamic_pins(&self) -> usize {
        self.circuit.nb_dynamic_pins()
    }

    pub fn nb_components(&self) -> usize {
        self.circuit.nb_components()
    }

    pub fn static_pin_name(&self, index: usize) -> Result<&str> {
        self.circuit.static_pin_name(index)
    }

    pub fn input_pin_name(&self, index: usize) -> Result<&str> {
        self.circuit.input_pin_name(index)
    }

    pub fn dynamic_pin_name(&self, index: usize) -> Result<&str> {
        self.circuit.dynamic_pin_name(index)
    }

    pub fn num_parameters(&self) -> usize {
        self.circuit.num_parameters()
    }

    pub fn parameter_name(&self, identifier: usize) -> Result<&'static str> {
        self.circuit.parameter_name(identifier)
    }

    pub fn parameter(&self, identifier: usize) -> Result<f64> {
        self.circuit.parameter(identifier)
    }

    pub fn set_parameter(&mut self, identifier: usize, value: f64) -> Result<()> {
        self.circuit.set_parameter(identifier, value)
    }

    /// Freezes the circuit and ramps it to its DC operating point.
    ///
    /// The caller's static state is scaled up in `warmup_steps` stages, each
    /// solved at steady state, which walks the Newton iteration past supply
    /// jumps that diverge from a cold zero guess. Runs once; later calls
    /// only re-validate the sampling rates.
    pub fn setup(&mut self) -> Result<()> {
        if self.input_sampling_rate == 0 || self.output_sampling_rate == 0 {
            return Err(Error::SamplingRateUnset);
        }
        if self.input_sampling_rate != self.output_sampling_rate {
            return Err(Error::SamplingRateMismatch {
                input: self.input_sampling_rate,
                output: self.output_sampling_rate,
            });
        }
        if self.initialized {
            return Ok(());
        }

        self.circuit.freeze();
        let dt = 1.0 / self.input_sampling_rate as f64;
        let target = self.circuit.static_state().clone();
        for step in 0..self.warmup_steps {
            let scale = (step + 1) as f64 / self.warmup_steps as f64;
            self.circuit.set_static_state(&target * scale)?;
            self.settle(dt);
        }
        self.circuit.set_static_state(target)?;
        log::debug!(
            "setup: {} dynamic pins settled after {} warmup steps",
            self.circuit.nb_dynamic_pins(),
            self.warmup_steps
        );

        self.initialized = true;
        Ok(())
    }

    /// One steady-state stage: re-discretize, solve the DC point, then
    /// re-discretize so the companion sources hold the converged voltages.
    fn settle(&mut self, dt: f64) {
        self.circuit.update_steady_state(dt);
        self.solver.solve(&mut self.circuit, true);
        self.circuit.update_steady_state(dt);
    }

    /// Installs a block of samples on input port `port`.
    pub fn set_input(&mut self, port: usize, samples: &[f64]) -> Result<()> {
        let count = self.inputs.len();
        let buffer = self.inputs.get_mut(port).ok_or(Error::PinOutOfRange {
            pin_type: PinType::Input,
            index: port,
            count,
        })?;
        buffer.clear();
        buffer.extend_from_slice(samples);
        Ok(())
    }

    /// Runs the per-sample loop `size` times.
    ///
    /// Each sample loads the input ports, solves the dynamic voltages,
    /// commits every companion state one step forward and appends the
    /// dynamic voltages to the output blocks.
    pub fn process(&mut self, size: usize) -> Result<()> {
        if !self.initialized {
            self.setup()?;
        }
        for input in &self.inputs {
            if input.len() < size {
                return Err(Error::DimensionMismatch {
                    expected: size,
                    actual: input.len(),
                });
            }
        }
        for output in &mut self.outputs {
            output.clear();
        }

        for n in 0..size {
            for port in 0..self.inputs.len() {
                let sample = self.inputs[port][n];
                self.circuit.set_input_voltage(port, sample);
            }

            self.solver.solve(&mut self.circuit, false);
            self.circuit.update_state();

            for (port, output) in self.outputs.iter_mut().enumerate() {
                output.push(self.circuit.dynamic_state()[port]);
            }
        }
        Ok(())
    }

    /// The most recent block produced on output port `port`.
    pub fn output_array(&self, port: usize) -> &[f64] {
        &self.outputs[port]
    }

    /// Voltage of a pin at the end of the last processed sample.
    pub fn retrieve_voltage(&self, pin: Pin) -> f64 {
        use voltaic_core::VoltageView;
        self.circuit.retrieve_voltage(pin)
    }
}
