//! Voltaic: an audio-rate nodal circuit simulator.
//!
//! Feed it a SPICE-style netlist and it produces, sample by sample, the
//! voltages at the circuit's nodes in response to time-varying inputs. The
//! heavy lifting lives in the member crates; this crate re-exports them and
//! offers the one-call path from netlist text to a running filter.
//!
//! ```
//! use voltaic::from_netlist;
//!
//! let mut filter = from_netlist("vcc ref 0 5\nr0 mid 0 100\nr1 mid ref 100\n").unwrap();
//! filter.set_input_sampling_rate(48000);
//! filter.set_output_sampling_rate(48000);
//! filter.process(1).unwrap();
//!
//! assert!((filter.output_array(0)[0] - 2.5).abs() < 1e-6);
//! ```

pub use voltaic_core::{Circuit, Component, Error, Pin, PinType, Result, VoltageView};
pub use voltaic_devices as devices;
pub use voltaic_parser::{self as netlist, NetlistAst, build_circuit, parse};
pub use voltaic_solver::{CircuitFilter, ConvergenceCriteria, NewtonRaphson};

/// Parses a netlist, lowers it and wraps it in a sample driver.
///
/// The returned filter still needs its sampling rates before the first
/// `process` call.
pub fn from_netlist(source: &str) -> voltaic_parser::Result<CircuitFilter> {
    let ast = parse(source)?;
    let circuit = build_circuit(&ast)?;
    Ok(CircuitFilter::new(circuit))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn netlist_to_samples() {
        let mut filter = from_netlist("vin in 0 ac 1\nr0 out in 1k\nr1 out 0 1k\n").unwrap();
        filter.set_input_sampling_rate(44100);
        filter.set_output_sampling_rate(44100);

        let input = [1.0, 0.5, -1.0];
        filter.set_input(0, &input).unwrap();
        filter.process(input.len()).unwrap();

        for (n, &sample) in filter.output_array(0).iter().enumerate() {
            assert_relative_eq!(sample, input[n] / 2.0, max_relative = 1e-6);
        }
    }

    #[test]
    fn parse_errors_surface() {
        assert!(from_netlist("r1 a b\n").is_err());
        assert!(from_netlist("vcc a b 5\n").is_err());
    }
}
