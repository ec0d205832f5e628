//! Full pipeline tests: netlist text through the parser, the lowering and
//! the sample driver.

use approx::assert_relative_eq;
use voltaic_parser::{build_circuit, parse};
use voltaic_solver::CircuitFilter;

const RATE: usize = 48000;

fn filter_from(netlist: &str) -> CircuitFilter {
    let ast = parse(netlist).unwrap();
    let circuit = build_circuit(&ast).unwrap();
    let mut filter = CircuitFilter::new(circuit);
    filter.set_input_sampling_rate(RATE);
    filter.set_output_sampling_rate(RATE);
    filter
}

#[test]
fn resistor_divider_netlist() {
    let mut filter = filter_from("vcc ref 0 5\nr0 mid 0 100\nr1 mid ref 100\n");
    assert_eq!(filter.nb_components(), 2);
    assert_eq!(filter.dynamic_pin_name(0).unwrap(), "mid");

    filter.process(1).unwrap();
    assert_relative_eq!(filter.output_array(0)[0], 2.5, max_relative = 1e-9);
}

#[test]
fn parallel_resistors_netlist() {
    let mut filter =
        filter_from("vin in 0 1\nr0 mid 0 100\nr1 mid in 400\nr2 in mid 400\n");
    filter.process(3).unwrap();
    for &sample in filter.output_array(0) {
        assert_relative_eq!(sample, 1.0 / 3.0, max_relative = 1e-5);
    }
}

#[test]
fn rc_lowpass_netlist_follows_the_analytic_step() {
    let mut filter = filter_from("vin in 0 ac 1\nr0 out in 1k\nc0 out 0 1m\n");
    let input = vec![1.0; 128];
    filter.set_input(0, &input).unwrap();
    filter.process(input.len()).unwrap();

    let dt = 1.0 / RATE as f64;
    for (n, &sample) in filter.output_array(0).iter().enumerate() {
        let expected = 1.0 - (-(n as f64 + 0.5) * dt).exp();
        assert_relative_eq!(sample, expected, max_relative = 1e-5);
    }
}

#[test]
fn rl_netlist_follows_the_analytic_step() {
    let mut filter = filter_from("vin in 0 ac 1\nr0 out 0 1k\nl0 out in 1k\n");
    let input = vec![1.0; 128];
    filter.set_input(0, &input).unwrap();
    filter.process(input.len()).unwrap();

    let dt = 1.0 / RATE as f64;
    for (n, &sample) in filter.output_array(0).iter().enumerate() {
        let expected = 1.0 - (-(n as f64 + 0.5) * dt).exp();
        assert_relative_eq!(sample, expected, max_relative = 1e-2);
    }
}

#[test]
fn diode_clipper_netlist_settles_at_the_junction_drop() {
    let mut filter = filter_from(
        "vcc ref 0 5\n\
         r1 out ref 1k\n\
         dclip 0 out dmod\n\
         .model dmod d(is=1e-14 n=1.24 vt=26m)\n",
    );
    filter.process(1).unwrap();
    assert_relative_eq!(filter.output_array(0)[0], 0.8624, max_relative = 1e-3);
}

#[test]
fn npn_common_emitter_netlist() {
    let mut filter = filter_from(
        "vref ref 0 5\n\
         q0 c b e smallsig\n\
         r0 b 0 1470\n\
         r1 b ref 16670\n\
         r2 c ref 1k\n\
         r3 e 0 100\n\
         .model smallsig npn(is=1e-12 vt=26m ne=1 br=1 bf=100)\n",
    );
    filter.process(1).unwrap();

    // dynamic pins in first-seen order: c, b, e
    assert_eq!(filter.dynamic_pin_name(0).unwrap(), "c");
    assert_eq!(filter.dynamic_pin_name(1).unwrap(), "b");
    assert_eq!(filter.dynamic_pin_name(2).unwrap(), "e");
    assert_relative_eq!(filter.output_array(1)[0], 4.0510473e-1, max_relative = 1e-5);
    assert_relative_eq!(filter.output_array(0)[0], 4.9942860, max_relative = 1e-5);
    assert_relative_eq!(filter.output_array(2)[0], 5.7711532e-4, max_relative = 1e-4);
}

#[test]
fn push_pull_netlist_biases_at_the_lower_rail() {
    let mut filter = filter_from(
        "v1 ref1 0 1\n\
         v2 ref2 0 2\n\
         r0 out ref1 200k\n\
         q0 ref2 ref1 out follower\n\
         q1 0 ref1 out mirror\n\
         .model follower npn\n\
         .model mirror pnp\n",
    );
    filter.process(1).unwrap();
    assert_relative_eq!(filter.output_array(0)[0], 1.0, max_relative = 1e-4);
}

#[test]
fn vcvs_netlist_applies_its_gain() {
    let mut filter = filter_from("vin in 0 ac 1\ne1 out 0 in 0 3\nr1 out 0 1k\n");
    let input = [0.5, -0.5];
    filter.set_input(0, &input).unwrap();
    filter.process(input.len()).unwrap();
    assert_relative_eq!(filter.output_array(0)[0], 1.5, epsilon = 1e-9);
    assert_relative_eq!(filter.output_array(0)[1], -1.5, epsilon = 1e-9);
}

#[test]
fn current_source_netlist() {
    let mut filter = filter_from("i1 0 out 2m\nr1 out 0 1k\n");
    filter.process(1).unwrap();
    assert_relative_eq!(filter.output_array(0)[0], 2.0, max_relative = 1e-6);
}

#[test]
fn lowered_parameters_are_tunable_through_the_filter() {
    let mut filter = filter_from("vcc ref 0 5\nr0 mid 0 100\nr1 mid ref 100\n");
    assert_eq!(filter.num_parameters(), 2);
    filter.process(1).unwrap();
    filter.set_parameter(0, 300.0).unwrap();
    filter.process(1).unwrap();
    assert_relative_eq!(filter.output_array(0)[0], 3.75, max_relative = 1e-6);
}

#[test]
fn two_runs_of_the_same_netlist_are_bit_identical() {
    let netlist = "vin in 0 ac 1\n\
                   r1 mid in 10k\n\
                   c1 out mid 22n\n\
                   dclip 0 out soft\n\
                   r2 out 0 100k\n\
                   .model soft d(is=1e-12 n=1)\n";
    let run = || {
        let mut filter = filter_from(netlist);
        let input: Vec<f64> = (0..128)
            .map(|n| (2.0 * std::f64::consts::PI * n as f64 * 440.0 / RATE as f64).sin())
            .collect();
        filter.set_input(0, &input).unwrap();
        filter.process(input.len()).unwrap();
        filter.output_array(filter.nb_dynamic_pins() - 1).to_vec()
    };

    let first = run();
    let second = run();
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
