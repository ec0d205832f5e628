//! Per-sample solve benchmarks.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use nalgebra::dvector;
use voltaic_core::{Circuit, Pin};
use voltaic_devices::{Capacitor, Resistor, Transistor, TransistorParams};
use voltaic_solver::CircuitFilter;

const RATE: usize = 48000;

fn common_emitter() -> Circuit {
    let mut circuit = Circuit::new(3, 2, 1);
    circuit.set_static_state(dvector![0.0, 5.0]).unwrap();
    circuit
        .add_component(
            Box::new(Transistor::npn(TransistorParams::default())),
            vec![Pin::dynamic(0), Pin::dynamic(1), Pin::dynamic(2)],
        )
        .unwrap();
    circuit
        .add_component(Box::new(Resistor::new(1470.0)), vec![Pin::GROUND, Pin::dynamic(0)])
        .unwrap();
    circuit
        .add_component(Box::new(Resistor::new(16670.0)), vec![Pin::fixed(1), Pin::dynamic(0)])
        .unwrap();
    circuit
        .add_component(Box::new(Resistor::new(1000.0)), vec![Pin::fixed(1), Pin::dynamic(1)])
        .unwrap();
    circuit
        .add_component(Box::new(Resistor::new(100.0)), vec![Pin::GROUND, Pin::dynamic(2)])
        .unwrap();
    circuit
        .add_component(Box::new(Capacitor::new(22e-9)), vec![Pin::dynamic(0), Pin::input(0)])
        .unwrap();
    circuit
}

fn bench_common_emitter(c: &mut Criterion) {
    c.bench_function("common_emitter_block_64", |b| {
        let mut filter = CircuitFilter::new(common_emitter());
        filter.set_input_sampling_rate(RATE);
        filter.set_output_sampling_rate(RATE);
        let input: Vec<f64> = (0..64)
            .map(|n| 0.1 * (2.0 * std::f64::consts::PI * n as f64 * 1000.0 / RATE as f64).sin())
            .collect();
        filter.set_input(0, &input).unwrap();
        filter.setup().unwrap();

        b.iter(|| {
            filter.process(black_box(64)).unwrap();
            black_box(filter.output_array(1)[63])
        });
    });
}

criterion_group!(benches, bench_common_emitter);
criterion_main!(benches);
