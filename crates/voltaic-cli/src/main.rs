//! Command-line front end: lower a netlist and drive it with a generated
//! input, printing the dynamic pin voltages sample by sample.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use voltaic::from_netlist;

#[derive(Parser)]
#[command(name = "voltaic", version, about = "Audio-rate nodal circuit simulator")]
struct Args {
    /// Netlist file to simulate.
    netlist: PathBuf,

    /// Sampling rate in Hz.
    #[arg(long, default_value_t = 48000)]
    rate: usize,

    /// Number of samples to process.
    #[arg(long, default_value_t = 32)]
    samples: usize,

    /// Waveform applied to every input port.
    #[arg(long, value_enum, default_value_t = InputKind::Step)]
    input: InputKind,

    /// Peak amplitude of the generated input.
    #[arg(long, default_value_t = 1.0)]
    amplitude: f64,

    /// Frequency of the sine input in Hz.
    #[arg(long, default_value_t = 1000.0)]
    frequency: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputKind {
    /// Unit step scaled by the amplitude.
    Step,
    /// Sine wave at the requested frequency.
    Sine,
    /// All-zero input (DC response only).
    Silence,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.netlist)
        .with_context(|| format!("cannot read netlist {}", args.netlist.display()))?;
    let mut filter = from_netlist(&source)?;
    filter.set_input_sampling_rate(args.rate);
    filter.set_output_sampling_rate(args.rate);

    println!(
        "{}: {} static, {} input, {} dynamic pins; {} components",
        args.netlist.display(),
        filter.nb_static_pins(),
        filter.nb_input_pins(),
        filter.nb_dynamic_pins(),
        filter.nb_components(),
    );

    let input = generate_input(&args);
    for port in 0..filter.nb_input_pins() {
        filter.set_input(port, &input)?;
    }
    filter.process(args.samples)?;

    print!("{:>8}", "sample");
    for pin in 0..filter.nb_dynamic_pins() {
        let name = filter.dynamic_pin_name(pin)?.to_string();
        print!("{:>14}", format!("V({name})"));
    }
    println!();

    for n in 0..args.samples {
        print!("{n:>8}");
        for pin in 0..filter.nb_dynamic_pins() {
            print!("{:>14.6e}", filter.output_array(pin)[n]);
        }
        println!();
    }

    Ok(())
}

fn generate_input(args: &Args) -> Vec<f64> {
    (0..args.samples)
        .map(|n| match args.input {
            InputKind::Step => args.amplitude,
            InputKind::Sine => {
                let phase = 2.0 * std::f64::consts::PI * args.frequency * n as f64
                    / args.rate as f64;
                args.amplitude * phase.sin()
            }
            InputKind::Silence => 0.0,
        })
        .collect()
}
