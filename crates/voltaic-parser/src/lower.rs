//! Netlist-to-circuit lowering.
//!
//! Classifies every referenced net into a pin class, then instantiates the
//! devices. Voltage entries decide the static and input pins first; every
//! remaining net becomes a dynamic pin in first-seen order, which also fixes
//! the output port ordering of the driver.

use indexmap::IndexMap;
use nalgebra::DVector;
use voltaic_core::{Circuit, Component, Pin, PinType};
use voltaic_devices::{
    Capacitor, Coil, CurrentSource, Diode, DiodeParams, Resistor, Transistor, TransistorParams,
    Vcvs,
};

use crate::ast::{ComponentLine, ModelKind, NetlistArg, NetlistAst};
use crate::error::{Error, Result};

/// Lowers a parsed netlist into a circuit ready for the solver.
pub fn build_circuit(ast: &NetlistAst) -> Result<Circuit> {
    let mut lowerer = Lowerer::new(ast);
    lowerer.assign_supply_pins()?;
    lowerer.generate_components()?;
    lowerer.build()
}

struct Lowerer<'a> {
    ast: &'a NetlistAst,
    /// Net name to pin, in registration order. `0` and `gnd` both resolve to
    /// the ground pin.
    pins: IndexMap<String, Pin>,
    static_voltage: Vec<f64>,
    static_names: Vec<String>,
    input_names: Vec<String>,
    dynamic_names: Vec<String>,
    placements: Vec<(Box<dyn Component>, Vec<Pin>)>,
}

impl<'a> Lowerer<'a> {
    fn new(ast: &'a NetlistAst) -> Self {
        let mut pins = IndexMap::new();
        pins.insert("0".to_string(), Pin::GROUND);
        pins.insert("gnd".to_string(), Pin::GROUND);
        Self {
            ast,
            pins,
            static_voltage: vec![0.0],
            static_names: vec!["0".to_string()],
            input_names: Vec::new(),
            dynamic_names: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Resolves every `v` entry into a static or input pin.
    ///
    /// `v n+ n- <value>` and `v n+ n- dc <value>` fix the non-grounded side
    /// at `±value`; any `ac` form makes it an input pin instead.
    fn assign_supply_pins(&mut self) -> Result<()> {
        for entry in &self.ast.components {
            if !entry.name.starts_with('v') {
                continue;
            }
            if entry.args.len() < 3 {
                return Err(Error::Arity {
                    component: entry.name.clone(),
                    expected: 3,
                    found: entry.args.len(),
                });
            }

            let net0 = entry.args[0].to_name();
            let net1 = entry.args[1].to_name();
            let first_gnd = net0 == "0" || net0 == "gnd";
            if !self.pins.contains_key(&net0) && !self.pins.contains_key(&net1) {
                return Err(Error::Grounding {
                    component: entry.name.clone(),
                });
            }
            let driven = if first_gnd { &net1 } else { &net0 };
            let sign = if first_gnd { -1.0 } else { 1.0 };

            if entry.args.len() == 3 {
                let value = self.number(entry, 2)?;
                self.add_static_pin(driven, sign * value)?;
            } else if entry.args.len() == 4
                && matches!(&entry.args[2], NetlistArg::Name(name) if name == "dc")
            {
                let value = self.number(entry, 3)?;
                self.add_static_pin(driven, sign * value)?;
            } else {
                self.add_input_pin(driven)?;
            }
        }
        Ok(())
    }

    fn add_static_pin(&mut self, net: &str, voltage: f64) -> Result<()> {
        if self.pins.contains_key(net) {
            return Err(Error::DuplicateSupply { net: net.to_string() });
        }
        let pin = Pin::fixed(self.static_voltage.len());
        self.pins.insert(net.to_string(), pin);
        self.static_voltage.push(voltage);
        self.static_names.push(net.to_string());
        Ok(())
    }

    fn add_input_pin(&mut self, net: &str) -> Result<()> {
        if self.pins.contains_key(net) {
            return Err(Error::DuplicateSupply { net: net.to_string() });
        }
        let pin = Pin::input(self.input_names.len());
        self.pins.insert(net.to_string(), pin);
        self.input_names.push(net.to_string());
        Ok(())
    }

    /// Known pin for `net`, or a fresh dynamic pin in first-seen order.
    fn ensure_pin(&mut self, net: &str) -> Pin {
        if let Some(pin) = self.pins.get(net) {
            return *pin;
        }
        let pin = Pin::dynamic(self.dynamic_names.len());
        self.pins.insert(net.to_string(), pin);
        self.dynamic_names.push(net.to_string());
        pin
    }

    fn number(&self, entry: &ComponentLine, index: usize) -> Result<f64> {
        entry.args[index].as_number().ok_or_else(|| Error::ExpectedNumber {
            component: entry.name.clone(),
            found: entry.args[index].to_name(),
        })
    }

    fn check_arity(&self, entry: &ComponentLine, expected: usize) -> Result<()> {
        if entry.args.len() != expected {
            return Err(Error::Arity {
                component: entry.name.clone(),
                expected,
                found: entry.args.len(),
            });
        }
        Ok(())
    }

    fn generate_components(&mut self) -> Result<()> {
        for entry in &self.ast.components {
            match entry.name.chars().next() {
                Some('r') => self.add_two_pin(entry, |value| Box::new(Resistor::new(value)))?,
                Some('c') => self.add_two_pin(entry, |value| Box::new(Capacitor::new(value)))?,
                Some('l') => self.add_two_pin(entry, |value| Box::new(Coil::new(value)))?,
                Some('i') => self.add_two_pin(entry, |value| Box::new(CurrentSource::new(value)))?,
                Some('d') => self.add_diode(entry)?,
                Some('q') => self.add_transistor(entry)?,
                Some('e') => self.add_vcvs(entry)?,
                Some('v') => {}
                _ => {
                    return Err(Error::UnknownDevice {
                        name: entry.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn add_two_pin(
        &mut self,
        entry: &ComponentLine,
        make: impl FnOnce(f64) -> Box<dyn Component>,
    ) -> Result<()> {
        self.check_arity(entry, 3)?;
        let pin0 = self.ensure_pin(&entry.args[0].to_name());
        let pin1 = self.ensure_pin(&entry.args[1].to_name());
        let value = self.number(entry, 2)?;
        self.placements.push((make(value), vec![pin0, pin1]));
        Ok(())
    }

    fn add_diode(&mut self, entry: &ComponentLine) -> Result<()> {
        self.check_arity(entry, 3)?;
        let pin0 = self.ensure_pin(&entry.args[0].to_name());
        let pin1 = self.ensure_pin(&entry.args[1].to_name());

        let model_name = entry.args[2].to_name();
        let model = self.ast.models.get(&model_name).ok_or(Error::UnknownModel {
            name: model_name.clone(),
        })?;
        if model.kind != ModelKind::Diode {
            return Err(Error::ModelKindMismatch {
                name: model_name,
                expected: "diode",
            });
        }
        let defaults = DiodeParams::default();
        let params = DiodeParams {
            is: model.parameter("is", defaults.is),
            n: model.parameter("n", defaults.n),
            vt: model.parameter("vt", defaults.vt),
        };
        self.placements
            .push((Box::new(Diode::forward(params)), vec![pin0, pin1]));
        Ok(())
    }

    fn add_transistor(&mut self, entry: &ComponentLine) -> Result<()> {
        self.check_arity(entry, 4)?;
        // netlist order is collector, base, emitter; the device wants
        // (base, collector, emitter)
        let collector = self.ensure_pin(&entry.args[0].to_name());
        let base = self.ensure_pin(&entry.args[1].to_name());
        let emitter = self.ensure_pin(&entry.args[2].to_name());

        let model_name = entry.args[3].to_name();
        let model = self.ast.models.get(&model_name).ok_or(Error::UnknownModel {
            name: model_name.clone(),
        })?;
        let defaults = TransistorParams::default();
        let params = TransistorParams {
            is: model.parameter("is", defaults.is),
            vt: model.parameter("vt", defaults.vt),
            ne: model.parameter("ne", defaults.ne),
            br: model.parameter("br", defaults.br),
            bf: model.parameter("bf", defaults.bf),
        };
        let device = match model.kind {
            ModelKind::Npn => Transistor::npn(params),
            ModelKind::Pnp => Transistor::pnp(params),
            ModelKind::Diode => {
                return Err(Error::ModelKindMismatch {
                    name: model_name,
                    expected: "transistor",
                });
            }
        };
        self.placements
            .push((Box::new(device), vec![base, collector, emitter]));
        Ok(())
    }

    fn add_vcvs(&mut self, entry: &ComponentLine) -> Result<()> {
        self.check_arity(entry, 5)?;
        // netlist order is out+, out-, in+, in-; the device wants
        // (in+, in-, out+, out-)
        let out_pos = self.ensure_pin(&entry.args[0].to_name());
        let out_neg = self.ensure_pin(&entry.args[1].to_name());
        let in_pos = self.ensure_pin(&entry.args[2].to_name());
        let in_neg = self.ensure_pin(&entry.args[3].to_name());
        let gain = self.number(entry, 4)?;
        self.placements.push((
            Box::new(Vcvs::new(gain)),
            vec![in_pos, in_neg, out_pos, out_neg],
        ));
        Ok(())
    }

    fn build(self) -> Result<Circuit> {
        let Lowerer {
            static_voltage,
            static_names,
            input_names,
            dynamic_names,
            placements,
            ..
        } = self;

        let mut circuit = Circuit::new(dynamic_names.len(), static_voltage.len(), input_names.len());
        circuit.set_static_state(DVector::from_vec(static_voltage))?;

        for (index, name) in static_names.into_iter().enumerate() {
            circuit.set_pin_name(Pin::new(PinType::Static, index), name)?;
        }
        for (index, name) in input_names.into_iter().enumerate() {
            circuit.set_pin_name(Pin::new(PinType::Input, index), name)?;
        }
        for (index, name) in dynamic_names.into_iter().enumerate() {
            circuit.set_pin_name(Pin::new(PinType::Dynamic, index), name)?;
        }

        for (component, pins) in placements {
            circuit.add_component(component, pins)?;
        }
        Ok(circuit)
    }
}
