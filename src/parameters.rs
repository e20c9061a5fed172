//! Catalogue of the parameters an ECU can report.
//!
//! Primitive parameters are read from one or two bytes at a fixed ECU
//! address and decoded into a physical quantity. Derived parameters are
//! computed from already-decoded values. Both tables are process-wide
//! immutable data; no locking is required for concurrent reads.
//!
//! Two-byte parameters are transmitted big-endian and decode through an
//! unsigned 16-bit intermediate before promotion to `f32`.

use std::collections::HashMap;

use crate::error::Error;
use crate::units::{self, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position of a parameter's support flag within the init-response
/// capability bytes. The byte index counts from the start of the init
/// response data, so the first capability byte (after the SSM and ROM ids)
/// is index 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub byte: usize,
    pub bit: u8,
}

/// The ECU memory location holding a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    /// 24-bit address, most significant byte first.
    pub address: [u8; 3],
    /// Number of consecutive bytes the value occupies (1 or 2).
    pub length: usize,
}

impl Address {
    /// Returns the address `offset` bytes past this one.
    pub fn add(&self, offset: u32) -> [u8; 3] {
        let base = u32::from_be_bytes([0, self.address[0], self.address[1], self.address[2]]);
        let sum = (base + offset).to_be_bytes();
        [sum[1], sum[2], sum[3]]
    }
}

/// A decoded value together with the unit it is currently expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterValue {
    pub value: f32,
    pub unit: Unit,
}

impl ParameterValue {
    /// Converts the value to the given unit via the unit graph.
    pub fn convert_to(&self, unit: Unit) -> Result<ParameterValue, Error> {
        Ok(ParameterValue {
            value: units::convert(self.value, self.unit, unit)?,
            unit,
        })
    }

    /// Converts the value to the given unit, falling back to the zero of
    /// the target unit when no conversion exists.
    pub fn safe_convert_to(&self, unit: Unit) -> ParameterValue {
        self.convert_to(unit)
            .unwrap_or(ParameterValue { value: 0.0, unit })
    }
}

/// A frame's worth of decoded values, keyed by parameter id.
pub type ParameterValues = HashMap<&'static str, ParameterValue>;

/// A parameter read directly from ECU memory.
pub struct Parameter {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub capability: Capability,
    pub address: Address,
    pub unit: Unit,
    value: fn(&[u8]) -> f32,
}

impl Parameter {
    /// Decodes the raw bytes for this parameter, tagging the result with
    /// the parameter's default unit. `bytes` must hold exactly
    /// `address.length` bytes.
    pub fn decode(&self, bytes: &[u8]) -> ParameterValue {
        ParameterValue {
            value: (self.value)(bytes),
            unit: self.unit,
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("address", &self.address)
            .field("unit", &self.unit)
            .finish()
    }
}

/// A parameter computed from other decoded values instead of from ECU
/// memory.
pub struct DerivedParameter {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Ids of the primitive parameters this expression reads.
    pub depends_on: &'static [&'static str],
    pub unit: Unit,
    value: fn(&ParameterValues) -> Result<f32, Error>,
}

impl DerivedParameter {
    /// Evaluates the expression against a map of already-decoded values.
    pub fn evaluate(&self, values: &ParameterValues) -> Result<ParameterValue, Error> {
        Ok(ParameterValue {
            value: (self.value)(values)?,
            unit: self.unit,
        })
    }
}

impl std::fmt::Debug for DerivedParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedParameter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("unit", &self.unit)
            .finish()
    }
}

/// Looks up a primitive parameter by id.
pub fn parameter(id: &str) -> Option<&'static Parameter> {
    PARAMETERS.iter().find(|p| p.id == id)
}

/// Looks up a derived parameter by id.
pub fn derived_parameter(id: &str) -> Option<&'static DerivedParameter> {
    DERIVED_PARAMETERS.iter().find(|p| p.id == id)
}

/// The derived parameters whose dependencies are all present in `params`.
pub fn available_derived_parameters(
    params: &[&'static Parameter],
) -> Vec<&'static DerivedParameter> {
    DERIVED_PARAMETERS
        .iter()
        .filter(|d| {
            d.depends_on
                .iter()
                .all(|dep| params.iter().any(|p| p.id == *dep))
        })
        .collect()
}

fn u16_be(v: &[u8]) -> f32 {
    u16::from_be_bytes([v[0], v[1]]) as f32
}

/// Reads a dependency out of the value map, defaulting to zero when the
/// caller chose not to log it.
fn dep(values: &ParameterValues, id: &str) -> ParameterValue {
    values.get(id).copied().unwrap_or(ParameterValue {
        value: 0.0,
        unit: Unit::Raw,
    })
}

const fn cap(byte: usize, bit: u8) -> Capability {
    Capability { byte, bit }
}

const fn param(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    capability: Capability,
    address: [u8; 3],
    length: usize,
    unit: Unit,
    value: fn(&[u8]) -> f32,
) -> Parameter {
    Parameter {
        id,
        name,
        description,
        capability,
        address: Address { address, length },
        unit,
        value,
    }
}

const fn derived(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    depends_on: &'static [&'static str],
    unit: Unit,
    value: fn(&ParameterValues) -> Result<f32, Error>,
) -> DerivedParameter {
    DerivedParameter {
        id,
        name,
        description,
        depends_on,
        unit,
        value,
    }
}

/// Every primitive parameter the protocol knows about, in stable id order.
pub static PARAMETERS: &[Parameter] = &[
    param("P1", "Engine Load (Relative)", "", cap(8, 7), [0x00, 0x00, 0x07], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P2", "Coolant Temperature", "", cap(8, 6), [0x00, 0x00, 0x08], 1,
        Unit::Celsius, |v| v[0] as f32 - 40.0),
    param("P3", "A/F Correction #1", "", cap(8, 5), [0x00, 0x00, 0x09], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P4", "A/F Learning #1", "", cap(8, 4), [0x00, 0x00, 0x0A], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P5", "A/F Correction #2", "", cap(8, 3), [0x00, 0x00, 0x0B], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P6", "A/F Learning #2", "", cap(8, 2), [0x00, 0x00, 0x0C], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P7", "Manifold Absolute Pressure",
        "Pressure value calculated from the manifold absolute pressure sensor (absolute value)",
        cap(8, 1), [0x00, 0x00, 0x0D], 1, Unit::Kpa, |v| v[0] as f32),
    param("P8", "Engine Speed", "", cap(8, 0), [0x00, 0x00, 0x0E], 2,
        Unit::Rpm, |v| u16_be(v) / 4.0),
    param("P9", "Vehicle Speed", "", cap(9, 7), [0x00, 0x00, 0x10], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P10", "Ignition Total Timing", "", cap(9, 6), [0x00, 0x00, 0x11], 1,
        Unit::Degrees, |v| (v[0] as f32 - 128.0) / 2.0),
    param("P11", "Intake Air Temperature", "", cap(9, 5), [0x00, 0x00, 0x12], 1,
        Unit::Celsius, |v| v[0] as f32 - 40.0),
    param("P12", "Mass Airflow", "", cap(9, 4), [0x00, 0x00, 0x13], 2,
        Unit::GramsPerSecond, |v| u16_be(v) / 100.0),
    param("P13", "Throttle Opening Angle", "Engine throttle opening angle.",
        cap(9, 3), [0x00, 0x00, 0x15], 1, Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P14", "Front O2 Sensor #1", "", cap(9, 2), [0x00, 0x00, 0x16], 2,
        Unit::Volts, |v| u16_be(v) / 200.0),
    param("P15", "Rear O2 Sensor", "", cap(9, 1), [0x00, 0x00, 0x18], 2,
        Unit::Volts, |v| u16_be(v) / 200.0),
    param("P16", "Front O2 Sensor #2", "", cap(9, 0), [0x00, 0x00, 0x1A], 2,
        Unit::Volts, |v| u16_be(v) / 200.0),
    param("P17", "Battery Voltage", "", cap(10, 7), [0x00, 0x00, 0x1C], 1,
        Unit::Volts, |v| v[0] as f32 * 8.0 / 100.0),
    param("P18", "Mass Airflow Sensor Voltage", "", cap(10, 6), [0x00, 0x00, 0x1D], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P19", "Throttle Sensor Voltage", "", cap(10, 5), [0x00, 0x00, 0x1E], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P20", "Differential Pressure Sensor Voltage", "", cap(10, 4), [0x00, 0x00, 0x1F], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P21", "Fuel Injector #1 Pulse Width", "This parameter includes injector latency.",
        cap(10, 3), [0x00, 0x00, 0x20], 1, Unit::Microseconds, |v| v[0] as f32 * 256.0),
    param("P22", "Fuel Injector #2 Pulse Width", "This parameter includes injector latency.",
        cap(10, 2), [0x00, 0x00, 0x21], 1, Unit::Microseconds, |v| v[0] as f32 * 256.0),
    param("P23", "Knock Correction Advance",
        "Retard amount when knocking has occurred. Partial learned value of the learned ignition timing.",
        cap(10, 1), [0x00, 0x00, 0x22], 1, Unit::Degrees, |v| (v[0] as f32 - 128.0) / 2.0),
    param("P24", "Atmospheric Pressure", "", cap(10, 0), [0x00, 0x00, 0x23], 1,
        Unit::Kpa, |v| v[0] as f32),
    param("P25", "Manifold Relative Pressure",
        "Manifold absolute pressure minus current atmospheric pressure.",
        cap(11, 7), [0x00, 0x00, 0x24], 1, Unit::Kpa, |v| v[0] as f32 - 128.0),
    param("P26", "Pressure Differential Sensor", "", cap(11, 6), [0x00, 0x00, 0x25], 1,
        Unit::Kpa, |v| v[0] as f32 - 128.0),
    param("P27", "Fuel Tank Pressure", "", cap(11, 5), [0x00, 0x00, 0x26], 1,
        Unit::Hpa, |v| (v[0] as f32 - 128.0) / 4.0),
    param("P28", "CO Adjustment", "", cap(11, 4), [0x00, 0x00, 0x27], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P29", "Learned Ignition Timing",
        "Advance or retard amount when knocking has occurred.",
        cap(11, 3), [0x00, 0x00, 0x28], 1, Unit::Degrees, |v| (v[0] as f32 - 128.0) / 2.0),
    param("P30", "Accelerator Pedal Angle", "", cap(11, 2), [0x00, 0x00, 0x29], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P31", "Fuel Temperature", "", cap(11, 1), [0x00, 0x00, 0x2A], 1,
        Unit::Celsius, |v| v[0] as f32 - 40.0),
    param("P32", "Front O2 Heater Current #1", "", cap(11, 0), [0x00, 0x00, 0x2B], 1,
        Unit::Amps, |v| v[0] as f32 * 1004.0 / 25600.0),
    param("P33", "Rear O2 Heater Current", "", cap(12, 7), [0x00, 0x00, 0x2C], 1,
        Unit::Amps, |v| v[0] as f32 * 1004.0 / 25600.0),
    param("P34", "Front O2 Heater Current #2", "", cap(12, 6), [0x00, 0x00, 0x2D], 1,
        Unit::Amps, |v| v[0] as f32 * 1004.0 / 25600.0),
    param("P35", "Fuel Level", "", cap(12, 5), [0x00, 0x00, 0x2E], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P36", "Primary Wastegate Duty Cycle", "Turbo control valve duty cycle.",
        cap(12, 3), [0x00, 0x00, 0x30], 1, Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P37", "Secondary Wastegate Duty Cycle", "", cap(12, 2), [0x00, 0x00, 0x31], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P38", "CPC Valve Duty Ratio", "", cap(12, 1), [0x00, 0x00, 0x32], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P39", "Tumble Valve Position Sensor Right", "", cap(12, 0), [0x00, 0x00, 0x33], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P40", "Tumble Valve Position Sensor Left", "", cap(13, 7), [0x00, 0x00, 0x34], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P41", "Idle Speed Control Valve Duty Ratio", "", cap(13, 6), [0x00, 0x00, 0x35], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P42", "A/F Lean Correction", "", cap(13, 5), [0x00, 0x00, 0x36], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P43", "A/F Heater Duty", "", cap(13, 4), [0x00, 0x00, 0x37], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P44", "Idle Speed Control Valve Step", "", cap(13, 3), [0x00, 0x00, 0x38], 1,
        Unit::Steps, |v| v[0] as f32),
    param("P45", "Number of Exh. Gas Recirc. Steps", "", cap(13, 2), [0x00, 0x00, 0x39], 1,
        Unit::Steps, |v| v[0] as f32),
    param("P46", "Alternator Duty", "", cap(13, 1), [0x00, 0x00, 0x3A], 1,
        Unit::Percent, |v| v[0] as f32),
    param("P47", "Fuel Pump Duty", "", cap(13, 0), [0x00, 0x00, 0x3B], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P48", "Intake VVT Advance Angle Right", "", cap(14, 7), [0x00, 0x00, 0x3C], 1,
        Unit::Degrees, |v| v[0] as f32 - 50.0),
    param("P49", "Intake VVT Advance Angle Left", "", cap(14, 6), [0x00, 0x00, 0x3D], 1,
        Unit::Degrees, |v| v[0] as f32 - 50.0),
    param("P50", "Intake OCV Duty Right", "", cap(14, 5), [0x00, 0x00, 0x3E], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P51", "Intake OCV Duty Left", "", cap(14, 4), [0x00, 0x00, 0x3F], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P52", "Intake OCV Current Right", "", cap(14, 3), [0x00, 0x00, 0x40], 1,
        Unit::Milliamps, |v| v[0] as f32 * 32.0),
    param("P53", "Intake OCV Current Left", "", cap(14, 2), [0x00, 0x00, 0x41], 1,
        Unit::Milliamps, |v| v[0] as f32 * 32.0),
    param("P54", "A/F Sensor #1 Current", "", cap(14, 1), [0x00, 0x00, 0x42], 1,
        Unit::Milliamps, |v| (v[0] as f32 - 128.0) / 8.0),
    param("P55", "A/F Sensor #2 Current", "", cap(14, 0), [0x00, 0x00, 0x43], 1,
        Unit::Milliamps, |v| (v[0] as f32 - 128.0) / 8.0),
    param("P56", "A/F Sensor #1 Resistance", "", cap(15, 7), [0x00, 0x00, 0x44], 1,
        Unit::Ohms, |v| v[0] as f32),
    param("P57", "A/F Sensor #2 Resistance", "", cap(15, 6), [0x00, 0x00, 0x45], 1,
        Unit::Ohms, |v| v[0] as f32),
    param("P58", "A/F Sensor #1", "", cap(15, 5), [0x00, 0x00, 0x46], 1,
        Unit::Lambda, |v| v[0] as f32 / 128.0),
    param("P59", "A/F Sensor #2", "", cap(15, 4), [0x00, 0x00, 0x47], 1,
        Unit::Lambda, |v| v[0] as f32 / 128.0),
    param("P60", "Gear Position", "", cap(16, 5), [0x00, 0x00, 0x4A], 1,
        Unit::Gear, |v| v[0] as f32 + 1.0),
    param("P61", "A/F Sensor #1 Heater Current", "", cap(17, 4), [0x00, 0x00, 0x53], 1,
        Unit::Amps, |v| v[0] as f32 / 10.0),
    param("P62", "A/F Sensor #2 Heater Current", "", cap(17, 3), [0x00, 0x00, 0x54], 1,
        Unit::Amps, |v| v[0] as f32 / 10.0),
    param("P63", "Roughness Monitor Cylinder #1", "", cap(55, 7), [0x00, 0x00, 0xCE], 1,
        Unit::MisfireCount, |v| v[0] as f32),
    param("P64", "Roughness Monitor Cylinder #2", "", cap(55, 6), [0x00, 0x00, 0xCF], 1,
        Unit::MisfireCount, |v| v[0] as f32),
    param("P65", "A/F Correction #3 (16-bit ECU)", "", cap(15, 3), [0x00, 0x00, 0xD0], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P66", "A/F Learning #3", "", cap(15, 2), [0x00, 0x00, 0xD1], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P67", "Rear O2 Heater Voltage", "", cap(15, 1), [0x00, 0x00, 0xD2], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P68", "A/F Adjustment Voltage", "", cap(15, 0), [0x00, 0x00, 0xD3], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P69", "Roughness Monitor Cylinder #3", "", cap(55, 5), [0x00, 0x00, 0xD8], 1,
        Unit::MisfireCount, |v| v[0] as f32),
    param("P70", "Roughness Monitor Cylinder #4", "", cap(55, 4), [0x00, 0x00, 0xD9], 1,
        Unit::MisfireCount, |v| v[0] as f32),
    param("P71", "Throttle Motor Duty", "", cap(38, 5), [0x00, 0x00, 0xFA], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) * 100.0 / 128.0),
    param("P72", "Throttle Motor Voltage", "", cap(38, 4), [0x00, 0x00, 0xFB], 1,
        Unit::Volts, |v| v[0] as f32 * 8.0 / 100.0),
    param("P73", "Sub Throttle Sensor", "", cap(40, 7), [0x00, 0x01, 0x00], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P74", "Main Throttle Sensor", "", cap(40, 6), [0x00, 0x01, 0x01], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P75", "Sub Accelerator Sensor", "", cap(40, 5), [0x00, 0x01, 0x02], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P76", "Main Accelerator Sensor", "", cap(40, 4), [0x00, 0x01, 0x03], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P77", "Brake Booster Pressure", "", cap(40, 3), [0x00, 0x01, 0x04], 1,
        Unit::Kpa, |v| v[0] as f32),
    param("P78", "Fuel Pressure (High)", "", cap(40, 2), [0x00, 0x01, 0x05], 1,
        Unit::Mpa, |v| v[0] as f32 / 25.0),
    param("P79", "Exhaust Gas Temperature", "", cap(40, 1), [0x00, 0x01, 0x06], 1,
        Unit::Celsius, |v| (v[0] as f32 + 40.0) * 5.0),
    param("P80", "Cold Start Injector (Air Pump)", "", cap(41, 7), [0x00, 0x01, 0x08], 1,
        Unit::Microseconds, |v| v[0] as f32 * 256.0),
    param("P81", "SCV Step", "", cap(41, 6), [0x00, 0x01, 0x09], 1,
        Unit::Steps, |v| v[0] as f32),
    param("P82", "Memorised Cruise Speed", "", cap(41, 5), [0x00, 0x01, 0x0A], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P83", "Exhaust VVT Advance Angle Right", "", cap(43, 7), [0x00, 0x01, 0x18], 1,
        Unit::Degrees, |v| v[0] as f32 - 50.0),
    param("P84", "Exhaust VVT Advance Angle Left", "", cap(43, 6), [0x00, 0x01, 0x19], 1,
        Unit::Degrees, |v| v[0] as f32 - 50.0),
    param("P85", "Exhaust OCV Duty Right", "", cap(43, 5), [0x00, 0x01, 0x1A], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P86", "Exhaust OCV Duty Left", "", cap(43, 4), [0x00, 0x01, 0x1B], 1,
        Unit::Percent, |v| v[0] as f32 * 100.0 / 255.0),
    param("P87", "Exhaust OCV Current Right", "", cap(43, 3), [0x00, 0x01, 0x1C], 1,
        Unit::Milliamps, |v| v[0] as f32 * 32.0),
    param("P88", "Exhaust OCV Current Left", "", cap(43, 2), [0x00, 0x01, 0x1D], 1,
        Unit::Milliamps, |v| v[0] as f32 * 32.0),
    param("P89", "A/F Correction #3 (32-bit ECU)", "", cap(15, 3), [0x00, 0x00, 0xD0], 1,
        Unit::Percent, |v| (v[0] as f32 * 0.078125) - 5.0),
    param("P90", "IAM", "", cap(55, 0), [0x00, 0x00, 0xF9], 1,
        Unit::Multiplier, |v| v[0] as f32 / 16.0),
    param("P91", "Fine Learning Knock Correction", "", cap(55, 0), [0x00, 0x01, 0x99], 1,
        Unit::Degrees, |v| (v[0] as f32 * 0.25) - 32.0),
    param("P92", "Radiator Fan Control", "", cap(12, 4), [0x00, 0x00, 0x2F], 1,
        Unit::Percent, |v| v[0] as f32),
    param("P93", "Front Wheel Speed", "", cap(16, 7), [0x00, 0x00, 0x48], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P94", "ATF Temperature", "Reported as an index into the transmission's lookup table.",
        cap(16, 6), [0x00, 0x00, 0x49], 1, Unit::Index, |v| v[0] as f32),
    param("P95", "Line Pressure Duty Ratio", "", cap(16, 4), [0x00, 0x00, 0x4B], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P96", "Lock Up Duty Ratio", "", cap(16, 3), [0x00, 0x00, 0x4C], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P97", "Transfer Duty Ratio", "", cap(16, 2), [0x00, 0x00, 0x4D], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P98", "Throttle Sensor Voltage", "", cap(16, 1), [0x00, 0x00, 0x4E], 1,
        Unit::Volts, |v| v[0] as f32 / 45.0),
    param("P99", "Turbine Revolution Speed", "", cap(16, 0), [0x00, 0x00, 0x4F], 1,
        Unit::Rpm, |v| v[0] as f32 * 32.0),
    param("P100", "Brake Clutch Duty Ratio", "", cap(17, 7), [0x00, 0x00, 0x50], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P101", "Rear Wheel Speed", "", cap(17, 6), [0x00, 0x00, 0x51], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P102", "Manifold Pressure Sensor Voltage", "", cap(17, 5), [0x00, 0x00, 0x52], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P103", "Lateral G Sensor Voltage", "", cap(17, 2), [0x00, 0x00, 0x55], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P104", "ATF Temperature", "", cap(17, 1), [0x00, 0x00, 0x56], 1,
        Unit::Celsius, |v| v[0] as f32 - 50.0),
    param("P105", "Low Clutch Duty", "", cap(17, 0), [0x00, 0x00, 0x57], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P106", "High Clutch Duty", "", cap(18, 7), [0x00, 0x00, 0x58], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P107", "Load and Reverse Brake (L and RB) Duty", "", cap(18, 6), [0x00, 0x00, 0x59], 1,
        Unit::Percent, |v| v[0] as f32 / 2.0),
    param("P108", "ATF Temperature 2", "", cap(18, 5), [0x00, 0x00, 0x5A], 1,
        Unit::Celsius, |v| v[0] as f32 - 50.0),
    param("P109", "Voltage Center Differential Switch", "", cap(18, 4), [0x00, 0x00, 0x5B], 1,
        Unit::Volts, |v| v[0] as f32 / 51.0),
    param("P110", "AT Turbine Speed 1", "", cap(18, 3), [0x00, 0x00, 0x5C], 1,
        Unit::Rpm, |v| v[0] as f32 * 32.0),
    param("P111", "AT Turbine Speed 2", "", cap(18, 2), [0x00, 0x00, 0x5D], 1,
        Unit::Rpm, |v| v[0] as f32 * 32.0),
    param("P112", "Center Differential Real Current", "", cap(18, 1), [0x00, 0x00, 0x5E], 1,
        Unit::Amps, |v| v[0] as f32 / 32.0),
    param("P113", "Center Differential Indicate Current", "", cap(18, 0), [0x00, 0x00, 0x5F], 1,
        Unit::Amps, |v| v[0] as f32 / 32.0),
    param("P114", "SI-Drive Mode", "0=---, 1=S, 2=S#, 3=I, 8=S#, 16=I",
        cap(38, 7), [0x00, 0x01, 0x6A], 1, Unit::Index, |v| v[0] as f32),
    param("P115", "Throttle Sensor Closed Voltage", "", cap(38, 6), [0x00, 0x01, 0x6B], 1,
        Unit::Volts, |v| v[0] as f32 / 50.0),
    param("P116", "Exhaust Gas Temperature 2", "", cap(40, 0), [0x00, 0x01, 0x07], 1,
        Unit::Celsius, |v| v[0] as f32 * 5.0 + 200.0),
    param("P117", "Air/Fuel Correction #4", "", cap(41, 4), [0x00, 0x01, 0x0B], 1,
        Unit::Percent, |v| (v[0] as f32 - 64.0) / 128.0 * 10.0),
    param("P118", "Air/Fuel Learning #4", "", cap(41, 3), [0x00, 0x01, 0x0C], 1,
        Unit::Percent, |v| (v[0] as f32 - 128.0) / 128.0 * 100.0),
    param("P119", "Fuel Level Sensor Resistance", "", cap(41, 2), [0x00, 0x01, 0x0D], 1,
        Unit::Ohms, |v| v[0] as f32 * 4.0 / 2.0),
    param("P120", "Estimated Odometer", "Increments every 2 km.",
        cap(41, 1), [0x00, 0x01, 0x0E], 2, Unit::Kilometers, |v| u16_be(v) * 2.0),
    param("P121", "Fuel Tank Air Pressure", "", cap(41, 0), [0x00, 0x01, 0x72], 2,
        Unit::Bar, |v| u16_be(v) / 10.0),
    param("P122", "Oil Temperature", "", cap(42, 4), [0x00, 0x01, 0x13], 1,
        Unit::Celsius, |v| v[0] as f32 - 40.0),
    param("P123", "Oil Switching Solenoid Valve (OSV) Duty (Right)", "",
        cap(42, 3), [0x00, 0x01, 0x14], 1, Unit::Percent, |v| v[0] as f32 / 255.0 * 100.0),
    param("P124", "Oil Switching Solenoid Valve (OSV) Duty (Left)", "",
        cap(42, 2), [0x00, 0x01, 0x15], 1, Unit::Percent, |v| v[0] as f32 / 255.0 * 100.0),
    param("P125", "Oil Switching Solenoid Valve (OSV) Current (Right)", "",
        cap(42, 1), [0x00, 0x01, 0x16], 1, Unit::Milliamps, |v| v[0] as f32 * 32.0),
    param("P126", "Oil Switching Solenoid Valve (OSV) Current (Left)", "",
        cap(42, 0), [0x00, 0x01, 0x17], 1, Unit::Milliamps, |v| v[0] as f32 * 32.0),
    param("P127", "VVL Lift Mode", "", cap(43, 1), [0x00, 0x01, 0x1E], 1,
        Unit::Raw, |v| v[0] as f32),
    param("P128", "H and LR/C Solenoid Valve Current", "", cap(50, 7), [0x00, 0x01, 0x40], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P129", "D/C Solenoid Valve Current", "", cap(50, 6), [0x00, 0x01, 0x41], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P130", "F/B Solenoid Valve Current", "", cap(50, 5), [0x00, 0x01, 0x42], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P131", "I/C Solenoid Valve Current", "", cap(50, 4), [0x00, 0x01, 0x43], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P132", "P/L Solenoid Valve Current", "", cap(50, 3), [0x00, 0x01, 0x44], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P133", "L/U Solenoid Valve Current", "", cap(50, 2), [0x00, 0x01, 0x45], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P134", "AWD Solenoid Valve Current", "", cap(50, 1), [0x00, 0x01, 0x46], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P135", "Yaw Rate Sensor Voltage", "", cap(50, 0), [0x00, 0x01, 0x47], 1,
        Unit::Volts, |v| v[0] as f32 / 51.0),
    param("P136", "H and LR/C Solenoid Valve Pressure", "", cap(51, 7), [0x00, 0x01, 0x48], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P137", "D/C Solenoid Valve Pressure", "", cap(51, 6), [0x00, 0x01, 0x49], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P138", "F/B Solenoid Valve Pressure", "", cap(51, 5), [0x00, 0x01, 0x4A], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P139", "I/C Solenoid Valve Pressure", "", cap(51, 4), [0x00, 0x01, 0x4B], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P140", "P/L Solenoid Valve Pressure", "", cap(51, 3), [0x00, 0x01, 0x4C], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P141", "L/U Solenoid Valve Pressure", "", cap(51, 2), [0x00, 0x01, 0x4D], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P142", "AWD Solenoid Valve Pressure", "", cap(51, 1), [0x00, 0x01, 0x4E], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P143", "Yaw Rate and G Sensor Reference Voltage", "", cap(51, 0), [0x00, 0x01, 0x4F], 1,
        Unit::Volts, |v| v[0] as f32 / 51.0),
    param("P144", "Wheel Speed Front Right", "", cap(52, 7), [0x00, 0x01, 0x3C], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P145", "Wheel Speed Front Left", "", cap(52, 6), [0x00, 0x01, 0x3D], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P146", "Wheel Speed Rear Right", "", cap(52, 5), [0x00, 0x01, 0x3E], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P147", "Wheel Speed Rear Left", "", cap(52, 4), [0x00, 0x01, 0x3F], 1,
        Unit::Kmh, |v| v[0] as f32),
    param("P148", "Steering Angle Sensor", "Signed 16-bit value returned.",
        cap(52, 3), [0x00, 0x01, 0x5A], 1, Unit::Degrees, |v| v[0] as f32),
    param("P149", "Fwd/B Solenoid Valve Current", "", cap(52, 1), [0x00, 0x01, 0x85], 1,
        Unit::Amps, |v| v[0] as f32 / 255.0),
    param("P150", "Fwd/B Solenoid Valve Target Pressure", "", cap(52, 0), [0x00, 0x01, 0x86], 1,
        Unit::Kpa, |v| v[0] as f32 * 10.0),
    param("P151", "Roughness Monitor Cylinder #5", "", cap(55, 3), [0x00, 0x00, 0xEF], 1,
        Unit::MisfireCount, |v| v[0] as f32),
    param("P152", "Roughness Monitor Cylinder #6", "", cap(55, 2), [0x00, 0x00, 0xF8], 1,
        Unit::MisfireCount, |v| v[0] as f32),
    param("P153", "Learned Ignition Timing Correction",
        "Value of only the whole learning value in the ignition timing learning value.",
        cap(55, 1), [0x00, 0x00, 0xF9], 1, Unit::Degrees, |v| v[0] as f32 / 16.0),
    param("P154", "Fuel Tank Pressure", "", cap(59, 7), [0x00, 0x01, 0x9A], 1,
        Unit::Hpa, |v| (v[0] as f32 - 128.0) / 2.0),
    param("P155", "Main Injection Period", "", cap(60, 7), [0x00, 0x01, 0xE1], 1,
        Unit::DegreesCrankAngle, |v| v[0] as f32 / 5.0 - 15.0),
    param("P156", "Final Injection Amount", "", cap(60, 6), [0x00, 0x01, 0xE2], 2,
        Unit::CubicMmPerStroke, |v| u16_be(v) / 256.0),
    param("P157", "Number of Times Injected", "", cap(60, 5), [0x00, 0x01, 0xE4], 1,
        Unit::Count, |v| v[0] as f32),
    param("P158", "Target Intake Manifold Pressure", "", cap(60, 4), [0x00, 0x01, 0xE5], 1,
        Unit::Kpa, |v| v[0] as f32),
    param("P159", "Target Intake Air Amount", "", cap(60, 3), [0x00, 0x01, 0xE6], 1,
        Unit::MilligramsPerCylinder, |v| v[0] as f32 * 10.0),
    param("P160", "Air Mass", "", cap(60, 2), [0x00, 0x01, 0xE7], 1,
        Unit::MilligramsPerCylinder, |v| v[0] as f32 * 10.0),
    param("P161", "Exhaust Gas Recirculation (EGR) Target Valve Opening Angle", "",
        cap(60, 1), [0x00, 0x01, 0xE8], 1, Unit::Degrees, |v| v[0] as f32 - 50.0),
    param("P162", "Exhaust Gas Recirculation (EGR) Valve Opening Angle", "",
        cap(60, 0), [0x00, 0x01, 0xE9], 1, Unit::Degrees, |v| v[0] as f32 - 50.0),
    param("P163", "Exhaust Gas Recirculation (EGR) Duty", "", cap(61, 7), [0x00, 0x01, 0xEA], 1,
        Unit::Percent, |v| v[0] as f32),
    param("P164", "Common Rail Target Pressure", "", cap(61, 6), [0x00, 0x01, 0xEB], 1,
        Unit::Mpa, |v| v[0] as f32),
    param("P165", "Common Rail Pressure", "", cap(61, 5), [0x00, 0x01, 0xEC], 1,
        Unit::Mpa, |v| v[0] as f32),
    param("P166", "Intake Air Temperature (combined)", "", cap(61, 4), [0x00, 0x01, 0xED], 1,
        Unit::Celsius, |v| v[0] as f32 - 40.0),
    param("P167", "Target Engine Speed", "", cap(61, 3), [0x00, 0x01, 0xEE], 2,
        Unit::Rpm, |v| u16_be(v) / 4.0),
    param("P168", "Boost Pressure Feedback", "", cap(61, 2), [0x00, 0x01, 0xF0], 1,
        Unit::Percent, |v| v[0] as f32 - 128.0),
    param("P169", "Electric Power Steering Current", "", cap(61, 1), [0x00, 0x01, 0xF5], 1,
        Unit::Amps, |v| v[0] as f32),
    param("P170", "Fuel Pump Suction Control Valve Current (Target)",
        "Target current value of the suction control valve calculated by the ECM. Applies only to Diesel models.",
        cap(61, 0), [0x00, 0x01, 0xF6], 2, Unit::Milliamps, u16_be),
    param("P171", "Yaw Rate", "Signed 8-bit value returned.",
        cap(62, 7), [0x00, 0x01, 0xF1], 1, Unit::DegreesPerSecond, |v| v[0] as f32 * 0.19118),
    param("P172", "Lateral G", "Signed 8-bit value returned.",
        cap(62, 6), [0x00, 0x01, 0xF2], 1, Unit::MetersPerSecondSquared, |v| v[0] as f32 * 1.0862),
    param("P173", "Drivers Control Center Differential (DCCD) Torque Allocation", "",
        cap(62, 5), [0x00, 0x01, 0xF3], 1, Unit::Raw, |v| v[0] as f32),
    param("P174", "Drivers Control Center Differential (DCCD) Mode", "",
        cap(62, 4), [0x00, 0x01, 0xF4], 1, Unit::Raw, |v| v[0] as f32),
    param("P175", "Fuel Pump Suction Control Valve Current (Actual)",
        "Actual current value of the suction control valve. Input to the ECM. Applies only to Diesel models.",
        cap(63, 7), [0x00, 0x01, 0xF8], 2, Unit::Milliamps, u16_be),
    param("P176", "Mileage after Injector Learning", "", cap(63, 6), [0x00, 0x01, 0xFA], 2,
        Unit::Kilometers, |v| u16_be(v) * 5.0),
    param("P177", "Mileage after Injector Replacement", "", cap(63, 5), [0x00, 0x02, 0x04], 2,
        Unit::Kilometers, |v| u16_be(v) * 5.0),
    param("P178", "Interior Heater", "", cap(63, 4), [0x00, 0x02, 0x70], 1,
        Unit::Steps, |v| v[0] as f32),
    param("P179", "Quantity Correction Cylinder #1", "", cap(63, 3), [0x00, 0x02, 0x5D], 1,
        Unit::Microseconds, |v| (v[0] as f32 - 100.0) * 10.0),
    param("P180", "Quantity Correction Cylinder #2", "", cap(63, 2), [0x00, 0x02, 0x5E], 1,
        Unit::Microseconds, |v| (v[0] as f32 - 100.0) * 10.0),
    param("P181", "Quantity Correction Cylinder #3", "", cap(63, 1), [0x00, 0x02, 0x5F], 1,
        Unit::Microseconds, |v| (v[0] as f32 - 100.0) * 10.0),
    param("P182", "Quantity Correction Cylinder #4", "", cap(63, 0), [0x00, 0x02, 0x60], 1,
        Unit::Microseconds, |v| (v[0] as f32 - 100.0) * 10.0),
    param("P183", "Battery Current", "", cap(64, 7), [0x00, 0x02, 0x71], 1,
        Unit::Amps, |v| v[0] as f32 - 128.0),
    param("P184", "Battery Temperature", "", cap(64, 6), [0x00, 0x02, 0x73], 1,
        Unit::Celsius, |v| v[0] as f32 - 40.0),
    param("P185", "Alternator Control Mode", "0=High, 1=ExHigh, 2=Low, 3=Mid",
        cap(64, 5), [0x00, 0x02, 0x72], 1, Unit::Index, |v| v[0] as f32),
    param("P186", "Cumulative Ash Ratio", "", cap(70, 7), [0x00, 0x02, 0x75], 1,
        Unit::Percent, |v| v[0] as f32),
    param("P187", "Pressure Difference between Diesel Particulate Filter (DPF) Inlet and Outlet", "",
        cap(70, 6), [0x00, 0x02, 0x76], 1, Unit::Kpa, |v| v[0] as f32),
    param("P188", "Exhaust Gas Temperature at Catalyst Inlet", "", cap(70, 5), [0x00, 0x02, 0x77], 1,
        Unit::Celsius, |v| v[0] as f32 * 5.0 - 40.0),
    param("P189", "Exhaust Gas Temperature at Diesel Particulate Filter (DPF) Inlet", "",
        cap(70, 4), [0x00, 0x02, 0x78], 1, Unit::Celsius, |v| v[0] as f32 * 5.0 - 40.0),
    param("P190", "Estimated Catalyst Temperature", "", cap(70, 3), [0x00, 0x02, 0x79], 1,
        Unit::Celsius, |v| v[0] as f32 * 5.0 - 40.0),
    param("P191", "Estimated Temperature of the Diesel Particulate Filter (DPF)", "",
        cap(70, 2), [0x00, 0x02, 0x7A], 1, Unit::Celsius, |v| v[0] as f32 * 5.0 - 40.0),
    param("P192", "Soot Accumulation Ratio", "", cap(70, 1), [0x00, 0x02, 0x7B], 1,
        Unit::Percent, |v| v[0] as f32),
    param("P193", "Oil Dilution Ratio", "", cap(70, 0), [0x00, 0x02, 0x7C], 1,
        Unit::Percent, |v| v[0] as f32),
    param("P194", "Front-Rear Wheel Rotation Ratio", "", cap(71, 7), [0x00, 0x02, 0x93], 1,
        Unit::Percent, |v| v[0] as f32 / 128.0),
    param("P195", "ABS/VDC Front Wheel Mean Wheel Speed", "", cap(71, 6), [0x00, 0x02, 0x94], 1,
        Unit::Mph, |v| v[0] as f32 * 143.0 / 255.0),
    param("P196", "ABS/VDC Rear Wheel Mean Wheel Speed", "", cap(71, 5), [0x00, 0x02, 0x95], 1,
        Unit::Mph, |v| v[0] as f32 * 143.0 / 255.0),
    param("P197", "Automatic Transmission Fluid (ATF) Deterioration Degree", "",
        cap(71, 4), [0x00, 0x02, 0x96], 2, Unit::Percent, |v| u16_be(v) * 40.0 / 13107.0),
    param("P198", "Accumulated Count of Overspeed Instances (Very High RPM)", "",
        cap(72, 7), [0x00, 0x02, 0x98], 1, Unit::Time, |v| v[0] as f32),
    param("P199", "Accumulated Count of Overspeed Instances (High RPM)", "",
        cap(72, 6), [0x00, 0x02, 0x99], 1, Unit::Time, |v| v[0] as f32),
    param("P204", "Actual Common Rail Pressure (Time Synchronized)", "",
        cap(72, 5), [0x00, 0x02, 0x1F], 1, Unit::Mpa, |v| v[0] as f32),
    param("P205", "Estimated Distance to Oil Change", "", cap(72, 4), [0x00, 0x02, 0x9A], 1,
        Unit::Miles, |v| v[0] as f32 * 62.0),
    param("P206", "Running Distance since last Diesel Particulate Filter (DPF) Regeneration", "",
        cap(72, 3), [0x00, 0x02, 0x9B], 2, Unit::Kilometers, u16_be),
    param("P207", "Diesel Particulate Filter (DPF) Regeneration Count", "",
        cap(72, 2), [0x00, 0x02, 0x9D], 2, Unit::Times, u16_be),
    param("P208", "Micro-Quantity-Injection Final Learning Value 1-1",
        "Injector learning value for idling for PL-CYL, where PL = common rail pressure level, CYL = cylinder number.",
        cap(72, 1), [0x00, 0x02, 0x3D], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P209", "Micro-Quantity-Injection Final Learning Value 1-2", "",
        cap(72, 0), [0x00, 0x02, 0x3E], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P210", "Micro-Quantity-Injection Final Learning Value 1-3", "",
        cap(73, 7), [0x00, 0x02, 0x3F], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P211", "Micro-Quantity-Injection Final Learning Value 1-4", "",
        cap(73, 6), [0x00, 0x02, 0x40], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P212", "Micro-Quantity-Injection Final Learning Value 2-1", "",
        cap(73, 5), [0x00, 0x02, 0x41], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P213", "Micro-Quantity-Injection Final Learning Value 2-2", "",
        cap(73, 4), [0x00, 0x02, 0x42], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P214", "Micro-Quantity-Injection Final Learning Value 2-3", "",
        cap(73, 3), [0x00, 0x02, 0x43], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P215", "Micro-Quantity-Injection Final Learning Value 2-4", "",
        cap(73, 2), [0x00, 0x02, 0x44], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P216", "Micro-Quantity-Injection Final Learning Value 3-1", "",
        cap(73, 1), [0x00, 0x02, 0x45], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P217", "Micro-Quantity-Injection Final Learning Value 3-2", "",
        cap(73, 0), [0x00, 0x02, 0x46], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P218", "Micro-Quantity-Injection Final Learning Value 3-3", "",
        cap(74, 7), [0x00, 0x02, 0x47], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P219", "Micro-Quantity-Injection Final Learning Value 3-4", "",
        cap(74, 6), [0x00, 0x02, 0x48], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P220", "Micro-Quantity-Injection Final Learning Value 4-1", "",
        cap(74, 5), [0x00, 0x02, 0x49], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P221", "Micro-Quantity-Injection Final Learning Value 4-2", "",
        cap(74, 4), [0x00, 0x02, 0x4A], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P222", "Micro-Quantity-Injection Final Learning Value 4-3", "",
        cap(74, 3), [0x00, 0x02, 0x4B], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P223", "Micro-Quantity-Injection Final Learning Value 4-4", "",
        cap(74, 2), [0x00, 0x02, 0x4C], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P224", "Micro-Quantity-Injection Final Learning Value 5-1", "",
        cap(74, 1), [0x00, 0x02, 0x4D], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P225", "Micro-Quantity-Injection Final Learning Value 5-2", "",
        cap(74, 0), [0x00, 0x02, 0x4E], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P226", "Micro-Quantity-Injection Final Learning Value 5-3", "",
        cap(76, 7), [0x00, 0x02, 0x4F], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P227", "Micro-Quantity-Injection Final Learning Value 5-4", "",
        cap(76, 6), [0x00, 0x02, 0x50], 1, Unit::Microseconds, |v| (v[0] as f32 - 128.0) * 5.0),
    param("P228", "Individual Pump Difference Learning Value", "",
        cap(76, 5), [0x00, 0x02, 0x38], 2, Unit::Milliamps, |v| u16_be(v) - 1000.0),
    param("P229", "Final Main Injection Period", "", cap(76, 4), [0x00, 0x02, 0x57], 2,
        Unit::Microseconds, u16_be),
    param("P233", "Pre-Injection Final Period", "Diesel parameter.",
        cap(60, 6), [0x00, 0x02, 0x55], 2, Unit::Microseconds, u16_be),
    param("P234", "Pre-Injection Amount", "", cap(60, 6), [0x00, 0x02, 0x2F], 2,
        Unit::CubicMmPerStroke, |v| u16_be(v) / 256.0 - 30.0),
    param("P235", "Pre-Injection Interval", "Start of injection of pre-injection.",
        cap(60, 6), [0x00, 0x02, 0x31], 1, Unit::DegreesCrankAngle, |v| v[0] as f32 / 50.0),
    param("P236", "Cumulative Oil Diesel Entry",
        "Cumulative amount of diesel fuel in the engine oil.",
        cap(60, 6), [0x00, 0x02, 0xA2], 1, Unit::Grams, |v| v[0] as f32 * 5.0),
    param("P238", "Final Initial Torque", "Final initial torque including all limiters.",
        cap(60, 6), [0x00, 0x02, 0x32], 2, Unit::NewtonMeters, |v| u16_be(v) - 50.0),
    param("P239", "Global Timing User Adjustment Value",
        "The fixed amount of timing removed globally - set by the user.",
        cap(8, 0), [0x00, 0x00, 0x6F], 1, Unit::Degrees, |v| 0.0 - v[0] as f32),
    param("P240", "Engine Idle Speed User Adjustment (A/C off)",
        "The fixed amount of idle speed adjustment while the A/C is off - set by the user.",
        cap(8, 0), [0x00, 0x00, 0x70], 1, Unit::Rpm, |v| v[0] as f32 * 25.0 - 3200.0),
    param("P241", "Engine Idle Speed User Adjustment (A/C on)",
        "The fixed amount of idle speed adjustment while the A/C is on - set by the user.",
        cap(8, 0), [0x00, 0x00, 0x71], 1, Unit::Rpm, |v| v[0] as f32 * 25.0 - 3200.0),
    param("P244", "Secondary Air Piping Pressure", "", cap(41, 7), [0x00, 0x01, 0x08], 1,
        Unit::Kpa, |v| v[0] as f32),
    param("P245", "Secondary Air Flow", "", cap(41, 6), [0x00, 0x01, 0x82], 2,
        Unit::GramsPerSecond, |v| u16_be(v) / 100.0),
];

/// Every derived parameter, in stable id order. Evaluation follows this
/// order, so expressions may read earlier derived values from the map.
pub static DERIVED_PARAMETERS: &[DerivedParameter] = &[
    derived("P200", "Engine Load (Calculated)",
        "Engine load as calculated from MAF and RPM.",
        &["P8", "P12"], Unit::GramsPerRev,
        |v| Ok(dep(v, "P12").value * 60.0 / dep(v, "P8").value)),
    derived("P201", "Injector Duty Cycle",
        "IDC as calculated from RPM and injector pulse width.",
        &["P8", "P21"], Unit::Percent,
        |v| Ok(dep(v, "P8").value * dep(v, "P21").safe_convert_to(Unit::Microseconds).value / 1200.0)),
    derived("P202", "Manifold Relative Pressure (Corrected)",
        "Difference between manifold absolute pressure and atmospheric pressure.",
        &["P7", "P24"], Unit::Psi,
        |v| {
            Ok(dep(v, "P7").safe_convert_to(Unit::Kpa).value
                - dep(v, "P24").safe_convert_to(Unit::Kpa).value)
        }),
    derived("P203", "Fuel Consumption (Est.)",
        "Estimated fuel consumption based on MAF, AFR and vehicle speed.",
        &["P9", "P12", "P58"], Unit::MpgUs,
        |v| {
            let speed = dep(v, "P9").safe_convert_to(Unit::Kmh).value / 3600.0;
            let fuel = dep(v, "P12").value / dep(v, "P58").safe_convert_to(Unit::Lambda).value;
            Ok(speed / (fuel / 2880.0))
        }),
    derived("P230", "Final Injection Amount (Fuel Temperature Corrected)", "",
        &["P156", "P31"], Unit::MilligramsPerCylinder,
        |v| {
            let density = 835.0 - 0.7 * (dep(v, "P31").safe_convert_to(Unit::Celsius).value - 15.0);
            Ok(dep(v, "P156").value * density / 1000.0)
        }),
    derived("P231", "Angle of Main Injection", "",
        &["P229", "P8"], Unit::DegreesCrankAngle,
        |v| {
            let period = dep(v, "P229").safe_convert_to(Unit::Microseconds).value;
            Ok(period / (2777.77 / (dep(v, "P8").value / 60.0)))
        }),
    derived("P232", "Lambda (Smoke Behaviour)", "",
        &["P160", "P230"], Unit::Lambda,
        |v| Ok(dep(v, "P160").value / dep(v, "P230").value / 14.7)),
    derived("P237", "Air Mass/Charge Pressure Coefficient (TD)",
        "Coefficient for determining the turbocharger efficiency.",
        &["P160", "P7"], Unit::Coefficient,
        |v| Ok(dep(v, "P160").value / dep(v, "P7").safe_convert_to(Unit::Kpa).value)),
    derived("P242", "Volumetric Efficiency 2.0L (Calculated)",
        "VE calculated from calculated load, IAT and absolute manifold pressure, assuming an engine displacement of 122.04 CID (EJ207).",
        &["P200", "P11", "P7"], Unit::Percent,
        |v| {
            let load = dep(v, "P200").value;
            let iat = dep(v, "P11").safe_convert_to(Unit::Celsius).value;
            let map = dep(v, "P7").safe_convert_to(Unit::Kpa).value;
            Ok(load * 2.0 * 8.314472 * (iat + 273.15) / (map * 2.0 * 28.97) * 100.0)
        }),
    derived("P243", "Volumetric Efficiency 2.5L (Calculated)",
        "VE calculated from calculated load, IAT and absolute manifold pressure, assuming an engine displacement of 149.9 CID (EJ257).",
        &["P200", "P11", "P7"], Unit::Percent,
        |v| {
            let load = dep(v, "P200").value;
            let iat = dep(v, "P11").safe_convert_to(Unit::Celsius).value;
            let map = dep(v, "P7").safe_convert_to(Unit::Kpa).value;
            Ok(load * 2.0 * 8.314472 * (iat + 273.15) / (map * 2.5 * 28.97) * 100.0)
        }),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_add() {
        let a = Address { address: [0x10, 0x4F, 0x3A], length: 1 };
        assert_eq!(a.add(0), [0x10, 0x4F, 0x3A]);

        let a = Address { address: [0x00, 0x00, 0x00], length: 1 };
        assert_eq!(a.add(1), [0x00, 0x00, 0x01]);

        let a = Address { address: [0x1F, 0xFF, 0xFF], length: 1 };
        assert_eq!(a.add(36), [0x20, 0x00, 0x23]);
    }

    #[test]
    fn ids_are_unique_and_lengths_sane() {
        let mut seen = std::collections::HashSet::new();
        for p in PARAMETERS {
            assert!(seen.insert(p.id), "duplicate parameter id {}", p.id);
            assert!(p.address.length == 1 || p.address.length == 2, "{}", p.id);
            assert!(p.capability.bit < 8, "{}", p.id);
        }
        for d in DERIVED_PARAMETERS {
            assert!(seen.insert(d.id), "duplicate derived id {}", d.id);
        }
    }

    #[test]
    fn two_byte_decode_is_big_endian_u16() {
        let rpm = parameter("P8").unwrap();
        // 0x1A40 = 6720, /4 = 1680 rpm
        let v = rpm.decode(&[0x1A, 0x40]);
        assert_eq!(v.unit, Unit::Rpm);
        assert!((v.value - 1680.0).abs() < f32::EPSILON);

        let maf = parameter("P12").unwrap();
        let v = maf.decode(&[0x01, 0x00]);
        assert!((v.value - 2.56).abs() < 0.001);
        assert_eq!(v.unit, Unit::GramsPerSecond);
    }

    #[test]
    fn single_byte_decode() {
        let coolant = parameter("P2").unwrap();
        let v = coolant.decode(&[0x8C]);
        assert_eq!(v.unit, Unit::Celsius);
        assert!((v.value - 100.0).abs() < f32::EPSILON);

        let battery = parameter("P17").unwrap();
        let v = battery.decode(&[0xA0]);
        assert!((v.value - 12.8).abs() < 0.001);
    }

    #[test]
    fn injector_pulse_width_is_microseconds() {
        assert_eq!(parameter("P21").unwrap().unit, Unit::Microseconds);
        assert_eq!(parameter("P22").unwrap().unit, Unit::Microseconds);
    }

    #[test]
    fn convert_to_and_safe_convert_to() {
        let v = ParameterValue { value: 25.0, unit: Unit::Mph };
        let converted = v.convert_to(Unit::Kmh).unwrap();
        assert!((converted.value - 40.2335).abs() < 0.001);
        assert_eq!(converted.unit, Unit::Kmh);

        assert!(v.convert_to(Unit::Gear).is_err());

        let fallback = v.safe_convert_to(Unit::Afr);
        assert_eq!(fallback.value, 0.0);
        assert_eq!(fallback.unit, Unit::Afr);

        let same = v.convert_to(Unit::Mph).unwrap();
        assert_eq!(same.value, 25.0);
    }

    #[test]
    fn derived_engine_load() {
        let load = derived_parameter("P200").unwrap();
        let mut values = ParameterValues::new();
        values.insert("P8", ParameterValue { value: 3000.0, unit: Unit::Rpm });
        values.insert("P12", ParameterValue { value: 50.0, unit: Unit::GramsPerSecond });
        let v = load.evaluate(&values).unwrap();
        assert_eq!(v.unit, Unit::GramsPerRev);
        assert!((v.value - 1.0).abs() < 0.001);
    }

    #[test]
    fn derived_injector_duty_cycle_normalises_units() {
        let idc = derived_parameter("P201").unwrap();
        let mut values = ParameterValues::new();
        values.insert("P8", ParameterValue { value: 6000.0, unit: Unit::Rpm });
        values.insert("P21", ParameterValue { value: 10_000.0, unit: Unit::Microseconds });
        let v = idc.evaluate(&values).unwrap();
        assert_eq!(v.unit, Unit::Percent);
        assert!((v.value - 50_000.0).abs() < 0.1);
    }

    #[test]
    fn available_derived_requires_all_dependencies() {
        let supported: Vec<_> = ["P7", "P8", "P12", "P21", "P24"]
            .iter()
            .map(|id| parameter(id).unwrap())
            .collect();
        let derived = available_derived_parameters(&supported);
        let ids: Vec<_> = derived.iter().map(|d| d.id).collect();
        assert!(ids.contains(&"P200"));
        assert!(ids.contains(&"P201"));
        assert!(ids.contains(&"P202"));
        // P203 needs P9 and P58, which are absent
        assert!(!ids.contains(&"P203"));
    }
}
