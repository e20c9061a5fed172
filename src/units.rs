//! Units of measurement for decoded parameter values, plus the directed
//! conversion graph between them.
//!
//! The set of tags is closed: every decoder in [`crate::parameters`] tags
//! its output with one of these. Conversions are pure `f32 -> f32`
//! functions; an edge that doesn't exist yields
//! [`Error::InvalidConversion`]. Converting a unit to itself always
//! succeeds and returns the value unchanged.

use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A unit tag for a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Unit {
    // Velocity
    Mph,
    Kmh,
    // Distance
    Miles,
    Kilometers,
    // Rotational speed
    Rpm,
    // Timing
    Degrees,
    // Temperature
    Fahrenheit,
    Celsius,
    // Pressure
    Psi,
    Bar,
    Kpa,
    Hpa,
    Mpa,
    InHg,
    MmHg,
    // Airflow
    GramsPerSecond,
    // Fueling
    Afr,
    Lambda,
    DegreesCrankAngle,
    CubicMmPerStroke,
    MilligramsPerCylinder,
    // Fuel efficiency
    MpgUs,
    MpgUk,
    KmPerLiter,
    LitersPer100Km,
    // Electricity
    Volts,
    Amps,
    Milliamps,
    Ohms,
    // Time
    Time,
    Milliseconds,
    Microseconds,
    // Misc
    Percent,
    Steps,
    Gear,
    Count,
    MisfireCount,
    Multiplier,
    Index,
    Raw,
    DegreesPerSecond,
    MetersPerSecondSquared,
    GramsPerRev,
    Times,
    Grams,
    Coefficient,
    NewtonMeters,
}

impl Unit {
    /// Every unit tag, in declaration order.
    pub const ALL: &'static [Unit] = &[
        Unit::Mph,
        Unit::Kmh,
        Unit::Miles,
        Unit::Kilometers,
        Unit::Rpm,
        Unit::Degrees,
        Unit::Fahrenheit,
        Unit::Celsius,
        Unit::Psi,
        Unit::Bar,
        Unit::Kpa,
        Unit::Hpa,
        Unit::Mpa,
        Unit::InHg,
        Unit::MmHg,
        Unit::GramsPerSecond,
        Unit::Afr,
        Unit::Lambda,
        Unit::DegreesCrankAngle,
        Unit::CubicMmPerStroke,
        Unit::MilligramsPerCylinder,
        Unit::MpgUs,
        Unit::MpgUk,
        Unit::KmPerLiter,
        Unit::LitersPer100Km,
        Unit::Volts,
        Unit::Amps,
        Unit::Milliamps,
        Unit::Ohms,
        Unit::Time,
        Unit::Milliseconds,
        Unit::Microseconds,
        Unit::Percent,
        Unit::Steps,
        Unit::Gear,
        Unit::Count,
        Unit::MisfireCount,
        Unit::Multiplier,
        Unit::Index,
        Unit::Raw,
        Unit::DegreesPerSecond,
        Unit::MetersPerSecondSquared,
        Unit::GramsPerRev,
        Unit::Times,
        Unit::Grams,
        Unit::Coefficient,
        Unit::NewtonMeters,
    ];

    /// Looks a unit up by its display symbol (e.g. `"km/h"`).
    pub fn from_symbol(symbol: &str) -> Option<Unit> {
        Unit::ALL.iter().copied().find(|u| u.to_string() == symbol)
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Unit::Mph => "mph",
            Unit::Kmh => "km/h",
            Unit::Miles => "miles",
            Unit::Kilometers => "km",
            Unit::Rpm => "rpm",
            Unit::Degrees => "degrees",
            Unit::Fahrenheit => "F",
            Unit::Celsius => "C",
            Unit::Psi => "psi",
            Unit::Bar => "bar",
            Unit::Kpa => "kPa",
            Unit::Hpa => "hPa",
            Unit::Mpa => "MPa",
            Unit::InHg => "inHg",
            Unit::MmHg => "mmHg",
            Unit::GramsPerSecond => "g/s",
            Unit::Afr => "AFR",
            Unit::Lambda => "Lambda",
            Unit::DegreesCrankAngle => "°CA",
            Unit::CubicMmPerStroke => "mm³/st",
            Unit::MilligramsPerCylinder => "mg/cyl",
            Unit::MpgUs => "mpg (US)",
            Unit::MpgUk => "mpg (UK)",
            Unit::KmPerLiter => "km/l",
            Unit::LitersPer100Km => "l/100k",
            Unit::Volts => "V",
            Unit::Amps => "A",
            Unit::Milliamps => "mA",
            Unit::Ohms => "ohm",
            Unit::Time => "Time",
            Unit::Milliseconds => "ms",
            Unit::Microseconds => "µs",
            Unit::Percent => "%",
            Unit::Steps => "steps",
            Unit::Gear => "gear",
            Unit::Count => "count",
            Unit::MisfireCount => "misfire count",
            Unit::Multiplier => "multiplier",
            Unit::Index => "index",
            Unit::Raw => "raw ecu value",
            Unit::DegreesPerSecond => "degrees/s",
            Unit::MetersPerSecondSquared => "m/s²",
            Unit::GramsPerRev => "g/rev",
            Unit::Times => "Times",
            Unit::Grams => "g",
            Unit::Coefficient => "coefficient",
            Unit::NewtonMeters => "Nm",
        };
        f.write_str(symbol)
    }
}

/// Converts a value between units.
///
/// Self-conversion is the identity. The conversion table is append-only and
/// currently covers velocity (mph/km/h), temperature (°F/°C), and a full
/// clique among the pressure units.
pub fn convert(value: f32, from: Unit, to: Unit) -> Result<f32, Error> {
    use Unit::*;

    if from == to {
        return Ok(value);
    }

    let converted = match (from, to) {
        (Mph, Kmh) => value * 1.60934,
        (Kmh, Mph) => value * 0.621371,

        (Fahrenheit, Celsius) => (value - 32.0) / 9.0 * 5.0,
        (Celsius, Fahrenheit) => (value / 5.0 * 9.0) + 32.0,

        (Kpa, Psi) => value * 37.0 / 255.0,
        (Kpa, Bar) => value / 100.0,
        (Kpa, Hpa) => value * 10.0,
        (Kpa, InHg) => value * 0.2953,
        (Kpa, MmHg) => value * 7.5,

        (Psi, Kpa) => value * 255.0 / 37.0,
        (Psi, Bar) => value * 0.068_947_57,
        (Psi, Hpa) => value * 2550.0 / 37.0,
        (Psi, InHg) => value * 2.03602,
        (Psi, MmHg) => value * 51.7149,

        (Bar, Psi) => value * 14.5038,
        (Bar, Kpa) => value * 100.0,
        (Bar, Hpa) => value * 1000.0,
        (Bar, InHg) => value * 29.53,
        (Bar, MmHg) => value * 750.062,

        (Hpa, Psi) => value * 0.0145038,
        (Hpa, Bar) => value / 1000.0,
        (Hpa, Kpa) => value / 10.0,
        (Hpa, InHg) => value * 0.029_529_983,
        (Hpa, MmHg) => value * 0.750_061_58,

        (InHg, Psi) => value * 0.491154,
        (InHg, Bar) => value * 0.0338639,
        (InHg, Kpa) => value * 3.386_388_7,
        (InHg, Hpa) => value * 33.863_887,
        (InHg, MmHg) => value * 25.4,

        (MmHg, Psi) => value * 0.0193368,
        (MmHg, Bar) => value * 0.00133322,
        (MmHg, Kpa) => value * 0.13332239,
        (MmHg, Hpa) => value * 1.3332239,
        (MmHg, InHg) => value * 0.0393701,

        _ => return Err(Error::InvalidConversion),
    };

    Ok(converted)
}

/// Converts a value between units, falling back to the zero of the target
/// unit when no conversion edge exists. Never fails.
pub fn safe_convert(value: f32, from: Unit, to: Unit) -> f32 {
    convert(value, from, to).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion() {
        for unit in [Unit::Afr, Unit::Gear, Unit::Kpa, Unit::Raw] {
            assert_eq!(convert(12.5, unit, unit).unwrap(), 12.5);
        }
    }

    #[test]
    fn mph_to_kmh() {
        let v = convert(25.0, Unit::Mph, Unit::Kmh).unwrap();
        assert!((v - 40.2335).abs() < 0.001, "got {v}");
    }

    #[test]
    fn invalid_edge() {
        assert!(matches!(
            convert(25.0, Unit::Mph, Unit::Gear),
            Err(Error::InvalidConversion)
        ));
    }

    #[test]
    fn safe_convert_falls_back_to_zero() {
        assert_eq!(safe_convert(25.0, Unit::Mph, Unit::Afr), 0.0);
        assert!((safe_convert(25.0, Unit::Mph, Unit::Kmh) - 40.2335).abs() < 0.001);
    }

    #[test]
    fn pressure_clique_is_complete() {
        let pressures = [Unit::Kpa, Unit::Psi, Unit::Bar, Unit::Hpa, Unit::InHg, Unit::MmHg];
        for from in pressures {
            for to in pressures {
                assert!(
                    convert(1.0, from, to).is_ok(),
                    "missing conversion {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn symbols_round_trip() {
        for unit in Unit::ALL.iter().copied() {
            assert_eq!(Unit::from_symbol(&unit.to_string()), Some(unit));
        }
        assert_eq!(Unit::from_symbol("km/h"), Some(Unit::Kmh));
        assert_eq!(Unit::from_symbol("furlongs"), None);
    }

    #[test]
    fn fahrenheit_celsius_round_trip() {
        let c = convert(212.0, Unit::Fahrenheit, Unit::Celsius).unwrap();
        assert!((c - 100.0).abs() < 0.001);
        let f = convert(100.0, Unit::Celsius, Unit::Fahrenheit).unwrap();
        assert!((f - 212.0).abs() < 0.001);
    }
}
