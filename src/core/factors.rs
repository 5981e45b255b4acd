//! Stress and environment factor functions
//!
//! Every function here is pure and total over its documented domain. None of
//! them clamp their inputs: range checks belong to the validator, and a value
//! the validator lets through is computed exactly as given.

use serde::{Deserialize, Serialize};

/// Boltzmann's constant in eV/K
pub const BOLTZMANN_EV_PER_K: f64 = 8.617e-5;

/// Reference temperature for the Arrhenius factor (25 C) in kelvin
pub const REFERENCE_TEMPERATURE_K: f64 = 298.0;

/// Offset used to convert operating temperature to kelvin
pub const CELSIUS_TO_KELVIN: f64 = 273.0;

/// Voltage stress curve `(S / knee)^exponent + 1` for one capacitor voltage class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageStressCurve {
    pub knee: f64,
    pub exponent: f64,
}

/// Power stress curve `coefficient * exp(slope * S)` for one resistor stress class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerStressCurve {
    pub coefficient: f64,
    pub slope: f64,
}

/// One band of the tantalum series resistance table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesResistanceBand {
    /// Lower bound (exclusive) of circuit resistance in ohm/V
    pub above: f64,
    pub value: f64,
}

/// Series resistance bands, highest bound first, plus the value below the last band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResistanceTable {
    pub bands: Vec<SeriesResistanceBand>,
    pub otherwise: f64,
}

/// Where stress factors come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorSource {
    /// Always evaluate the closed-form equation
    #[default]
    Equation,
    /// Use the printed table value when the input sits exactly on a tabulated point
    Tabulated,
}

impl FactorSource {
    /// Pick the printed value or fall back to the equation
    pub fn resolve(
        self,
        printed: impl FnOnce() -> Option<f64>,
        equation: impl FnOnce() -> f64,
    ) -> f64 {
        match self {
            FactorSource::Equation => equation(),
            FactorSource::Tabulated => printed().unwrap_or_else(equation),
        }
    }
}

impl std::fmt::Display for FactorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorSource::Equation => write!(f, "equation"),
            FactorSource::Tabulated => write!(f, "tabulated"),
        }
    }
}

impl std::str::FromStr for FactorSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equation" => Ok(FactorSource::Equation),
            "tabulated" | "table" => Ok(FactorSource::Tabulated),
            _ => Err(format!(
                "Invalid factor source: {}. Use equation or tabulated",
                s
            )),
        }
    }
}

/// Temperature factor πT (Arrhenius)
///
/// `πT = exp(-Ea/k * (1/(T + 273) - 1/298))`, equal to 1 at 25 C.
pub fn temperature_factor(temperature_c: f64, activation_energy_ev: f64) -> f64 {
    let kelvin = temperature_c + CELSIUS_TO_KELVIN;
    (-activation_energy_ev / BOLTZMANN_EV_PER_K * (1.0 / kelvin - 1.0 / REFERENCE_TEMPERATURE_K))
        .exp()
}

/// Capacitance factor πC = C^exponent, C in microfarads
pub fn capacitance_factor(capacitance_uf: f64, exponent: f64) -> f64 {
    capacitance_uf.powf(exponent)
}

/// Voltage stress factor πV
pub fn voltage_stress_factor(stress: f64, curve: VoltageStressCurve) -> f64 {
    (stress / curve.knee).powf(curve.exponent) + 1.0
}

/// Series resistance factor πSR for tantalum styles
///
/// Bands are checked in order; the first band whose bound the resistance
/// exceeds wins.
pub fn series_resistance_factor(ohms_per_volt: f64, table: &SeriesResistanceTable) -> f64 {
    table
        .bands
        .iter()
        .find(|band| ohms_per_volt > band.above)
        .map(|band| band.value)
        .unwrap_or(table.otherwise)
}

/// Power stress factor πP, increasing with the operating/rated power ratio
pub fn power_stress_factor(stress: f64, curve: PowerStressCurve) -> f64 {
    curve.coefficient * (curve.slope * stress).exp()
}

/// Power rating factor πS = watts^exponent
pub fn power_rating_factor(watts: f64, exponent: f64) -> f64 {
    watts.powf(exponent)
}
