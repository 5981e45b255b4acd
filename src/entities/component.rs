//! Component input records - the tagged union submitted for calculation

use serde::{Deserialize, Serialize};

/// Component family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Capacitor,
    Resistor,
    Inductor,
}

impl Family {
    /// All families, in report order
    pub fn all() -> &'static [Family] {
        &[Family::Capacitor, Family::Resistor, Family::Inductor]
    }

    /// Keys of this family's parameter record in a component set file
    pub fn parameter_keys(&self) -> &'static [&'static str] {
        match self {
            Family::Capacitor => &["style", "capacitance", "voltage_stress", "series_resistance"],
            Family::Resistor => &["style", "watts", "power_stress"],
            Family::Inductor => &["inductor_type"],
        }
    }

    /// Capitalized label used for generated component names
    pub fn label(&self) -> &'static str {
        match self {
            Family::Capacitor => "Capacitor",
            Family::Resistor => "Resistor",
            Family::Inductor => "Inductor",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Capacitor => write!(f, "capacitor"),
            Family::Resistor => write!(f, "resistor"),
            Family::Inductor => write!(f, "inductor"),
        }
    }
}

impl std::str::FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "capacitor" | "cap" => Ok(Family::Capacitor),
            "resistor" | "res" => Ok(Family::Resistor),
            "inductor" | "ind" => Ok(Family::Inductor),
            _ => Err(format!(
                "Invalid component family: {}. Use capacitor, resistor, or inductor",
                s
            )),
        }
    }
}

/// Input field names, used to pin validation messages and advisories to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Description,
    Style,
    InductorType,
    Capacitance,
    VoltageStress,
    SeriesResistance,
    Watts,
    PowerStress,
    Temperature,
    QualityLevel,
    Environment,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Description => "description",
            Field::Style => "style",
            Field::InductorType => "inductor_type",
            Field::Capacitance => "capacitance",
            Field::VoltageStress => "voltage_stress",
            Field::SeriesResistance => "series_resistance",
            Field::Watts => "watts",
            Field::PowerStress => "power_stress",
            Field::Temperature => "temperature",
            Field::QualityLevel => "quality_level",
            Field::Environment => "environment",
        };
        write!(f, "{}", name)
    }
}

/// Capacitor-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitorParams {
    /// Style code (e.g. "CSR13", "CKR")
    #[serde(default)]
    pub style: String,

    /// Capacitance in microfarads
    pub capacitance: f64,

    /// Applied to rated voltage ratio, 0 to 1.5
    pub voltage_stress: f64,

    /// Circuit resistance per volt applied (CR, ohm/V); only tantalum styles use it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_resistance: Option<f64>,
}

/// Resistor-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistorParams {
    /// Style code (e.g. "RCR", "RLR")
    #[serde(default)]
    pub style: String,

    /// Rated power in watts
    pub watts: f64,

    /// Operating to rated power ratio, 0 to 1
    pub power_stress: f64,
}

/// Inductor-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductorParams {
    /// Inductor type code (e.g. "FIXED")
    #[serde(default)]
    pub inductor_type: String,
}

/// Family-specific parameters; the tag selects exactly one sub-record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartParameters {
    Capacitor(CapacitorParams),
    Resistor(ResistorParams),
    Inductor(InductorParams),
}

impl PartParameters {
    pub fn family(&self) -> Family {
        match self {
            PartParameters::Capacitor(_) => Family::Capacitor,
            PartParameters::Resistor(_) => Family::Resistor,
            PartParameters::Inductor(_) => Family::Inductor,
        }
    }

    /// The style or inductor type code that selects the base failure rate
    pub fn selector(&self) -> &str {
        match self {
            PartParameters::Capacitor(c) => &c.style,
            PartParameters::Resistor(r) => &r.style,
            PartParameters::Inductor(i) => &i.inductor_type,
        }
    }

    /// Field that carries the selector for this family
    pub fn selector_field(&self) -> Field {
        match self {
            PartParameters::Inductor(_) => Field::InductorType,
            _ => Field::Style,
        }
    }
}

/// A component parameter record submitted for calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInput {
    /// Display name; defaults to `<Family>_<n>` when empty
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub manufacturer: String,

    #[serde(default)]
    pub part_number: String,

    /// Operating temperature in degrees Celsius
    pub temperature: f64,

    /// Environment class code (e.g. "GB")
    #[serde(default)]
    pub environment: String,

    /// Quality level code (e.g. "M")
    #[serde(default)]
    pub quality_level: String,

    #[serde(flatten)]
    pub parameters: PartParameters,
}

impl ComponentInput {
    /// Keys every record carries, whatever its family; `type` is the tag
    pub const COMMON_KEYS: &'static [&'static str] = &[
        "type",
        "name",
        "description",
        "manufacturer",
        "part_number",
        "temperature",
        "environment",
        "quality_level",
    ];

    /// Whether `key` belongs on a `family` record
    ///
    /// The parameter record is flattened into the component, so serde cannot
    /// refuse stray keys itself; loaders check with this before deserializing.
    pub fn accepts_key(family: Family, key: &str) -> bool {
        Self::COMMON_KEYS.contains(&key) || family.parameter_keys().contains(&key)
    }

    /// Create a capacitor input with empty identity fields
    pub fn capacitor(
        style: impl Into<String>,
        capacitance: f64,
        voltage_stress: f64,
        quality_level: impl Into<String>,
        environment: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self::with_parameters(
            PartParameters::Capacitor(CapacitorParams {
                style: style.into(),
                capacitance,
                voltage_stress,
                series_resistance: None,
            }),
            quality_level,
            environment,
            temperature,
        )
    }

    /// Create a resistor input with empty identity fields
    pub fn resistor(
        style: impl Into<String>,
        watts: f64,
        power_stress: f64,
        quality_level: impl Into<String>,
        environment: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self::with_parameters(
            PartParameters::Resistor(ResistorParams {
                style: style.into(),
                watts,
                power_stress,
            }),
            quality_level,
            environment,
            temperature,
        )
    }

    /// Create an inductor input with empty identity fields
    pub fn inductor(
        inductor_type: impl Into<String>,
        quality_level: impl Into<String>,
        environment: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self::with_parameters(
            PartParameters::Inductor(InductorParams {
                inductor_type: inductor_type.into(),
            }),
            quality_level,
            environment,
            temperature,
        )
    }

    fn with_parameters(
        parameters: PartParameters,
        quality_level: impl Into<String>,
        environment: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            manufacturer: String::new(),
            part_number: String::new(),
            temperature,
            environment: environment.into(),
            quality_level: quality_level.into(),
            parameters,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn with_part_number(mut self, part_number: impl Into<String>) -> Self {
        self.part_number = part_number.into();
        self
    }

    /// Set the series resistance as CR (ohm/V); ignored for non-capacitor inputs
    pub fn with_series_resistance(mut self, ohms_per_volt: f64) -> Self {
        if let PartParameters::Capacitor(ref mut c) = self.parameters {
            c.series_resistance = Some(ohms_per_volt);
        }
        self
    }

    pub fn family(&self) -> Family {
        self.parameters.family()
    }

    /// Name to report, falling back to `<Family>_<position>` (1-based)
    pub fn display_name(&self, index: usize) -> String {
        if self.name.trim().is_empty() {
            format!("{}_{}", self.family().label(), index + 1)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_key_is_family_scoped() {
        assert!(ComponentInput::accepts_key(Family::Resistor, "watts"));
        assert!(ComponentInput::accepts_key(Family::Resistor, "part_number"));
        assert!(!ComponentInput::accepts_key(Family::Resistor, "capacitance"));
        assert!(!ComponentInput::accepts_key(Family::Resistor, "inductor_type"));
        assert!(ComponentInput::accepts_key(Family::Capacitor, "series_resistance"));
        assert!(!ComponentInput::accepts_key(Family::Capacitor, "series_resistanse"));
        assert!(!ComponentInput::accepts_key(Family::Inductor, "style"));
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("capacitor".parse::<Family>().unwrap(), Family::Capacitor);
        assert_eq!("RES".parse::<Family>().unwrap(), Family::Resistor);
        assert!("diode".parse::<Family>().is_err());
    }

    #[test]
    fn test_display_name_fallback() {
        let input = ComponentInput::inductor("FIXED", "M", "GB", 25.0);
        assert_eq!(input.display_name(2), "Inductor_3");

        let named = input.with_name("L1");
        assert_eq!(named.display_name(2), "L1");
    }

    #[test]
    fn test_tagged_yaml_deserialization() {
        let yaml = r#"
type: capacitor
name: C1
description: Bulk decoupling
style: CSR13
capacitance: 10
voltage_stress: 0.5
quality_level: M
environment: GB
temperature: 25
"#;
        let input: ComponentInput = serde_yml::from_str(yaml).unwrap();
        assert_eq!(input.family(), Family::Capacitor);
        assert_eq!(input.parameters.selector(), "CSR13");
        match input.parameters {
            PartParameters::Capacitor(c) => {
                assert_eq!(c.capacitance, 10.0);
                assert!(c.series_resistance.is_none());
            }
            other => panic!("expected capacitor, got {:?}", other),
        }
    }

    #[test]
    fn test_series_resistance_only_applies_to_capacitors() {
        let resistor = ComponentInput::resistor("RCR", 0.25, 0.4, "M", "GB", 25.0)
            .with_series_resistance(1.0);
        assert!(matches!(resistor.parameters, PartParameters::Resistor(_)));

        let cap = ComponentInput::capacitor("CSR", 1.0, 0.5, "M", "GB", 25.0)
            .with_series_resistance(1.0);
        match cap.parameters {
            PartParameters::Capacitor(c) => assert_eq!(c.series_resistance, Some(1.0)),
            _ => unreachable!(),
        }
    }
}
