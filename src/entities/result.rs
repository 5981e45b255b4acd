//! Calculation output - per-component results and the aggregated report

use serde::{Deserialize, Serialize};

use crate::entities::component::{ComponentInput, Family, Field};

/// One π-factor in the uniform result shape
///
/// `NotApplicable` marks a factor the family's model does not define. A
/// neutral factor the model does define (πSR for a non-tantalum style) is
/// `Value(1.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Factor {
    Value(f64),
    NotApplicable,
}

impl Factor {
    pub fn value(&self) -> Option<f64> {
        match self {
            Factor::Value(v) => Some(*v),
            Factor::NotApplicable => None,
        }
    }
}

impl Default for Factor {
    fn default() -> Self {
        Factor::NotApplicable
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Factor::Value(v) => write!(f, "{}", format_factor(*v)),
            Factor::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// Four significant digits, switching to exponent form for very small values
pub fn format_factor(value: f64) -> String {
    if value != 0.0 && value.abs() < 1e-3 {
        format!("{:.3e}", value)
    } else {
        let s = format!("{:.4}", value);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        s.to_string()
    }
}

/// Every π-factor any family can carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Factors {
    /// Temperature
    pub pi_t: Factor,
    /// Capacitance
    pub pi_c: Factor,
    /// Voltage stress
    pub pi_v: Factor,
    /// Series resistance
    pub pi_sr: Factor,
    /// Power stress
    pub pi_p: Factor,
    /// Power rating
    pub pi_s: Factor,
    /// Quality
    pub pi_q: Factor,
    /// Environment
    pub pi_e: Factor,
}

impl Factors {
    /// Factor labels in report column order
    pub const LABELS: [&'static str; 8] = ["πT", "πC", "πV", "πSR", "πP", "πS", "πQ", "πE"];

    /// All factors in report column order
    pub fn ordered(&self) -> [Factor; 8] {
        [
            self.pi_t, self.pi_c, self.pi_v, self.pi_sr, self.pi_p, self.pi_s, self.pi_q,
            self.pi_e,
        ]
    }

    /// Applicable factors with their labels
    pub fn applicable(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Self::LABELS
            .iter()
            .zip(self.ordered())
            .filter_map(|(label, factor)| factor.value().map(|v| (*label, v)))
    }

    /// Product of every applicable factor
    pub fn product(&self) -> f64 {
        self.applicable().map(|(_, v)| v).product()
    }
}

/// What a family model produces for one component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub lambda_b: f64,
    pub factors: Factors,
    pub lambda_p: f64,
}

impl Evaluation {
    /// λp = λb times every applicable factor
    pub fn from_factors(lambda_b: f64, factors: Factors) -> Self {
        Self {
            lambda_b,
            factors,
            lambda_p: lambda_b * factors.product(),
        }
    }
}

/// Non-fatal condition attached to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    HighPowerStress,
    VoltageOverstress,
    TemperatureOutsideRating,
    ZeroRatedPower,
    IgnoredSeriesResistance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub field: Field,
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    pub fn new(field: Field, kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Per-component output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub part_number: String,

    pub family: Family,
    /// Style or inductor type code
    pub selector: String,
    pub temperature: f64,
    pub quality_level: String,
    pub environment: String,

    pub lambda_b: f64,
    #[serde(flatten)]
    pub factors: Factors,
    /// Failures per 10^6 hours
    pub lambda_p: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Advisory>,
}

impl ComponentResult {
    /// Build a result, echoing the identity fields of `input`
    pub fn new(
        index: usize,
        input: &ComponentInput,
        lambda_b: f64,
        factors: Factors,
        lambda_p: f64,
        advisories: Vec<Advisory>,
    ) -> Self {
        Self {
            name: input.display_name(index),
            description: input.description.clone(),
            manufacturer: input.manufacturer.clone(),
            part_number: input.part_number.clone(),
            family: input.family(),
            selector: input.parameters.selector().to_string(),
            temperature: input.temperature,
            quality_level: input.quality_level.clone(),
            environment: input.environment.clone(),
            lambda_b,
            factors,
            lambda_p,
            advisories,
        }
    }
}

/// Aggregated calculation output, components in submission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub components: Vec<ComponentResult>,
    pub total_lambda_p: f64,
}

impl Report {
    /// Sum already-computed results; order is kept as given
    pub fn aggregate(components: Vec<ComponentResult>) -> Self {
        let total_lambda_p = components.iter().map(|c| c.lambda_p).sum();
        Self {
            components,
            total_lambda_p,
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Mean time between failures in hours, None when the total is zero
    pub fn mtbf_hours(&self) -> Option<f64> {
        if self.total_lambda_p > 0.0 {
            Some(1e6 / self.total_lambda_p)
        } else {
            None
        }
    }

    /// λp summed per family, in family order, families present only
    pub fn subtotals(&self) -> Vec<(Family, f64)> {
        Family::all()
            .iter()
            .filter_map(|family| {
                let mut members = self.components.iter().filter(|c| c.family == *family).peekable();
                members.peek()?;
                Some((*family, members.map(|c| c.lambda_p).sum()))
            })
            .collect()
    }

    /// Every advisory with the name of the component it belongs to
    pub fn advisories(&self) -> impl Iterator<Item = (&str, &Advisory)> {
        self.components
            .iter()
            .flat_map(|c| c.advisories.iter().map(move |a| (c.name.as_str(), a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, family: Family, lambda_p: f64) -> ComponentResult {
        let input = match family {
            Family::Capacitor => ComponentInput::capacitor("CKR", 1.0, 0.5, "M", "GB", 25.0),
            Family::Resistor => ComponentInput::resistor("RCR", 0.25, 0.4, "M", "GB", 25.0),
            Family::Inductor => ComponentInput::inductor("FIXED", "M", "GB", 25.0),
        }
        .with_name(name);
        ComponentResult::new(0, &input, lambda_p, Factors::default(), lambda_p, Vec::new())
    }

    #[test]
    fn test_aggregate_sums_and_keeps_order() {
        let report = Report::aggregate(vec![
            result("R1", Family::Resistor, 0.002),
            result("C1", Family::Capacitor, 0.001),
            result("L1", Family::Inductor, 0.0005),
        ]);
        let names: Vec<_> = report.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["R1", "C1", "L1"]);
        assert!((report.total_lambda_p - 0.0035).abs() < 1e-15);
        assert_eq!(report.component_count(), 3);
    }

    #[test]
    fn test_empty_report() {
        let report = Report::aggregate(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.total_lambda_p, 0.0);
        assert_eq!(report.mtbf_hours(), None);
        assert!(report.subtotals().is_empty());
    }

    #[test]
    fn test_mtbf_and_subtotals() {
        let report = Report::aggregate(vec![
            result("C1", Family::Capacitor, 0.25),
            result("R1", Family::Resistor, 0.5),
            result("C2", Family::Capacitor, 0.25),
        ]);
        assert_eq!(report.mtbf_hours(), Some(1e6));
        assert_eq!(
            report.subtotals(),
            vec![(Family::Capacitor, 0.5), (Family::Resistor, 0.5)]
        );
    }

    #[test]
    fn test_factor_product_skips_not_applicable() {
        let factors = Factors {
            pi_q: Factor::Value(3.0),
            pi_e: Factor::Value(2.0),
            pi_sr: Factor::Value(1.0),
            ..Factors::default()
        };
        assert_eq!(factors.product(), 6.0);
        assert_eq!(factors.applicable().count(), 3);
        assert_eq!(factors.pi_t, Factor::NotApplicable);
    }

    #[test]
    fn test_not_applicable_serializes_as_null() {
        let factors = Factors {
            pi_q: Factor::Value(1.0),
            ..Factors::default()
        };
        let json = serde_json::to_value(factors).unwrap();
        assert_eq!(json["pi_q"], serde_json::json!(1.0));
        assert!(json["pi_c"].is_null());

        let back: Factors = serde_json::from_value(json).unwrap();
        assert_eq!(back, factors);
    }

    #[test]
    fn test_factor_display() {
        assert_eq!(Factor::NotApplicable.to_string(), "n/a");
        assert_eq!(Factor::Value(1.0).to_string(), "1");
        assert_eq!(Factor::Value(1.3125).to_string(), "1.3125");
        assert_eq!(format_factor(0.00004), "4.000e-5");
    }
}
