//! Reference tables - base failure rates, quality and environment factors
//!
//! The tables are plain serde data. The built-in MIL-HDBK-217F set is embedded
//! in the binary; a replacement document with the same shape can be loaded from
//! disk. Once loaded the tables are never mutated, so one instance can be shared
//! by any number of concurrent calculations.

use miette::Diagnostic;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::core::factors::{PowerStressCurve, SeriesResistanceTable, VoltageStressCurve};
use crate::entities::component::Family;
use crate::yaml::{parse_yaml_file, parse_yaml_str, YamlError};

#[derive(Embed)]
#[folder = "data/"]
struct EmbeddedData;

const BUILTIN_FILE: &str = "mil_hdbk_217f.yaml";

/// Tolerance for matching an input against a tabulated point
const TABULATED_MATCH_TOLERANCE: f64 = 1e-10;

/// Which table a code was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Style,
    InductorType,
    Quality,
    Environment,
    TemperatureClass,
    CapacitanceClass,
    VoltageClass,
    StressClass,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Style => write!(f, "style"),
            TableKind::InductorType => write!(f, "inductor type"),
            TableKind::Quality => write!(f, "quality level"),
            TableKind::Environment => write!(f, "environment"),
            TableKind::TemperatureClass => write!(f, "temperature class"),
            TableKind::CapacitanceClass => write!(f, "capacitance class"),
            TableKind::VoltageClass => write!(f, "voltage class"),
            TableKind::StressClass => write!(f, "stress class"),
        }
    }
}

/// A code that is not present in the table searched
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic, Serialize, Deserialize)]
#[error("unknown {table} code '{code}' in {family} tables")]
#[diagnostic(
    code(mil217::tables::unknown_code),
    help("run `mil217 tables` to list the valid codes")
)]
pub struct UnknownCodeError {
    pub family: Family,
    pub table: TableKind,
    pub code: String,
}

impl UnknownCodeError {
    pub fn new(family: Family, table: TableKind, code: impl Into<String>) -> Self {
        Self {
            family,
            table,
            code: code.into(),
        }
    }
}

/// Reference data failed to load
#[derive(Debug, Error, Diagnostic)]
pub enum TableError {
    #[error("built-in reference data '{0}' is missing from the binary")]
    #[diagnostic(code(mil217::tables::missing_builtin))]
    MissingBuiltin(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("reference data failed its integrity check:\n{}", .problems.join("\n"))]
    #[diagnostic(code(mil217::tables::integrity))]
    Integrity { problems: Vec<String> },
}

/// A code -> multiplier row (quality and environment tables)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    pub code: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A printed table row: input value and one column per construction class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedRow {
    pub at: f64,
    pub columns: Vec<f64>,
}

/// Capacitor style row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitorStyle {
    pub codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(default)]
    pub description: String,
    pub lambda_b: f64,
    pub temperature_class: u8,
    pub capacitance_class: u8,
    pub voltage_class: u8,
    /// Tantalum styles take a series resistance factor
    #[serde(default)]
    pub tantalum: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacitorTabulated {
    #[serde(default)]
    pub temperature: Vec<TabulatedRow>,
    #[serde(default)]
    pub capacitance: Vec<TabulatedRow>,
    #[serde(default)]
    pub voltage_stress: Vec<TabulatedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitorTables {
    pub styles: Vec<CapacitorStyle>,
    pub quality: Vec<FactorRow>,
    pub environment: Vec<FactorRow>,
    /// Activation energy (eV) by temperature class
    pub activation_energy: BTreeMap<u8, f64>,
    /// πC exponent by capacitance class
    pub capacitance_exponent: BTreeMap<u8, f64>,
    pub voltage_stress: BTreeMap<u8, VoltageStressCurve>,
    pub series_resistance: SeriesResistanceTable,
    #[serde(default)]
    pub tabulated: CapacitorTabulated,
}

/// Resistor style row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistorStyle {
    pub codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(default)]
    pub description: String,
    pub lambda_b: f64,
    pub temperature_class: u8,
    pub stress_class: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResistorTabulated {
    #[serde(default)]
    pub temperature: Vec<TabulatedRow>,
    #[serde(default)]
    pub power_stress: Vec<TabulatedRow>,
    #[serde(default)]
    pub power_rating: Vec<TabulatedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistorTables {
    pub styles: Vec<ResistorStyle>,
    pub quality: Vec<FactorRow>,
    pub environment: Vec<FactorRow>,
    pub activation_energy: BTreeMap<u8, f64>,
    pub power_stress: BTreeMap<u8, PowerStressCurve>,
    pub power_rating_exponent: f64,
    #[serde(default)]
    pub tabulated: ResistorTabulated,
}

/// Inductor type row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductorType {
    pub codes: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub lambda_b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductorTables {
    pub types: Vec<InductorType>,
    pub quality: Vec<FactorRow>,
    pub environment: Vec<FactorRow>,
}

/// Construction constants resolved for a capacitor style
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacitorConstruction {
    pub temperature_class: u8,
    pub activation_energy: f64,
    pub capacitance_class: u8,
    pub capacitance_exponent: f64,
    pub voltage_class: u8,
    pub voltage_curve: VoltageStressCurve,
    pub tantalum: bool,
}

/// Construction constants resolved for a resistor style
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResistorConstruction {
    pub temperature_class: u8,
    pub activation_energy: f64,
    pub stress_class: u8,
    pub stress_curve: PowerStressCurve,
    pub power_rating_exponent: f64,
}

/// Construction metadata attached to a style lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum StyleMeta {
    Capacitor(CapacitorConstruction),
    Resistor(ResistorConstruction),
    Inductor,
}

/// Result of a style (or inductor type) lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleRecord {
    pub lambda_b: f64,
    pub meta: StyleMeta,
}

/// A factor that may have printed table points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabulatedFactor {
    Temperature,
    Capacitance,
    VoltageStress,
    PowerStress,
    PowerRating,
}

/// Table lookup capability consumed by the models and the validator
pub trait TableLookup: Send + Sync {
    /// Base failure rate and construction metadata for a style or inductor type
    fn lookup_style(&self, family: Family, code: &str) -> Result<StyleRecord, UnknownCodeError>;

    /// Quality factor πQ
    fn lookup_quality(&self, family: Family, code: &str) -> Result<f64, UnknownCodeError>;

    /// Environment factor πE
    fn lookup_environment(&self, family: Family, code: &str) -> Result<f64, UnknownCodeError>;

    /// Series resistance bands for tantalum capacitors
    fn series_resistance(&self) -> &SeriesResistanceTable;

    /// Printed value for an exact tabulated input, if the tables carry one
    fn tabulated(
        &self,
        _family: Family,
        _factor: TabulatedFactor,
        _class: u8,
        _at: f64,
    ) -> Option<f64> {
        None
    }
}

/// One listing line for a reference table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEntry {
    pub codes: Vec<String>,
    pub value: f64,
    pub description: String,
}

/// The complete reference data set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub revision: String,
    pub capacitor: CapacitorTables,
    pub resistor: ResistorTables,
    pub inductor: InductorTables,
}

impl ReferenceTables {
    /// Load the embedded MIL-HDBK-217F tables
    pub fn builtin() -> Result<Self, TableError> {
        let file = EmbeddedData::get(BUILTIN_FILE)
            .ok_or_else(|| TableError::MissingBuiltin(BUILTIN_FILE.to_string()))?;
        let content = String::from_utf8_lossy(&file.data);
        Self::from_yaml_str(&content, BUILTIN_FILE)
    }

    /// Load a replacement reference data file
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let tables: ReferenceTables = parse_yaml_file(path)?;
        tables.check()?;
        Ok(tables)
    }

    /// Parse and check reference data from YAML text
    pub fn from_yaml_str(content: &str, filename: &str) -> Result<Self, TableError> {
        let tables: ReferenceTables = parse_yaml_str(content, filename)?;
        tables.check()?;
        Ok(tables)
    }

    /// Verify internal consistency: unique codes, resolvable classes, positive factors
    pub fn check(&self) -> Result<(), TableError> {
        let mut problems = Vec::new();

        let cap = &self.capacitor;
        check_codes(
            Family::Capacitor,
            TableKind::Style,
            cap.styles.iter().map(|s| (&s.codes, s.lambda_b)),
            &mut problems,
        );
        for style in &cap.styles {
            let name = style.codes.join("/");
            if !cap.activation_energy.contains_key(&style.temperature_class) {
                problems.push(format!(
                    "capacitor style {}: temperature class {} has no activation energy",
                    name, style.temperature_class
                ));
            }
            if !cap.capacitance_exponent.contains_key(&style.capacitance_class) {
                problems.push(format!(
                    "capacitor style {}: capacitance class {} has no exponent",
                    name, style.capacitance_class
                ));
            }
            if !cap.voltage_stress.contains_key(&style.voltage_class) {
                problems.push(format!(
                    "capacitor style {}: voltage class {} has no curve",
                    name, style.voltage_class
                ));
            }
        }
        for (class, curve) in &cap.voltage_stress {
            if curve.knee <= 0.0 {
                problems.push(format!("capacitor voltage class {}: knee must be positive", class));
            }
        }
        check_rows(Family::Capacitor, TableKind::Quality, &cap.quality, &mut problems);
        check_rows(Family::Capacitor, TableKind::Environment, &cap.environment, &mut problems);
        check_positive_constants("capacitor activation energy", &cap.activation_energy, &mut problems);
        check_positive_constants("capacitor capacitance exponent", &cap.capacitance_exponent, &mut problems);

        let sr = &cap.series_resistance;
        if sr.bands.windows(2).any(|w| w[0].above <= w[1].above) {
            problems.push("series resistance bands must be ordered by descending bound".to_string());
        }
        if sr.otherwise <= 0.0 || sr.bands.iter().any(|b| b.value <= 0.0) {
            problems.push("series resistance factors must be positive".to_string());
        }

        let res = &self.resistor;
        check_codes(
            Family::Resistor,
            TableKind::Style,
            res.styles.iter().map(|s| (&s.codes, s.lambda_b)),
            &mut problems,
        );
        for style in &res.styles {
            let name = style.codes.join("/");
            if !res.activation_energy.contains_key(&style.temperature_class) {
                problems.push(format!(
                    "resistor style {}: temperature class {} has no activation energy",
                    name, style.temperature_class
                ));
            }
            if !res.power_stress.contains_key(&style.stress_class) {
                problems.push(format!(
                    "resistor style {}: stress class {} has no curve",
                    name, style.stress_class
                ));
            }
        }
        check_rows(Family::Resistor, TableKind::Quality, &res.quality, &mut problems);
        check_rows(Family::Resistor, TableKind::Environment, &res.environment, &mut problems);
        check_positive_constants("resistor activation energy", &res.activation_energy, &mut problems);
        if res.power_rating_exponent <= 0.0 {
            problems.push("resistor power rating exponent must be positive".to_string());
        }

        let ind = &self.inductor;
        check_codes(
            Family::Inductor,
            TableKind::InductorType,
            ind.types.iter().map(|t| (&t.codes, t.lambda_b)),
            &mut problems,
        );
        check_rows(Family::Inductor, TableKind::Quality, &ind.quality, &mut problems);
        check_rows(Family::Inductor, TableKind::Environment, &ind.environment, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TableError::Integrity { problems })
        }
    }

    fn quality_rows(&self, family: Family) -> &[FactorRow] {
        match family {
            Family::Capacitor => &self.capacitor.quality,
            Family::Resistor => &self.resistor.quality,
            Family::Inductor => &self.inductor.quality,
        }
    }

    fn environment_rows(&self, family: Family) -> &[FactorRow] {
        match family {
            Family::Capacitor => &self.capacitor.environment,
            Family::Resistor => &self.resistor.environment,
            Family::Inductor => &self.inductor.environment,
        }
    }

    /// Style (or inductor type) listing for a family
    pub fn style_entries(&self, family: Family) -> Vec<TableEntry> {
        match family {
            Family::Capacitor => self
                .capacitor
                .styles
                .iter()
                .map(|s| TableEntry {
                    codes: s.codes.clone(),
                    value: s.lambda_b,
                    description: s.description.clone(),
                })
                .collect(),
            Family::Resistor => self
                .resistor
                .styles
                .iter()
                .map(|s| TableEntry {
                    codes: s.codes.clone(),
                    value: s.lambda_b,
                    description: s.description.clone(),
                })
                .collect(),
            Family::Inductor => self
                .inductor
                .types
                .iter()
                .map(|t| TableEntry {
                    codes: t.codes.clone(),
                    value: t.lambda_b,
                    description: t.description.clone(),
                })
                .collect(),
        }
    }

    /// Quality level listing for a family
    pub fn quality_entries(&self, family: Family) -> Vec<TableEntry> {
        rows_to_entries(self.quality_rows(family))
    }

    /// Environment listing for a family
    pub fn environment_entries(&self, family: Family) -> Vec<TableEntry> {
        rows_to_entries(self.environment_rows(family))
    }

    fn capacitor_record(&self, code: &str) -> Result<StyleRecord, UnknownCodeError> {
        let cap = &self.capacitor;
        let style = cap
            .styles
            .iter()
            .find(|s| s.codes.iter().any(|c| c == code))
            .ok_or_else(|| UnknownCodeError::new(Family::Capacitor, TableKind::Style, code))?;

        let missing = |kind: TableKind, class: u8| {
            UnknownCodeError::new(Family::Capacitor, kind, class.to_string())
        };
        let activation_energy = *cap
            .activation_energy
            .get(&style.temperature_class)
            .ok_or_else(|| missing(TableKind::TemperatureClass, style.temperature_class))?;
        let capacitance_exponent = *cap
            .capacitance_exponent
            .get(&style.capacitance_class)
            .ok_or_else(|| missing(TableKind::CapacitanceClass, style.capacitance_class))?;
        let voltage_curve = *cap
            .voltage_stress
            .get(&style.voltage_class)
            .ok_or_else(|| missing(TableKind::VoltageClass, style.voltage_class))?;

        Ok(StyleRecord {
            lambda_b: style.lambda_b,
            meta: StyleMeta::Capacitor(CapacitorConstruction {
                temperature_class: style.temperature_class,
                activation_energy,
                capacitance_class: style.capacitance_class,
                capacitance_exponent,
                voltage_class: style.voltage_class,
                voltage_curve,
                tantalum: style.tantalum,
            }),
        })
    }

    fn resistor_record(&self, code: &str) -> Result<StyleRecord, UnknownCodeError> {
        let res = &self.resistor;
        let style = res
            .styles
            .iter()
            .find(|s| s.codes.iter().any(|c| c == code))
            .ok_or_else(|| UnknownCodeError::new(Family::Resistor, TableKind::Style, code))?;

        let activation_energy = *res.activation_energy.get(&style.temperature_class).ok_or_else(|| {
            UnknownCodeError::new(
                Family::Resistor,
                TableKind::TemperatureClass,
                style.temperature_class.to_string(),
            )
        })?;
        let stress_curve = *res.power_stress.get(&style.stress_class).ok_or_else(|| {
            UnknownCodeError::new(
                Family::Resistor,
                TableKind::StressClass,
                style.stress_class.to_string(),
            )
        })?;

        Ok(StyleRecord {
            lambda_b: style.lambda_b,
            meta: StyleMeta::Resistor(ResistorConstruction {
                temperature_class: style.temperature_class,
                activation_energy,
                stress_class: style.stress_class,
                stress_curve,
                power_rating_exponent: res.power_rating_exponent,
            }),
        })
    }

    fn inductor_record(&self, code: &str) -> Result<StyleRecord, UnknownCodeError> {
        self.inductor
            .types
            .iter()
            .find(|t| t.codes.iter().any(|c| c == code))
            .map(|t| StyleRecord {
                lambda_b: t.lambda_b,
                meta: StyleMeta::Inductor,
            })
            .ok_or_else(|| UnknownCodeError::new(Family::Inductor, TableKind::InductorType, code))
    }

    fn tabulated_rows(&self, family: Family, factor: TabulatedFactor) -> &[TabulatedRow] {
        match (family, factor) {
            (Family::Capacitor, TabulatedFactor::Temperature) => &self.capacitor.tabulated.temperature,
            (Family::Capacitor, TabulatedFactor::Capacitance) => &self.capacitor.tabulated.capacitance,
            (Family::Capacitor, TabulatedFactor::VoltageStress) => {
                &self.capacitor.tabulated.voltage_stress
            }
            (Family::Resistor, TabulatedFactor::Temperature) => &self.resistor.tabulated.temperature,
            (Family::Resistor, TabulatedFactor::PowerStress) => &self.resistor.tabulated.power_stress,
            (Family::Resistor, TabulatedFactor::PowerRating) => &self.resistor.tabulated.power_rating,
            _ => &[],
        }
    }
}

impl TableLookup for ReferenceTables {
    fn lookup_style(&self, family: Family, code: &str) -> Result<StyleRecord, UnknownCodeError> {
        match family {
            Family::Capacitor => self.capacitor_record(code),
            Family::Resistor => self.resistor_record(code),
            Family::Inductor => self.inductor_record(code),
        }
    }

    fn lookup_quality(&self, family: Family, code: &str) -> Result<f64, UnknownCodeError> {
        find_row(self.quality_rows(family), code)
            .ok_or_else(|| UnknownCodeError::new(family, TableKind::Quality, code))
    }

    fn lookup_environment(&self, family: Family, code: &str) -> Result<f64, UnknownCodeError> {
        find_row(self.environment_rows(family), code)
            .ok_or_else(|| UnknownCodeError::new(family, TableKind::Environment, code))
    }

    fn series_resistance(&self) -> &SeriesResistanceTable {
        &self.capacitor.series_resistance
    }

    fn tabulated(&self, family: Family, factor: TabulatedFactor, class: u8, at: f64) -> Option<f64> {
        let column = usize::from(class).checked_sub(1)?;
        self.tabulated_rows(family, factor)
            .iter()
            .find(|row| (row.at - at).abs() < TABULATED_MATCH_TOLERANCE)
            .and_then(|row| row.columns.get(column).copied())
    }
}

fn find_row(rows: &[FactorRow], code: &str) -> Option<f64> {
    rows.iter().find(|r| r.code == code).map(|r| r.value)
}

fn rows_to_entries(rows: &[FactorRow]) -> Vec<TableEntry> {
    rows.iter()
        .map(|r| TableEntry {
            codes: vec![r.code.clone()],
            value: r.value,
            description: r.description.clone().unwrap_or_default(),
        })
        .collect()
}

fn check_codes<'a>(
    family: Family,
    kind: TableKind,
    rows: impl Iterator<Item = (&'a Vec<String>, f64)>,
    problems: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for (codes, lambda_b) in rows {
        if codes.is_empty() {
            problems.push(format!("{} {} row has no codes", family, kind));
        }
        for code in codes {
            if !seen.insert(code.as_str()) {
                problems.push(format!("{} {} code '{}' appears more than once", family, kind, code));
            }
        }
        if !(lambda_b > 0.0) {
            problems.push(format!(
                "{} {} '{}': base failure rate must be positive",
                family,
                kind,
                codes.join("/")
            ));
        }
    }
}

fn check_rows(family: Family, kind: TableKind, rows: &[FactorRow], problems: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert(row.code.as_str()) {
            problems.push(format!("{} {} code '{}' appears more than once", family, kind, row.code));
        }
        if !(row.value > 0.0) {
            problems.push(format!("{} {} '{}': factor must be positive", family, kind, row.code));
        }
    }
}

fn check_positive_constants(label: &str, constants: &BTreeMap<u8, f64>, problems: &mut Vec<String>) {
    for (class, value) in constants {
        if !(*value > 0.0) {
            problems.push(format!("{} for class {} must be positive", label, class));
        }
    }
}
