//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{calc::CalcArgs, tables::TablesArgs, validate::ValidateArgs};

#[derive(Parser)]
#[command(name = "mil217")]
#[command(author, version, about = "MIL-HDBK-217F failure rate prediction")]
#[command(long_about = "Predicts capacitor, resistor and inductor failure rates with the \
MIL-HDBK-217F parts stress models and totals them into a system report.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Reference data file replacing the built-in handbook tables
    #[arg(long, global = true, env = "MIL217_TABLES")]
    pub tables: Option<PathBuf>,

    /// Use printed table values when an input sits exactly on a tabulated point
    #[arg(long, global = true)]
    pub tabulated: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Calculate failure rates for a component set
    Calc(CalcArgs),

    /// Check a component set without calculating
    Validate(ValidateArgs),

    /// List reference data codes and values
    Tables(TablesArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Configured default, otherwise markdown tables
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}
