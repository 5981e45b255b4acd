//! `mil217 calc` command - predict failure rates for a component set

use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    build_engine, delimited_row, format_rate, load_component_set, load_config, resolve_format,
    truncate_str, write_output,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::result::{format_factor, Factors, Report};

#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Component set file (YAML or JSON)
    pub file: PathBuf,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Evaluate components on all cores
    #[arg(long)]
    pub parallel: bool,
}

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let engine = build_engine(&config)?;
    let set = load_component_set(&args.file)?;

    let report = if args.parallel {
        engine.calculate_parallel(&set.components)?
    } else {
        engine.calculate(&set.components)?
    };

    let content = match resolve_format(global.format, &config) {
        OutputFormat::Yaml => serde_yml::to_string(&report).into_diagnostic()?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            json.push('\n');
            json
        }
        format @ (OutputFormat::Tsv | OutputFormat::Csv) => render_delimited(&report, format),
        OutputFormat::Md | OutputFormat::Auto => {
            render_markdown(&report, set.project.as_deref(), Utc::now(), global.quiet)
        }
    };

    write_output(&content, args.output, global.quiet)
}

const HEADER: [&str; 7] = ["Name", "Type", "Style", "T (°C)", "Quality", "Env", "λb"];

fn header() -> Vec<String> {
    HEADER
        .iter()
        .copied()
        .chain(Factors::LABELS)
        .chain(["λp"])
        .map(String::from)
        .collect()
}

/// Markdown report: one row per component, a total row, then the summary
pub fn render_markdown(
    report: &Report,
    project: Option<&str>,
    generated: DateTime<Utc>,
    quiet: bool,
) -> String {
    let mut output = String::new();
    match project {
        Some(name) => output.push_str(&format!("# Reliability Prediction: {}\n\n", name)),
        None => output.push_str("# Reliability Prediction\n\n"),
    }
    if !quiet {
        output.push_str(&format!(
            "*Generated {} (MIL-HDBK-217F parts stress)*\n\n",
            generated.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    let mut builder = Builder::default();
    builder.push_record(header());
    for c in &report.components {
        let mut row = vec![
            truncate_str(&c.name, 24),
            c.family.to_string(),
            c.selector.clone(),
            format_factor(c.temperature),
            c.quality_level.clone(),
            c.environment.clone(),
            format_rate(c.lambda_b),
        ];
        row.extend(c.factors.ordered().iter().map(|f| f.to_string()));
        row.push(format_rate(c.lambda_p));
        builder.push_record(row);
    }
    let mut total = vec![String::new(); HEADER.len() + Factors::LABELS.len() + 1];
    total[0] = "**TOTAL SYSTEM**".to_string();
    if let Some(last) = total.last_mut() {
        *last = format!("**{}**", format_rate(report.total_lambda_p));
    }
    builder.push_record(total);
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    if quiet {
        return output;
    }

    output.push_str("\n## Summary\n\n");
    output.push_str(&format!("- **Components:** {}\n", report.component_count()));
    output.push_str(&format!(
        "- **Total λp:** {} failures/10⁶ h\n",
        format_rate(report.total_lambda_p)
    ));
    match report.mtbf_hours() {
        Some(mtbf) => output.push_str(&format!("- **MTBF:** {:.0} h\n", mtbf)),
        None => output.push_str("- **MTBF:** n/a\n"),
    }
    for (family, subtotal) in report.subtotals() {
        output.push_str(&format!(
            "- **{} subtotal:** {}\n",
            family.label(),
            format_rate(subtotal)
        ));
    }

    let advisories: Vec<_> = report.advisories().collect();
    if !advisories.is_empty() {
        output.push_str("\n## Advisories\n\n");
        for (name, advisory) in advisories {
            output.push_str(&format!("- {}: {}\n", name, advisory));
        }
    }

    output
}

/// Flat rows for spreadsheets and pipes
pub fn render_delimited(report: &Report, format: OutputFormat) -> String {
    let mut output = delimited_row(&header(), format);
    for c in &report.components {
        let mut row = vec![
            c.name.clone(),
            c.family.to_string(),
            c.selector.clone(),
            c.temperature.to_string(),
            c.quality_level.clone(),
            c.environment.clone(),
            c.lambda_b.to_string(),
        ];
        row.extend(
            c.factors
                .ordered()
                .iter()
                .map(|f| f.value().map(|v| v.to_string()).unwrap_or_default()),
        );
        row.push(c.lambda_p.to_string());
        output.push_str(&delimited_row(&row, format));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::Engine;
    use crate::entities::component::ComponentInput;

    fn report() -> Report {
        let engine = Engine::with_defaults().unwrap();
        engine
            .calculate(&[
                ComponentInput::capacitor("CSR13", 10.0, 0.5, "M", "GB", 25.0)
                    .with_name("C1")
                    .with_description("Bulk"),
                ComponentInput::resistor("RCR", 0.25, 0.95, "M", "GB", 25.0)
                    .with_name("R1")
                    .with_description("Pull-up"),
            ])
            .unwrap()
    }

    #[test]
    fn test_markdown_has_total_and_summary() {
        let md = render_markdown(&report(), Some("PSU"), Utc::now(), false);
        assert!(md.starts_with("# Reliability Prediction: PSU"));
        assert!(md.contains("TOTAL SYSTEM"));
        assert!(md.contains("n/a"));
        assert!(md.contains("**Components:** 2"));
        assert!(md.contains("Capacitor subtotal"));
        assert!(md.contains("## Advisories"));
        assert!(md.contains("R1: power_stress"));
    }

    #[test]
    fn test_quiet_markdown_omits_summary() {
        let md = render_markdown(&report(), None, Utc::now(), true);
        assert!(md.contains("TOTAL SYSTEM"));
        assert!(!md.contains("## Summary"));
        assert!(!md.contains("Generated"));
    }

    #[test]
    fn test_csv_leaves_not_applicable_empty() {
        let csv = render_delimited(&report(), OutputFormat::Csv);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name,Type,Style"));
        let resistor: Vec<_> = lines[2].split(',').collect();
        assert_eq!(resistor[0], "R1");
        // πC column is empty for a resistor
        assert_eq!(resistor[8], "");
    }
}
