//! `mil217 validate` command - check a component set without calculating

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{build_engine, load_component_set, load_config, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::result::Advisory;
use crate::schema::validator::ValidationError;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Component set file (YAML or JSON)
    pub file: PathBuf,

    /// Strict mode - advisories become errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct AdvisoryLine<'a> {
    component: String,
    #[serde(flatten)]
    advisory: &'a Advisory,
}

#[derive(Serialize)]
struct ValidationOutput<'a> {
    valid: bool,
    components: usize,
    errors: &'a [ValidationError],
    advisories: Vec<AdvisoryLine<'a>>,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let engine = build_engine(&config)?;
    let set = load_component_set(&args.file)?;
    let validation = engine.validate(&set.components);

    let advisories: Vec<AdvisoryLine> = set
        .components
        .iter()
        .enumerate()
        .zip(&validation.advisories)
        .flat_map(|((index, input), list)| {
            let name = input.display_name(index);
            list.iter().map(move |advisory| AdvisoryLine {
                component: name.clone(),
                advisory,
            })
        })
        .collect();

    let failed = !validation.is_valid() || (args.strict && !advisories.is_empty());
    let output = ValidationOutput {
        valid: !failed,
        components: set.components.len(),
        errors: &validation.errors,
        advisories,
    };

    match resolve_format(global.format, &config) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&output).into_diagnostic()?);
        }
        _ => print_human(&output, global.quiet),
    }

    if !failed {
        return Ok(());
    }
    let errors = output.errors.len();
    if errors > 0 {
        Err(miette::miette!(
            "Validation failed: {} error(s) in {}",
            errors,
            args.file.display()
        ))
    } else {
        Err(miette::miette!(
            "Validation failed: {} advisory(ies) in strict mode",
            output.advisories.len()
        ))
    }
}

fn print_human(output: &ValidationOutput, quiet: bool) {
    for error in output.errors {
        println!("{} {}", style("✗").red(), error);
    }
    for line in &output.advisories {
        println!("{} {}: {}", style("!").yellow(), line.component, line.advisory);
    }

    if quiet {
        return;
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Components:     {}", style(output.components).cyan());
    println!("  Errors:         {}", style(output.errors.len()).red());
    println!("  Advisories:     {}", style(output.advisories.len()).yellow());
    println!();

    if output.valid {
        println!("{} All components passed validation!", style("✓").green().bold());
    }
}
