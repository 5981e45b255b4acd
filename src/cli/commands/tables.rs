//! `mil217 tables` command - list reference data codes

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{delimited_row, load_config, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::tables::{ReferenceTables, TableEntry};
use crate::entities::component::Family;
use crate::entities::result::format_factor;

#[derive(clap::Args, Debug)]
pub struct TablesArgs {
    /// Component family (capacitor, resistor, inductor); all when omitted
    pub family: Option<Family>,

    /// Which table to list; all when omitted
    #[arg(long, short = 'k', value_enum)]
    pub kind: Option<ListKind>,
}

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Styles (inductor types) with base failure rate λb
    Styles,
    /// Quality levels with πQ
    Quality,
    /// Environments with πE
    Environment,
}

impl ListKind {
    fn title(&self, family: Family) -> &'static str {
        match (self, family) {
            (ListKind::Styles, Family::Inductor) => "types (λb)",
            (ListKind::Styles, _) => "styles (λb)",
            (ListKind::Quality, _) => "quality levels (πQ)",
            (ListKind::Environment, _) => "environments (πE)",
        }
    }
}

#[derive(Serialize)]
struct Listing {
    family: Family,
    kind: ListKind,
    entries: Vec<TableEntry>,
}

pub fn run(args: TablesArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let tables = config.reference_tables()?;
    let listings = collect(&tables, args.family, args.kind);

    let content = match resolve_format(global.format, &config) {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&listings).into_diagnostic()?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yml::to_string(&listings).into_diagnostic()?,
        format @ (OutputFormat::Tsv | OutputFormat::Csv) => {
            let mut out = delimited_row(&["family", "table", "code", "value", "description"], format);
            for listing in &listings {
                for entry in &listing.entries {
                    for code in &entry.codes {
                        out.push_str(&delimited_row(
                            &[
                                listing.family.to_string(),
                                format!("{:?}", listing.kind).to_lowercase(),
                                code.clone(),
                                entry.value.to_string(),
                                entry.description.clone(),
                            ],
                            format,
                        ));
                    }
                }
            }
            out
        }
        OutputFormat::Md | OutputFormat::Auto => render_markdown(&tables.revision, &listings),
    };

    print!("{}", content);
    Ok(())
}

fn collect(tables: &ReferenceTables, family: Option<Family>, kind: Option<ListKind>) -> Vec<Listing> {
    let families: Vec<Family> = match family {
        Some(f) => vec![f],
        None => Family::all().to_vec(),
    };
    let kinds: Vec<ListKind> = match kind {
        Some(k) => vec![k],
        None => vec![ListKind::Styles, ListKind::Quality, ListKind::Environment],
    };

    let mut listings = Vec::new();
    for family in families {
        for kind in &kinds {
            let entries = match kind {
                ListKind::Styles => tables.style_entries(family),
                ListKind::Quality => tables.quality_entries(family),
                ListKind::Environment => tables.environment_entries(family),
            };
            listings.push(Listing {
                family,
                kind: *kind,
                entries,
            });
        }
    }
    listings
}

fn render_markdown(revision: &str, listings: &[Listing]) -> String {
    let mut output = format!("# Reference Tables ({})\n", revision);
    for listing in listings {
        output.push_str(&format!(
            "\n## {} {}\n\n",
            listing.family.label(),
            listing.kind.title(listing.family)
        ));
        let mut builder = Builder::default();
        builder.push_record(["Code", "Value", "Description"]);
        for entry in &listing.entries {
            builder.push_record([
                entry.codes.join(", "),
                format_factor(entry.value),
                entry.description.clone(),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_filters() {
        let tables = ReferenceTables::builtin().unwrap();
        assert_eq!(collect(&tables, None, None).len(), 9);

        let only = collect(&tables, Some(Family::Inductor), Some(ListKind::Styles));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].entries.len(), 2);
    }

    #[test]
    fn test_markdown_lists_codes() {
        let tables = ReferenceTables::builtin().unwrap();
        let md = render_markdown(
            &tables.revision,
            &collect(&tables, Some(Family::Capacitor), Some(ListKind::Styles)),
        );
        assert!(md.contains("## Capacitor styles (λb)"));
        assert!(md.contains("CSR, CSR09, CSR13"));
    }
}
