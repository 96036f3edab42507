use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use sheetremap::report::collect_issues;
use sheetremap::{FormulaEntry, RemapConfig, RemapContext, Severity, rewrite};
use std::path::{Path, PathBuf};

mod formatter;

const DEFAULT_PLAN: &str = "sheetremap.toml";

#[derive(Parser)]
#[command(name = "sheetremap")]
#[command(
    about = "Rewrite spreadsheet formulas for a new column and row layout",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to the remap plan (TOML); defaults to sheetremap.toml
    #[arg(short, long, value_name = "PLAN", global = true)]
    plan: Option<PathBuf>,

    /// Log every rewritten formula
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report plan formulas that cannot be carried over
    Check {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Show only errors (hide warnings and info)
        #[arg(short, long)]
        errors_only: bool,

        /// Sheet name used in the report
        #[arg(long, default_value = "Sheet1")]
        sheet: String,
    },
    /// Print what every plan formula becomes in the destination
    Rewrite {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Rewrite one formula using the plan's tables
    Formula {
        /// Formula text, e.g. "=B2*2"
        formula: String,

        /// Source cell holding the formula
        #[arg(long, default_value = "A2")]
        cell: String,

        /// Destination row the cell is written to
        #[arg(long)]
        dest_row: u32,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let plan_path = cli
        .plan
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN));
    let plan = load_plan(&plan_path)?;

    let exit_code = match cli.command {
        Command::Check {
            format,
            errors_only,
            sheet,
        } => {
            let results = plan.rewrite_all().context("Invalid remap plan")?;
            let issues = collect_issues(&sheet, &results);
            let issues: Vec<_> = if errors_only {
                issues
                    .into_iter()
                    .filter(|i| i.severity == Severity::Error)
                    .collect()
            } else {
                issues
            };

            match format {
                OutputFormat::Human => formatter::print_issues_human(&plan_path, &issues),
                OutputFormat::Json => formatter::print_issues_json(&plan_path, &issues)?,
            }

            if issues.iter().any(|i| i.severity == Severity::Error) {
                1
            } else {
                0 // Only warnings, still exit 0
            }
        }
        Command::Rewrite { format } => {
            let results = plan.rewrite_all().context("Invalid remap plan")?;
            match format {
                OutputFormat::Human => formatter::print_results_human(&plan.placeholders, &results),
                OutputFormat::Json => formatter::print_results_json(&plan.placeholders, &results)?,
            }
            0
        }
        Command::Formula {
            formula,
            cell,
            dest_row,
        } => {
            plan.validate().context("Invalid remap plan")?;
            let entry = FormulaEntry {
                cell,
                dest_row,
                formula,
            };
            let row = entry
                .source_row()
                .with_context(|| format!("Invalid cell address '{}'", entry.cell))?;

            let source = plan.source_map();
            let destination = plan.destination_order();
            let ctx = RemapContext::new(
                &source,
                &destination,
                plan.source.layout(),
                plan.destination.layout(),
            )
            .at(row, entry.dest_row);
            debug!("Rewriting '{}' from row {} to row {}", entry.formula, row, dest_row);

            let outcome = rewrite(&entry.formula, &ctx);
            formatter::print_single(&plan.placeholders, &entry, &outcome);
            if outcome.is_rewritten() { 0 } else { 1 }
        }
    };

    std::process::exit(exit_code);
}

fn load_plan(path: &Path) -> Result<RemapConfig> {
    RemapConfig::from_file(path)
        .with_context(|| format!("Failed to load plan from {}", path.display()))
}
