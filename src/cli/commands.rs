use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::dataset::Dataset;

/// Batch ETL building an analytics base table from raw sales data
#[derive(Parser, Debug)]
#[command(
    name = "data-pipeline",
    about = "Batch ETL building an analytics base table from raw sales data",
    version,
    author,
    long_about = "data-pipeline extracts raw JSON-lines sales, product, order, customer and \
                  country files, quarantines records that break their schema, curates and \
                  quality-checks the rest, and joins them into one analytics base table. \
                  When a Postgres database is configured the run waits until it accepts \
                  connections."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the full pipeline",
        long_about = "Waits for the database (if configured), ingests every dataset and \
                      writes the analytics base table.\n\n\
                      Examples:\n  \
                      data-pipeline run\n  \
                      data-pipeline run --data-root ./data --skip-readiness\n  \
                      data-pipeline run --format json"
    )]
    Run(RunArgs),

    #[command(
        about = "Check raw files against their schemas without writing anything",
        long_about = "Extracts and validates raw files line by line and reports how many \
                      lines would be quarantined. Exits with 1 when any line is broken.\n\n\
                      Examples:\n  \
                      data-pipeline check\n  \
                      data-pipeline check --dataset sales --dataset orders"
    )]
    Check(CheckArgs),

    #[command(
        about = "Check database availability",
        long_about = "Probes the configured database once, or with the full retry policy \
                      when --wait is given.\n\n\
                      Examples:\n  \
                      data-pipeline health\n  \
                      data-pipeline health --wait"
    )]
    Health(HealthArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(
        long,
        value_name = "PATH",
        help = "Root folder holding raw_data/ (overrides DATA_PIPELINE_DATA_ROOT)"
    )]
    pub data_root: Option<PathBuf>,

    #[arg(long, help = "Do not wait for the database")]
    pub skip_readiness: bool,

    #[arg(long, help = "Do not write data profile reports")]
    pub no_profiles: bool,

    #[arg(long, help = "Abort when a curated dataset fails its quality suite")]
    pub fail_on_validation: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long, value_name = "PATH", help = "Root folder holding raw_data/")]
    pub data_root: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "dataset",
        value_name = "NAME",
        value_parser = parse_dataset,
        help = "Dataset to check, repeatable (defaults to all)"
    )]
    pub datasets: Vec<Dataset>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(long, help = "Retry with backoff until ready or out of attempts")]
    pub wait: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_dataset(s: &str) -> Result<Dataset, String> {
    s.parse()
}
