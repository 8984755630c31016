//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use twmap_core::{Dimension, FilterSelection};

#[derive(Parser)]
#[command(
    name = "twmap",
    version,
    about = "Taiwan choropleth pipeline - join regional statistics to boundary geometry",
    long_about = "Load tabular statistics and Taiwan boundary geometry described by a TOML\n\
                  configuration, normalize region names, aggregate under a filter selection\n\
                  and print the resulting choropleth frame."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Aggregate under a filter selection and print the render frame.
    Render(RenderArgs),

    /// List every filter dimension and its values.
    Options(ConfigArgs),

    /// Pivot one dimension and write the summary as JSON.
    Summarize(SummarizeArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Pipeline configuration file.
    #[arg(long = "config", short = 'c', value_name = "TOML")]
    pub config: PathBuf,
}

/// Dimension values overriding the default selection.
#[derive(Args, Default)]
pub struct SelectionArgs {
    #[arg(long = "segment", value_name = "VALUE")]
    pub segment: Option<String>,

    #[arg(long = "kind", value_name = "VALUE")]
    pub kind: Option<String>,

    #[arg(long = "year", value_name = "VALUE")]
    pub year: Option<String>,

    #[arg(long = "gender", value_name = "VALUE")]
    pub gender: Option<String>,
}

impl SelectionArgs {
    /// `base` with every given flag applied.
    pub fn apply(&self, base: FilterSelection) -> FilterSelection {
        [
            (Dimension::Segment, &self.segment),
            (Dimension::Kind, &self.kind),
            (Dimension::Year, &self.year),
            (Dimension::Gender, &self.gender),
        ]
        .into_iter()
        .fold(base, |selection, (dimension, value)| match value {
            Some(value) => selection.with(dimension, value.clone()),
            None => selection,
        })
    }
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format for the frame.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Dimension whose values become the pivot columns.
    #[arg(long = "dimension", value_enum, default_value = "kind")]
    pub dimension: DimensionArg,

    /// Values fixing the other dimensions.
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output JSON file.
    #[arg(long = "output", short = 'o', value_name = "JSON")]
    pub output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DimensionArg {
    Segment,
    Kind,
    Year,
    Gender,
}

impl From<DimensionArg> for Dimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::Segment => Dimension::Segment,
            DimensionArg::Kind => Dimension::Kind,
            DimensionArg::Year => Dimension::Year,
            DimensionArg::Gender => Dimension::Gender,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
