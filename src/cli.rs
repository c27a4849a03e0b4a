use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use filedep::export::model::ExportFormat;

/// File dependency graphs for JavaScript, TypeScript, component and stylesheet workspaces.
///
/// filedep scans a workspace, extracts import and reference statements, resolves
/// them to files on disk and reports the resulting graph.
#[derive(Parser, Debug)]
#[command(
    name = "filedep",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log scan progress and unresolved specifiers (same as RUST_LOG=filedep=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per file (default).
    #[default]
    Compact,
    /// Aligned columns.
    Table,
    /// Structured JSON for programmatic consumption.
    Json,
}

/// Filters applied before reporting. Each flag mirrors an engine toggle.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Replace the target extension list (comma-separated, e.g. ts,tsx,css).
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Hide files with these extensions (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub disable_ext: Vec<String>,

    /// Hide these workspace-relative directories and everything below them.
    #[arg(long, value_delimiter = ',')]
    pub disable_dir: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan workspace roots and print each file with its resolved dependencies.
    Scan {
        /// Workspace roots. The first root's filedep.toml is used.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print dependents (who imports each file) instead of dependencies.
        #[arg(long)]
        reverse: bool,

        /// Only print the scan summary.
        #[arg(long)]
        summary: bool,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// List the directory filter tree with effective enabled state.
    Dirs {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Export the filtered graph as JSON graph data or Graphviz DOT.
    Export {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Export format.
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Export the reverse mapping.
        #[arg(long)]
        reverse: bool,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Scan, then rescan whenever a source file or filedep.toml changes.
    Watch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output format for each scan summary.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}
