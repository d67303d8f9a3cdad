//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, entity::EntityCommands,
    export::ExportArgs, import::ImportArgs, init::InitArgs, link::LinkCommands,
    qty_map::QtyMapArgs, query::QueryArgs, show::ShowArgs,
};

#[derive(Parser)]
#[command(name = "partlink")]
#[command(author, version, about = "Resolve and maintain catalog parts lists")]
#[command(long_about = "Maintains links between catalog entities (parts lists, related, up-sell and cross-sell) \
and resolves them into ordered, filtered lists with quantity and position.")]
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

    /// Project root (default: auto-detect by finding .partlink/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new partlink project
    Init(InitArgs),

    /// Catalog entity management
    #[command(subcommand)]
    Entity(EntityCommands),

    /// Maintain the links of an entity
    #[command(subcommand)]
    Link(LinkCommands),

    /// Show the resolved links of an entity with quantities and prices
    Show(ShowArgs),

    /// Print the raw id -> qty map of an entity
    QtyMap(QtyMapArgs),

    /// Print the JSON query response for an entity
    Query(QueryArgs),

    /// Export links of every entity to CSV
    Export(ExportArgs),

    /// Import links from CSV
    Import(ImportArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table on a terminal
    #[default]
    Auto,
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
