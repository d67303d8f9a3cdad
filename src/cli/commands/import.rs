//! `partlink import` command - Replace links from a CSV file

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::cli::helpers::{open_workspace, parse_link_kind};
use crate::cli::GlobalOpts;
use crate::core::identity::LinkKind;
use crate::interop::csv::{import_rows, ImportStats};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file with a `sku` column and a `_<kind>_` column (e.g. `_partlists_`)
    pub file: PathBuf,

    /// Validate and count without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }

    let (_, config, mut store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());

    let file = File::open(&args.file).into_diagnostic()?;
    let stats = import_rows(&mut store, kind, BufReader::new(file), args.dry_run)?;

    if !global.quiet {
        print_summary(&stats, kind, args.dry_run);
    }
    Ok(())
}

fn print_summary(stats: &ImportStats, kind: LinkKind, dry_run: bool) {
    println!();
    if dry_run {
        println!("{}", style("Dry run - nothing was written").yellow().bold());
    }
    println!("{}", style(format!("Import Summary ({})", kind)).bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Rows processed:   {}", stats.rows_processed);
    println!("  Entities updated: {}", style(stats.sources_updated).green());
    println!("  Links written:    {}", stats.links_written);
    println!("  Rows untouched:   {}", stats.untouched);

    let problems = stats.unknown_sources + stats.unknown_skus + stats.invalid;
    if problems > 0 {
        println!("  Unknown entities: {}", style(stats.unknown_sources).yellow());
        println!("  Unknown skus:     {}", style(stats.unknown_skus).yellow());
        println!("  Invalid:          {}", style(stats.invalid).red());
    }
}
