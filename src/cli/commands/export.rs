//! `partlink export` command - Write links of every entity to CSV

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use crate::cli::helpers::{open_workspace, parse_link_kind};
use crate::cli::GlobalOpts;
use crate::core::identity::LinkKind;
use crate::interop::csv::{export_rows, ExportStats};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());

    let stats = match &args.output {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            export_rows(&store, kind, BufWriter::new(file))?
        }
        None => export_rows(&store, kind, io::stdout().lock())?,
    };

    // Summary goes to stderr so stdout stays valid CSV
    if !global.quiet {
        print_summary(&stats, kind, args.output.as_ref());
    }
    Ok(())
}

fn print_summary(stats: &ExportStats, kind: LinkKind, output: Option<&PathBuf>) {
    let target = output
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    eprintln!(
        "{} Exported {} {} link(s) of {} entities to {}",
        style("✓").green(),
        stats.links,
        style(kind).yellow(),
        stats.rows,
        style(target).cyan()
    );
    if stats.dangling > 0 {
        eprintln!(
            "  {} skipped {} link(s) to missing entities",
            style("!").yellow(),
            stats.dangling
        );
    }
}
