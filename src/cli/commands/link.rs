//! `partlink link` command - Maintain the links of an entity

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{effective_format, open_workspace, parse_entity_id, parse_link_kind};
use crate::cli::table::{print_table, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{LinkRecordSource, PostedLink};
use crate::core::qty::format_qty;
use crate::core::reconcile::{LinkWriter, WriteReport};

#[derive(Subcommand, Debug)]
pub enum LinkCommands {
    /// Replace the links of one kind, like posting the admin form
    ///
    /// Each link is `id[:qty[:position]]`. Links of the kind that are not
    /// given are removed; links of other kinds are left alone. Giving no
    /// links removes every link of the kind.
    Set(SetArgs),

    /// List the stored link rows of an entity, unresolved
    List(ListArgs),

    /// Copy the links of one entity onto another
    Copy(CopyArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Source entity id
    #[arg(value_parser = parse_entity_id)]
    pub source: EntityId,

    /// Links as id[:qty[:position]], e.g. 12:2.5:10
    #[arg(allow_hyphen_values = true, allow_negative_numbers = true)]
    pub links: Vec<PostedLink>,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Source entity id
    #[arg(value_parser = parse_entity_id)]
    pub source: EntityId,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,
}

#[derive(clap::Args, Debug)]
pub struct CopyArgs {
    /// Entity to copy from
    #[arg(value_parser = parse_entity_id)]
    pub from: EntityId,

    /// Entity to copy onto
    #[arg(value_parser = parse_entity_id)]
    pub to: EntityId,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,
}

pub fn run(cmd: LinkCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LinkCommands::Set(args) => run_set(args, global),
        LinkCommands::List(args) => run_list(args, global),
        LinkCommands::Copy(args) => run_copy(args, global),
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, mut store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());

    let report = LinkWriter::new(&mut store).apply_posted(args.source, kind, &args.links)?;
    print_report(&report, args.source, kind, global);
    Ok(())
}

fn run_copy(args: CopyArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, mut store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());

    let report = LinkWriter::new(&mut store).copy_links(args.from, args.to, kind)?;
    print_report(&report, args.to, kind, global);
    Ok(())
}

fn print_report(report: &WriteReport, source: EntityId, kind: LinkKind, global: &GlobalOpts) {
    if global.quiet {
        return;
    }

    let join = |ids: &[EntityId]| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");

    println!(
        "{} Updated {} links of entity {}",
        style("✓").green(),
        style(kind).yellow(),
        style(source).cyan()
    );
    if !report.added.is_empty() {
        println!("  {} added: {}", style("+").green(), join(&report.added));
    }
    if !report.retained.is_empty() {
        println!("  {} kept: {}", style("=").dim(), join(&report.retained));
    }
    if !report.removed.is_empty() {
        println!("  {} removed: {}", style("-").red(), join(&report.removed));
    }
    if report.skipped > 0 {
        println!(
            "  {} skipped {} invalid link(s)",
            style("!").yellow(),
            report.skipped
        );
    }
}

#[derive(Serialize)]
struct RawLinkRow {
    linked_id: i64,
    qty: Option<f64>,
    position: Option<i64>,
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());
    let records = store.fetch(args.source, kind)?;
    let format = effective_format(global, &config);

    if format == OutputFormat::Json {
        let rows: Vec<RawLinkRow> = records
            .iter()
            .map(|r| RawLinkRow {
                linked_id: r.linked_id,
                qty: r.qty,
                position: r.position,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        return Ok(());
    }

    let mut table = Table::new(&["LINKED", "QTY", "POSITION"]);
    for r in &records {
        table.push_row(vec![
            r.linked_id.to_string(),
            r.qty.map(format_qty).unwrap_or_else(|| "-".to_string()),
            r.position.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    print_table(&table, format, "link", global.quiet);
    Ok(())
}
