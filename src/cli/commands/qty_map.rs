//! `partlink qty-map` command - Raw id -> qty map of an entity

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{effective_format, open_workspace, parse_entity_id, parse_link_kind};
use crate::cli::table::{print_table, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, LinkKind};
use crate::core::qty::format_qty;
use crate::core::resolve::ResolutionPipeline;

#[derive(clap::Args, Debug)]
pub struct QtyMapArgs {
    /// Source entity id
    #[arg(value_parser = parse_entity_id)]
    pub source: EntityId,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,
}

pub fn run(args: QtyMapArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());

    let map = ResolutionPipeline::new(&store, &store).qty_map(Some(args.source), kind);

    let format = effective_format(global, &config);
    if format == OutputFormat::Json {
        // JSON object keys are strings
        let object: serde_json::Map<String, serde_json::Value> = map
            .iter()
            .map(|(id, qty)| (id.to_string(), serde_json::json!(qty)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&object).into_diagnostic()?);
        return Ok(());
    }

    let mut table = Table::new(&["ID", "QTY"]);
    for (id, qty) in &map {
        table.push_row(vec![id.to_string(), format_qty(*qty)]);
    }
    print_table(&table, format, "link", global.quiet);
    Ok(())
}
