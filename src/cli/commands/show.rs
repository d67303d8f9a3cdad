//! `partlink show` command - Resolved display list of an entity's links

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{effective_format, format_amount, open_workspace, parse_entity_id, parse_link_kind};
use crate::cli::table::{print_table, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::CatalogEntity;
use crate::core::filter::{Attribute, FilterPolicy};
use crate::core::identity::{EntityId, LinkKind};
use crate::core::pricing::{line_total, AmountSelector, CatalogAmountSelector, TaxDisplayMode};
use crate::core::qty::format_qty;
use crate::core::resolve::{Resolution, ResolutionPipeline, ResolveMode};
use crate::core::Config;

/// Fields read by `display_rows`
const DISPLAY_ATTRIBUTES: [Attribute; 5] = [
    Attribute::Name,
    Attribute::Sku,
    Attribute::TypeId,
    Attribute::Price,
    Attribute::PriceInclTax,
];

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Source entity id
    #[arg(value_parser = parse_entity_id)]
    pub source: EntityId,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,

    /// Sort by position instead of link order
    #[arg(long)]
    pub by_position: bool,

    /// Include disabled entities (bypasses status and saleability filters)
    #[arg(long)]
    pub show_disabled: bool,

    /// Include entities that are not saleable
    #[arg(long)]
    pub show_all: bool,

    /// Include entities not visible in the catalog
    #[arg(long)]
    pub show_invisible: bool,

    /// Price to display (excluding_tax, including_tax, both)
    #[arg(long)]
    pub tax_display: Option<TaxDisplayMode>,
}

impl ShowArgs {
    /// Configured policy with the command-line switches applied on top
    ///
    /// Whatever the policy selects, the fields of a display row are loaded.
    fn filter_policy(&self, config: &Config) -> FilterPolicy {
        let mut policy = config.filter_policy();
        if self.show_disabled {
            policy = policy.with_disabled(true);
        }
        if self.show_all {
            policy = policy.with_all_products(true);
        }
        if self.show_invisible {
            policy = policy.with_invisible(true);
        }
        policy.with_required_attributes(DISPLAY_ATTRIBUTES)
    }
}

/// One line of the display list
#[derive(Debug, Serialize)]
pub struct ShowRow {
    pub position: i64,
    pub id: EntityId,
    pub sku: String,
    pub name: String,
    pub qty: f64,
    pub unit_amount: f64,
    pub line_total: f64,
}

/// Turn a resolution into display rows priced for `mode`
pub fn display_rows(resolution: &Resolution<CatalogEntity>, mode: TaxDisplayMode) -> Vec<ShowRow> {
    let selector = CatalogAmountSelector;
    resolution
        .items
        .iter()
        .map(|item| {
            let unit = selector.amount_for_display(&item.entity, mode);
            ShowRow {
                position: item.position,
                id: item.entity.id,
                sku: item.entity.sku.clone(),
                name: item.entity.label().to_string(),
                qty: item.qty,
                unit_amount: unit,
                line_total: line_total(item.qty, unit),
            }
        })
        .collect()
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());
    let tax_display = args.tax_display.unwrap_or_else(|| config.tax_display());
    let policy = args.filter_policy(&config);
    let mode = if args.by_position {
        ResolveMode::PositionSorted
    } else {
        ResolveMode::OrderOnly
    };

    let pipeline = ResolutionPipeline::new(&store, &store);
    let resolution = pipeline.resolve(Some(args.source), kind, &policy, mode);
    let rows = display_rows(&resolution, tax_display);
    let format = effective_format(global, &config);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        return Ok(());
    }

    let mut table = Table::new(&["POS", "ID", "SKU", "NAME", "QTY", "UNIT", "TOTAL"]);
    for row in &rows {
        table.push_row(vec![
            row.position.to_string(),
            row.id.to_string(),
            row.sku.clone(),
            row.name.clone(),
            format_qty(row.qty),
            format_amount(row.unit_amount),
            format_amount(row.line_total),
        ]);
    }
    print_table(&table, format, "part", global.quiet);

    if format == OutputFormat::Auto && !global.quiet {
        let total: f64 = rows.iter().map(|r| r.line_total).sum();
        eprintln!(
            "{} {} ({})",
            style("Total:").bold(),
            format_amount(total),
            tax_display
        );
        let stats = resolution.stats;
        if stats.missing + stats.filtered + stats.invalid > 0 {
            eprintln!(
                "{}",
                style(format!(
                    "{} missing, {} filtered, {} invalid link(s) not shown",
                    stats.missing, stats.filtered, stats.invalid
                ))
                .dim()
            );
        }
    }
    Ok(())
}
