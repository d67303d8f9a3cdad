//! `partlink entity` command - Catalog entity management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{effective_format, format_amount, open_workspace, parse_entity_id};
use crate::cli::table::{print_table, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{CatalogEntity, Status, Visibility};
use crate::core::identity::EntityId;

#[derive(Subcommand, Debug)]
pub enum EntityCommands {
    /// Add an entity, or update the entity with the same id
    Add(AddArgs),

    /// List all entities
    List,

    /// Remove an entity and its own links (links pointing at it remain)
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Entity id (default: next free id)
    #[arg(long, value_parser = parse_entity_id)]
    pub id: Option<EntityId>,

    /// Stock keeping unit, unique in the catalog
    #[arg(long)]
    pub sku: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Product type code
    #[arg(long = "type", default_value = "simple")]
    pub type_id: String,

    /// Mark the entity disabled
    #[arg(long)]
    pub disabled: bool,

    /// Catalog visibility (not_visible, catalog, search, both)
    #[arg(long, default_value = "both")]
    pub visibility: Visibility,

    /// Mark the entity as not currently purchasable
    #[arg(long)]
    pub not_saleable: bool,

    /// Base (tax-excluded) price
    #[arg(long)]
    pub price: Option<f64>,

    /// Tax-included price
    #[arg(long)]
    pub price_incl_tax: Option<f64>,

    /// Special price
    #[arg(long)]
    pub special_price: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Entity id
    #[arg(value_parser = parse_entity_id)]
    pub id: EntityId,
}

pub fn run(cmd: EntityCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EntityCommands::Add(args) => run_add(args, global),
        EntityCommands::List => run_list(global),
        EntityCommands::Remove(args) => run_remove(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (_, _, store) = open_workspace(global)?;

    let id = match args.id {
        Some(id) => id,
        None => store.next_entity_id()?,
    };

    let mut entity = CatalogEntity::new(id, args.sku.trim())
        .with_visibility(args.visibility)
        .with_saleable(!args.not_saleable);
    if args.disabled {
        entity = entity.with_status(Status::Disabled);
    }
    if let Some(name) = args.name {
        entity = entity.with_name(name);
    }
    entity.type_id = Some(args.type_id);
    entity.price = args.price;
    entity.price_incl_tax = args.price_incl_tax;
    entity.special_price = args.special_price;

    if entity.sku.is_empty() {
        return Err(miette::miette!("sku must not be empty"));
    }

    store.upsert_entity(&entity)?;

    if global.quiet {
        println!("{}", id);
    } else {
        println!(
            "{} Saved entity {} ({})",
            style("✓").green(),
            style(id).cyan(),
            entity.sku
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let (_, config, store) = open_workspace(global)?;
    let entities = store.list_entities()?;
    let format = effective_format(global, &config);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entities).into_diagnostic()?);
        return Ok(());
    }

    let mut table = Table::new(&["ID", "SKU", "NAME", "TYPE", "STATUS", "VISIBILITY", "SALEABLE", "PRICE"]);
    for e in &entities {
        table.push_row(vec![
            e.id.to_string(),
            e.sku.clone(),
            e.name.clone().unwrap_or_default(),
            e.type_id.clone().unwrap_or_default(),
            e.status.to_string(),
            e.visibility.to_string(),
            if e.saleable { "yes" } else { "no" }.to_string(),
            e.price.map(format_amount).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    print_table(&table, format, "entity", global.quiet);
    Ok(())
}

fn run_remove(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let (_, _, store) = open_workspace(global)?;
    if !store.delete_entity(args.id)? {
        return Err(miette::miette!("entity {} not found", args.id));
    }
    if !global.quiet {
        println!("{} Removed entity {}", style("✓").green(), style(args.id).cyan());
    }
    Ok(())
}
