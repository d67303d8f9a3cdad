//! `partlink query` command - JSON query response for an entity

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_workspace, parse_entity_id, parse_link_kind};
use crate::cli::GlobalOpts;
use crate::core::filter::FilterPolicy;
use crate::core::identity::{EntityId, LinkKind};
use crate::core::resolve::ResolutionPipeline;
use crate::interop::QueryResponse;

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    /// Source entity id
    #[arg(value_parser = parse_entity_id)]
    pub source: EntityId,

    /// Link kind (default: configured link_kind)
    #[arg(long, short = 'k', value_parser = parse_link_kind)]
    pub kind: Option<LinkKind>,

    /// Apply the storefront filters instead of returning every linked entity
    #[arg(long)]
    pub storefront: bool,
}

/// Always prints JSON; `--format` does not apply
pub fn run(args: QueryArgs, global: &GlobalOpts) -> Result<()> {
    let (_, config, store) = open_workspace(global)?;
    let kind = args.kind.unwrap_or_else(|| config.link_kind());
    let policy = if args.storefront {
        FilterPolicy::storefront()
    } else {
        FilterPolicy::admin()
    };

    let pipeline = ResolutionPipeline::new(&store, &store);
    let response = QueryResponse::build(&pipeline, Some(args.source), kind, &policy);
    println!("{}", response.to_json_pretty().into_diagnostic()?);
    Ok(())
}
