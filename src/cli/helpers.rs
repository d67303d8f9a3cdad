//! Shared helper functions for CLI commands

use miette::Result;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, LinkKind};
use crate::core::project::Project;
use crate::core::store::CatalogStore;
use crate::core::Config;

/// Locate the project from `--project` or by walking up from the cwd
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(root) => Project::discover_from(root)?,
        None => Project::discover()?,
    };
    Ok(project)
}

/// Open the catalog of a project
pub fn open_store(project: &Project) -> Result<CatalogStore> {
    Ok(CatalogStore::open(project)?)
}

/// Project, its layered configuration and its catalog
pub fn open_workspace(global: &GlobalOpts) -> Result<(Project, Config, CatalogStore)> {
    let project = open_project(global)?;
    let config = Config::load_for(&project);
    let store = open_store(&project)?;
    Ok((project, config, store))
}

/// Output format after applying the configured default to `auto`
pub fn effective_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| f.parse().ok())
        .unwrap_or(OutputFormat::Auto)
}

/// clap value parser for entity ids
pub fn parse_entity_id(s: &str) -> std::result::Result<EntityId, String> {
    s.parse().map_err(|e: crate::core::IdParseError| e.to_string())
}

/// clap value parser for link kinds
pub fn parse_link_kind(s: &str) -> std::result::Result<LinkKind, String> {
    s.parse().map_err(|e: crate::core::IdParseError| e.to_string())
}

/// Format a price for display
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn global(format: OutputFormat) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            project: None::<PathBuf>,
        }
    }

    #[test]
    fn test_effective_format_uses_config_for_auto() {
        let config = Config {
            default_format: Some("md".to_string()),
            ..Default::default()
        };
        assert_eq!(effective_format(&global(OutputFormat::Auto), &config), OutputFormat::Md);
        assert_eq!(effective_format(&global(OutputFormat::Csv), &config), OutputFormat::Csv);
    }

    #[test]
    fn test_effective_format_ignores_unknown_default() {
        let config = Config {
            default_format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert_eq!(effective_format(&global(OutputFormat::Auto), &config), OutputFormat::Auto);
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_entity_id("12").unwrap().get(), 12);
        assert!(parse_entity_id("0").is_err());
        assert_eq!(parse_link_kind("related").unwrap(), LinkKind::RELATED);
        assert!(parse_link_kind("bogus").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(11.9), "11.90");
    }
}
