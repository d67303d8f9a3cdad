//! `partlink config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{ENV_LINK_KIND, ENV_LOG, ENV_TAX_DISPLAY};
use crate::core::identity::LinkKind;
use crate::core::pricing::TaxDisplayMode;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (see `partlink config keys`)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn load_config(global: &GlobalOpts) -> Config {
    match open_project(global) {
        Ok(project) => Config::load_for(&project),
        Err(_) => Config::load(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    if let Some(key) = &args.key {
        require_known_key(key)?;
        return match config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in Config::keys() {
        match config_value(&config, key) {
            Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
            None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
        }
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!(
        "  1. Environment variables ({}, {}, {})",
        ENV_LINK_KIND, ENV_TAX_DISPLAY, ENV_LOG
    );
    println!("  2. Project config (.partlink/config.yaml)");
    println!("  3. Global config (~/.config/partlink/config.yaml)");
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let path = config_path(args.global, global)?;
    let value = typed_value(&args.key, &args.value)?;

    let mut map = read_mapping(&path)?;
    map.insert(serde_yml::Value::String(args.key.clone()), value);
    write_mapping(&path, map)?;

    if !global.quiet {
        println!(
            "{} Set {} {} {} in {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            style("→").dim(),
            style(&args.value).yellow(),
            scope(args.global)
        );
    }
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let path = config_path(args.global, global)?;
    if !path.exists() {
        return Err(miette::miette!("Config file does not exist: {}", path.display()));
    }

    let mut map = read_mapping(&path)?;
    if map.remove(args.key.as_str()).is_none() {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_mapping(&path, map)?;

    if !global.quiet {
        println!(
            "{} Removed {} from {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            scope(args.global)
        );
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => print_path("Global:", &path),
        None => println!("  {} {}", style("Global:").cyan(), style("(unavailable)").dim()),
    }

    match open_project(global) {
        Ok(project) => print_path("Project:", &project.config_path()),
        Err(_) => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a partlink project)").dim()
        ),
    }
    Ok(())
}

fn print_path(label: &str, path: &Path) {
    let state = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("  {} {} {}", style(label).cyan(), path.display(), state);
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in Config::keys() {
        println!("  {:<16} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'partlink config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn scope(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "project"
    }
}

fn config_path(global_scope: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if global_scope {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("Could not determine global config directory"))
    } else {
        Ok(open_project(global)?.config_path())
    }
}

fn require_known_key(key: &str) -> Result<()> {
    if Config::keys().iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "run 'partlink config keys' to list valid keys",
            "Unknown configuration key '{}'",
            key
        ))
    }
}

/// Effective value of `key` rendered for display
fn config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "link_kind" => config.link_kind.map(|k| k.to_string()),
        "tax_display" => config.tax_display.map(|t| t.to_string()),
        "show_disabled" => config.show_disabled.map(|b| b.to_string()),
        "show_all" => config.show_all.map(|b| b.to_string()),
        "show_invisible" => config.show_invisible.map(|b| b.to_string()),
        "log_level" => config.log_level.clone(),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

/// Validate `raw` for `key` and convert it to the YAML value the loader expects
fn typed_value(key: &str, raw: &str) -> Result<serde_yml::Value> {
    require_known_key(key)?;
    let invalid = |e: String| miette::miette!("Invalid value for {}: {}", key, e);

    let value = match key {
        "link_kind" => {
            let kind: LinkKind = raw.parse().map_err(|e: crate::core::IdParseError| invalid(e.to_string()))?;
            serde_yml::Value::String(kind.code().to_string())
        }
        "tax_display" => {
            let mode: TaxDisplayMode = raw.parse().map_err(invalid)?;
            serde_yml::Value::String(mode.to_string())
        }
        "show_disabled" | "show_all" | "show_invisible" => {
            let flag: bool = raw
                .parse()
                .map_err(|_| invalid(format!("'{}' is not true or false", raw)))?;
            serde_yml::Value::Bool(flag)
        }
        "default_format" => {
            let format: OutputFormat = raw.parse().map_err(invalid)?;
            serde_yml::Value::String(format!("{:?}", format).to_lowercase())
        }
        _ => serde_yml::Value::String(raw.to_string()),
    };
    Ok(value)
}

fn read_mapping(path: &Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    // Empty or comment-only files parse to null
    match serde_yml::from_str::<serde_yml::Value>(&content).into_diagnostic()? {
        serde_yml::Value::Mapping(map) => Ok(map),
        serde_yml::Value::Null => Ok(serde_yml::Mapping::new()),
        _ => Err(miette::miette!("{} is not a YAML mapping", path.display())),
    }
}

fn write_mapping(path: &Path, map: serde_yml::Mapping) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&serde_yml::Value::Mapping(map)).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()?;
    Ok(())
}
