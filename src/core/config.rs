//! Configuration management with layered hierarchy
//!
//! Built-in defaults < global `config.yaml` < project `.partlink/config.yaml`
//! < `PARTLINK_*` environment variables. Command-line flags override the
//! result at the call site.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::filter::FilterPolicy;
use crate::core::identity::LinkKind;
use crate::core::pricing::TaxDisplayMode;
use crate::core::Project;

/// Environment variable selecting the link kind
pub const ENV_LINK_KIND: &str = "PARTLINK_LINK_KIND";
/// Environment variable selecting the tax display mode
pub const ENV_TAX_DISPLAY: &str = "PARTLINK_TAX_DISPLAY";
/// Environment variable holding a tracing filter directive
pub const ENV_LOG: &str = "PARTLINK_LOG";

/// partlink configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Link kind resolved when a command is not told otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_kind: Option<LinkKind>,

    /// Which price to display next to resolved entities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_display: Option<TaxDisplayMode>,

    /// Include disabled entities (bypasses status and saleability filters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_disabled: Option<bool>,

    /// Include entities that are not currently saleable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_all: Option<bool>,

    /// Include entities not visible in the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_invisible: Option<bool>,

    /// Tracing filter used when PARTLINK_LOG is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    /// Problems met while loading, reported once logging is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_layers(
            Self::global_config_path().as_deref(),
            project.as_ref().map(|p| p.config_path()).as_deref(),
            |key| std::env::var(key).ok(),
        )
    }

    /// Load configuration for an explicitly given project
    pub fn load_for(project: &Project) -> Self {
        Self::load_layers(
            Self::global_config_path().as_deref(),
            Some(&project.config_path()),
            |key| std::env::var(key).ok(),
        )
    }

    /// Merge the given layers; `env` looks up environment variables
    pub fn load_layers(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config, 3. project config
        for path in [global, project].into_iter().flatten() {
            config.merge_file(path);
        }

        // 4. Environment variables
        if let Some(raw) = env(ENV_LINK_KIND) {
            match raw.parse::<LinkKind>() {
                Ok(kind) => config.link_kind = Some(kind),
                Err(e) => config.warnings.push(format!("ignoring {}: {}", ENV_LINK_KIND, e)),
            }
        }
        if let Some(raw) = env(ENV_TAX_DISPLAY) {
            match raw.parse::<TaxDisplayMode>() {
                Ok(mode) => config.tax_display = Some(mode),
                Err(e) => config.warnings.push(format!("ignoring {}: {}", ENV_TAX_DISPLAY, e)),
            }
        }
        if let Some(raw) = env(ENV_LOG) {
            config.log_level = Some(raw);
        }

        config
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| serde_yml::from_str::<Config>(&contents).map_err(|e| e.to_string()));
        match parsed {
            Ok(layer) => self.merge(layer),
            Err(e) => self
                .warnings
                .push(format!("ignoring config {}: {}", path.display(), e)),
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "partlink")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.link_kind.is_some() {
            self.link_kind = other.link_kind;
        }
        if other.tax_display.is_some() {
            self.tax_display = other.tax_display;
        }
        if other.show_disabled.is_some() {
            self.show_disabled = other.show_disabled;
        }
        if other.show_all.is_some() {
            self.show_all = other.show_all;
        }
        if other.show_invisible.is_some() {
            self.show_invisible = other.show_invisible;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Effective link kind
    pub fn link_kind(&self) -> LinkKind {
        self.link_kind.unwrap_or_default()
    }

    /// Effective tax display mode
    pub fn tax_display(&self) -> TaxDisplayMode {
        self.tax_display.unwrap_or_default()
    }

    /// Storefront policy adjusted by the `show_*` keys
    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy::storefront()
            .with_disabled(self.show_disabled.unwrap_or(false))
            .with_all_products(self.show_all.unwrap_or(false))
            .with_invisible(self.show_invisible.unwrap_or(false))
    }

    /// Names of all recognised keys with a short description
    pub fn keys() -> &'static [(&'static str, &'static str)] {
        &[
            ("link_kind", "link kind to resolve (partlists, relation, up_sell, cross_sell)"),
            ("tax_display", "price to display (excluding_tax, including_tax, both)"),
            ("show_disabled", "include disabled entities"),
            ("show_all", "include entities that are not saleable"),
            ("show_invisible", "include entities not visible in the catalog"),
            ("log_level", "tracing filter when PARTLINK_LOG is unset"),
            ("default_format", "default output format (auto, tsv, json, csv, md)"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_layers(None, None, no_env);
        assert_eq!(config.link_kind(), LinkKind::PARTLISTS);
        assert_eq!(config.tax_display(), TaxDisplayMode::ExcludingTax);
        assert_eq!(config.filter_policy(), FilterPolicy::storefront());
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("global.yaml");
        let project = tmp.path().join("project.yaml");
        std::fs::write(&global, "link_kind: relation\nshow_all: true\n").unwrap();
        std::fs::write(&project, "link_kind: up_sell\n").unwrap();

        let config = Config::load_layers(Some(&global), Some(&project), no_env);
        assert_eq!(config.link_kind(), LinkKind::UP_SELL);
        assert_eq!(config.show_all, Some(true));
        assert!(config.filter_policy().include_all_products);
    }

    #[test]
    fn test_env_overrides_files() {
        let tmp = tempdir().unwrap();
        let project = tmp.path().join("project.yaml");
        std::fs::write(&project, "tax_display: excluding_tax\n").unwrap();

        let env: HashMap<&str, &str> = [(ENV_TAX_DISPLAY, "both"), (ENV_LOG, "debug")].into();
        let config = Config::load_layers(None, Some(&project), |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.tax_display(), TaxDisplayMode::Both);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_layers_become_warnings() {
        let tmp = tempdir().unwrap();
        let project = tmp.path().join("project.yaml");
        std::fs::write(&project, "show_disabled: [not, a, bool]\n").unwrap();

        let config = Config::load_layers(None, Some(&project), |k| {
            (k == ENV_LINK_KIND).then(|| "bogus".to_string())
        });
        assert_eq!(config.warnings.len(), 2);
        assert_eq!(config.link_kind(), LinkKind::PARTLISTS);
    }
}
