//! Project discovery and structure

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project metadata directory
pub const PROJECT_DIR: &str = ".partlink";

/// Represents a partlink project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .partlink/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = Self::normalize_root(path)?;
        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }
        Self::write_structure(root)
    }

    /// Initialize even if .partlink/ exists; rewrites the config, keeps the catalog
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = Self::normalize_root(path)?;
        Self::write_structure(root)
    }

    fn normalize_root(path: &Path) -> Result<PathBuf, ProjectError> {
        std::fs::create_dir_all(path).map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()))
    }

    fn write_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // The catalog database is local state
        std::fs::write(dir.join(".gitignore"), "catalog.db*\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# partlink project configuration

# Link kind resolved by show/qty-map/query/export (partlists, relation, up_sell, cross_sell)
# link_kind: partlists

# Price shown next to each part (excluding_tax, including_tax, both)
# tax_display: excluding_tax

# Storefront filter overrides
# show_disabled: false
# show_all: false
# show_invisible: false

# Log filter when PARTLINK_LOG is unset (error, warn, info, debug, trace)
# log_level: warn

# Default output format (auto, tsv, json, csv, md)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .partlink metadata directory
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Project configuration file
    pub fn config_path(&self) -> PathBuf {
        self.meta_dir().join("config.yaml")
    }

    /// SQLite catalog holding entities and links
    pub fn catalog_path(&self) -> PathBuf {
        self.meta_dir().join("catalog.db")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a partlink project (searched from {searched_from:?})")]
    #[diagnostic(
        code(partlink::project::not_found),
        help("run 'partlink init' to create one")
    )]
    NotFound { searched_from: PathBuf },

    #[error("partlink project already exists at {0:?}")]
    #[diagnostic(
        code(partlink::project::exists),
        help("use 'partlink init --force' to rewrite the configuration")
    )]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(partlink::project::io))]
    IoError(String),
}
