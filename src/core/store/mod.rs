//! SQLite-backed catalog of entities and their links
//!
//! The catalog lives in `.partlink/catalog.db` and holds:
//! - entities with the flags the filter policy evaluates
//! - the registered link types and their typed attributes
//! - link rows keyed by `(source_id, link_type_id, linked_id)`
//!
//! `CatalogStore` implements the record source, the bulk loader and the
//! reconciler, so one store serves both the read and the write paths.

mod links;
mod queries;
mod schema;

use std::path::Path;

use rusqlite::Connection;

use crate::core::error::StoreError;
use crate::core::project::Project;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// The catalog backed by SQLite
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open or create the catalog of a project
    pub fn open(project: &Project) -> Result<Self, StoreError> {
        Self::open_path(&project.catalog_path())
    }

    /// Open or create a catalog at an explicit path
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::with_connection(conn)
    }

    /// Fresh catalog that lives only as long as the value
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        // `rarray()` table function used by the bulk loader
        rusqlite::vtab::array::load_module(&conn)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }
}
