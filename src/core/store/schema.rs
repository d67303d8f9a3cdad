//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::{CatalogStore, SCHEMA_VERSION};
use crate::core::error::StoreError;
use crate::core::identity::LinkKind;

/// Typed attributes every link type carries
const LINK_ATTRIBUTES: &[(&str, &str)] = &[("position", "int"), ("qty", "decimal")];

impl CatalogStore {
    /// Create missing tables and register the built-in link types
    ///
    /// Idempotent. Refuses a catalog written by a newer schema version.
    pub(super) fn ensure_schema(&self) -> Result<(), StoreError> {
        let found = self.stored_schema_version()?;
        if let Some(version) = found {
            if version > SCHEMA_VERSION {
                return Err(StoreError::Unavailable(format!(
                    "catalog schema version {} is newer than supported version {}",
                    version, SCHEMA_VERSION
                )));
            }
        }

        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Catalog entities with their precomputed flags
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY,
                sku TEXT NOT NULL UNIQUE,
                name TEXT,
                type_id TEXT,
                status INTEGER NOT NULL DEFAULT 1,
                visibility INTEGER NOT NULL DEFAULT 4,
                saleable INTEGER NOT NULL DEFAULT 1,
                price REAL,
                price_incl_tax REAL,
                special_price REAL,
                image TEXT,
                thumbnail TEXT
            );

            -- Link kinds sharing the links table
            CREATE TABLE IF NOT EXISTS link_types (
                link_type_id INTEGER PRIMARY KEY,
                code TEXT NOT NULL UNIQUE
            );

            -- Attributes attached to the rows of each link kind
            CREATE TABLE IF NOT EXISTS link_type_attributes (
                link_type_id INTEGER NOT NULL,
                code TEXT NOT NULL,
                data_type TEXT NOT NULL,
                PRIMARY KEY (link_type_id, code),
                FOREIGN KEY (link_type_id) REFERENCES link_types(link_type_id) ON DELETE CASCADE
            );

            -- Link rows; linked_id is not a foreign key, removed targets
            -- leave dangling rows behind
            CREATE TABLE IF NOT EXISTS links (
                link_id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                link_type_id INTEGER NOT NULL,
                linked_id INTEGER NOT NULL,
                position INTEGER,
                qty REAL,
                UNIQUE (source_id, link_type_id, linked_id),
                FOREIGN KEY (source_id) REFERENCES entities(id) ON DELETE CASCADE,
                FOREIGN KEY (link_type_id) REFERENCES link_types(link_type_id)
            );
            CREATE INDEX IF NOT EXISTS idx_links_source_type ON links(source_id, link_type_id);
            CREATE INDEX IF NOT EXISTS idx_links_linked ON links(linked_id);
            "#,
        )?;

        for kind in LinkKind::all() {
            self.conn.execute(
                "INSERT OR IGNORE INTO link_types (link_type_id, code) VALUES (?1, ?2)",
                params![kind.type_id(), kind.code()],
            )?;
            for (code, data_type) in LINK_ATTRIBUTES {
                self.conn.execute(
                    "INSERT OR IGNORE INTO link_type_attributes (link_type_id, code, data_type)
                     VALUES (?1, ?2, ?3)",
                    params![kind.type_id(), code, data_type],
                )?;
            }
        }

        if found != Some(SCHEMA_VERSION) {
            self.conn.execute("DELETE FROM schema_version", [])?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
        }

        Ok(())
    }

    /// Version recorded in the catalog, `None` for a fresh database
    fn stored_schema_version(&self) -> Result<Option<i32>, StoreError> {
        let has_table: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(None);
        }

        Ok(self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i32>>(0)
            })
            .optional()?
            .flatten())
    }

    /// `(code, data_type)` attributes registered for a link kind
    pub fn link_type_attributes(&self, kind: LinkKind) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT code, data_type FROM link_type_attributes WHERE link_type_id = ?1 ORDER BY code",
        )?;
        let rows = stmt
            .query_map(params![kind.type_id()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
