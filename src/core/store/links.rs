//! Link rows: record source, bulk loader and reconciler implementations

use std::collections::HashMap;
use std::rc::Rc;

use rusqlite::types::Value;
use rusqlite::vtab::array::Array;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use super::queries::{entity_from_row, select_columns};
use super::CatalogStore;
use crate::core::entity::CatalogEntity;
use crate::core::error::StoreError;
use crate::core::filter::AttributeSet;
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{
    BulkEntityLoader, LinkRecord, LinkRecordSource, LinkReconciler, LinkTarget, StoredLink,
};

impl CatalogStore {
    fn require_entity(&self, id: EntityId) -> Result<(), StoreError> {
        if self.entity_exists(id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound { id })
        }
    }

    /// Insert one raw link row as given, bypassing validation
    ///
    /// Used for seeding and by importers that already validated the row.
    pub fn insert_link_record(&self, kind: LinkKind, record: &LinkRecord) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO links (source_id, link_type_id, linked_id, position, qty)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(source_id, link_type_id, linked_id) DO UPDATE SET
                   position = excluded.position,
                   qty = excluded.qty"#,
            params![
                record.source_id.get(),
                kind.type_id(),
                record.linked_id,
                record.position,
                record.qty,
            ],
        )?;
        Ok(())
    }

    /// Number of link rows of every kind
    pub fn link_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl LinkRecordSource for CatalogStore {
    fn fetch(&self, source: EntityId, kind: LinkKind) -> Result<Vec<LinkRecord>, StoreError> {
        self.require_entity(source)?;

        let mut stmt = self.conn.prepare(
            r#"SELECT linked_id, qty, position FROM links
               WHERE source_id = ?1 AND link_type_id = ?2
               ORDER BY link_id"#,
        )?;
        let records = stmt
            .query_map(params![source.get(), kind.type_id()], |row| {
                Ok(LinkRecord {
                    source_id: source,
                    linked_id: row.get(0)?,
                    qty: row.get(1)?,
                    position: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(source = %source, kind = %kind, rows = records.len(), "fetched link rows");
        Ok(records)
    }
}

impl BulkEntityLoader for CatalogStore {
    type Entity = CatalogEntity;

    fn load_many(
        &self,
        ids: &[EntityId],
        attributes: &AttributeSet,
    ) -> Result<HashMap<EntityId, CatalogEntity>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let columns = select_columns(Some(attributes));
        // One bound array regardless of the id count
        let sql = format!(
            "SELECT {} FROM entities WHERE id IN rarray(?1)",
            columns.join(", ")
        );
        let id_array: Array = Rc::new(ids.iter().map(|id| Value::from(id.get())).collect());

        let mut stmt = self.conn.prepare(&sql)?;
        let loaded = stmt
            .query_map(params![id_array], |row| entity_from_row(row, &columns))?
            .map(|entity| entity.map(|e| (e.id, e)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        debug!(requested = ids.len(), loaded = loaded.len(), "bulk loaded entities");
        Ok(loaded)
    }
}

impl LinkReconciler for CatalogStore {
    fn entity_exists(&self, id: EntityId) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT 1 FROM entities WHERE id = ?1", params![id.get()], |_| Ok(()))
            .optional()?
            .is_some())
    }

    fn resolve_sku(&self, sku: &str) -> Result<Option<EntityId>, StoreError> {
        let raw: Option<i64> = self
            .conn
            .query_row("SELECT id FROM entities WHERE sku = ?1", params![sku], |row| row.get(0))
            .optional()?;
        Ok(raw.and_then(EntityId::new))
    }

    fn catalog_skus(&self) -> Result<Vec<(EntityId, String)>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id, sku FROM entities ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, sku)| EntityId::new(id).map(|id| (id, sku)))
            .collect())
    }

    fn stored_links(&self, source: EntityId) -> Result<Vec<StoredLink>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"SELECT link_type_id, linked_id, qty, position FROM links
               WHERE source_id = ?1
               ORDER BY link_id"#,
        )?;
        let rows = stmt
            .query_map(params![source.get()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut links = Vec::with_capacity(rows.len());
        for (type_id, linked_id, qty, position) in rows {
            let (Some(kind), Some(linked_id)) = (LinkKind::from_type_id(type_id), EntityId::new(linked_id)) else {
                warn!(source = %source, type_id, linked_id, "ignoring unrecognised link row");
                continue;
            };
            links.push(StoredLink {
                kind,
                target: LinkTarget::new(linked_id, qty, position.unwrap_or(0)),
            });
        }
        Ok(links)
    }

    fn replace_links(&mut self, source: EntityId, links: &[StoredLink]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM links WHERE source_id = ?1", params![source.get()])?;
        {
            let mut insert = tx.prepare(
                r#"INSERT INTO links (source_id, link_type_id, linked_id, position, qty)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for link in links {
                insert.execute(params![
                    source.get(),
                    link.kind.type_id(),
                    link.target.linked_id.get(),
                    link.target.position,
                    link.target.qty,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
