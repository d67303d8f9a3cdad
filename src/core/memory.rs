//! In-memory catalog
//!
//! Implements every store trait without a database. Counts fetch and
//! bulk-load calls and can be told to fail, which makes it the catalog of
//! choice for pipeline tests and for embedding the pipeline without SQLite.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::entity::CatalogEntity;
use crate::core::error::StoreError;
use crate::core::filter::AttributeSet;
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{
    BulkEntityLoader, LinkRecord, LinkRecordSource, LinkReconciler, LinkTarget, StoredLink,
};

/// Catalog held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entities: BTreeMap<EntityId, CatalogEntity>,
    /// Link rows of every kind, in insertion order
    records: Vec<(LinkKind, LinkRecord)>,
    fetch_calls: AtomicUsize,
    load_calls: AtomicUsize,
    fail_fetch: bool,
    fail_load: bool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity
    pub fn insert_entity(&mut self, entity: CatalogEntity) {
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity, leaving any link rows pointing at it dangling
    pub fn remove_entity(&mut self, id: EntityId) -> Option<CatalogEntity> {
        self.entities.remove(&id)
    }

    /// Append a raw link row; invalid target ids are stored as given
    pub fn push_record(&mut self, kind: LinkKind, record: LinkRecord) {
        self.records.push((kind, record));
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::Relaxed)
    }

    /// Make every subsequent `fetch` fail with `StoreError::Unavailable`
    pub fn fail_fetches(&mut self, fail: bool) {
        self.fail_fetch = fail;
    }

    /// Make every subsequent `load_many` fail with `StoreError::Unavailable`
    pub fn fail_loads(&mut self, fail: bool) {
        self.fail_load = fail;
    }
}

impl LinkRecordSource for MemoryCatalog {
    fn fetch(&self, source: EntityId, kind: LinkKind) -> Result<Vec<LinkRecord>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_fetch {
            return Err(StoreError::Unavailable("memory catalog fetch disabled".to_string()));
        }
        if !self.entities.contains_key(&source) {
            return Err(StoreError::NotFound { id: source });
        }

        Ok(self
            .records
            .iter()
            .filter(|(k, r)| *k == kind && r.source_id == source)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

impl BulkEntityLoader for MemoryCatalog {
    type Entity = CatalogEntity;

    /// Returns complete entities; the attribute selection is not applied
    fn load_many(
        &self,
        ids: &[EntityId],
        _attributes: &AttributeSet,
    ) -> Result<HashMap<EntityId, CatalogEntity>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.load_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_load {
            return Err(StoreError::Unavailable("memory catalog load disabled".to_string()));
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.entities.get(id).map(|e| (*id, e.clone())))
            .collect())
    }
}

impl LinkReconciler for MemoryCatalog {
    fn entity_exists(&self, id: EntityId) -> Result<bool, StoreError> {
        Ok(self.entities.contains_key(&id))
    }

    fn resolve_sku(&self, sku: &str) -> Result<Option<EntityId>, StoreError> {
        Ok(self
            .entities
            .values()
            .find(|e| e.sku == sku)
            .map(|e| e.id))
    }

    fn catalog_skus(&self) -> Result<Vec<(EntityId, String)>, StoreError> {
        Ok(self
            .entities
            .values()
            .map(|e| (e.id, e.sku.clone()))
            .collect())
    }

    fn stored_links(&self, source: EntityId) -> Result<Vec<StoredLink>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|(_, r)| r.source_id == source)
            .filter_map(|(kind, r)| {
                r.linked().map(|linked_id| StoredLink {
                    kind: *kind,
                    target: LinkTarget::new(linked_id, r.qty, r.position.unwrap_or(0)),
                })
            })
            .collect())
    }

    fn replace_links(&mut self, source: EntityId, links: &[StoredLink]) -> Result<(), StoreError> {
        self.records.retain(|(_, r)| r.source_id != source);
        for link in links {
            let mut record = LinkRecord::new(source, link.target.linked_id.get())
                .with_position(link.target.position);
            record.qty = link.target.qty;
            self.records.push((link.kind, record));
        }
        Ok(())
    }
}
