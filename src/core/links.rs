//! Link records and the collaborator seams around them
//!
//! `LinkRecordSource` and `BulkEntityLoader` feed the read side,
//! `LinkReconciler` is the write-side extension point called by the
//! admin-form, copy and CSV adapters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::entity::Entity;
use crate::core::error::StoreError;
use crate::core::filter::AttributeSet;
use crate::core::identity::{EntityId, LinkKind};

/// One raw row of the relation, as read from storage
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    /// Owner of the link
    pub source_id: EntityId,

    /// Target id as stored; rows with a non-positive id are invalid
    pub linked_id: i64,

    /// Required quantity, if the row carries one
    pub qty: Option<f64>,

    /// Explicit ordering key, if the row carries one
    pub position: Option<i64>,
}

impl LinkRecord {
    pub fn new(source_id: EntityId, linked_id: i64) -> Self {
        Self {
            source_id,
            linked_id,
            qty: None,
            position: None,
        }
    }

    pub fn with_qty(mut self, qty: f64) -> Self {
        self.qty = Some(qty);
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// The validated target id, `None` for invalid rows
    pub fn linked(&self) -> Option<EntityId> {
        EntityId::new(self.linked_id)
    }
}

/// Reads raw link rows for one `(source, kind)` pair
pub trait LinkRecordSource {
    /// Rows in storage-insertion order.
    ///
    /// Fails with `StoreError::NotFound` only when the source entity does not
    /// exist; an existing entity without links yields an empty vector.
    fn fetch(&self, source: EntityId, kind: LinkKind) -> Result<Vec<LinkRecord>, StoreError>;
}

/// Loads many entities by id in a single retrieval
pub trait BulkEntityLoader {
    type Entity: Entity;

    /// Ids without an entity are absent from the map. Implementations must
    /// issue at most one retrieval per call and none for an empty `ids`.
    fn load_many(
        &self,
        ids: &[EntityId],
        attributes: &AttributeSet,
    ) -> Result<HashMap<EntityId, Self::Entity>, StoreError>;
}

/// Target side of a persisted link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub linked_id: EntityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<f64>,

    #[serde(default)]
    pub position: i64,
}

impl LinkTarget {
    pub fn new(linked_id: EntityId, qty: Option<f64>, position: i64) -> Self {
        Self {
            linked_id,
            qty,
            position,
        }
    }
}

/// A persisted link of any kind
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLink {
    pub kind: LinkKind,
    pub target: LinkTarget,
}

/// Write-side access used by link reconciliation, copy and import
pub trait LinkReconciler {
    fn entity_exists(&self, id: EntityId) -> Result<bool, StoreError>;

    fn resolve_sku(&self, sku: &str) -> Result<Option<EntityId>, StoreError>;

    /// `(id, sku)` of every entity, ordered by id
    fn catalog_skus(&self) -> Result<Vec<(EntityId, String)>, StoreError>;

    /// All links of `source`, every kind, in insertion order
    fn stored_links(&self, source: EntityId) -> Result<Vec<StoredLink>, StoreError>;

    /// Replace the complete link set of `source`
    fn replace_links(&mut self, source: EntityId, links: &[StoredLink]) -> Result<(), StoreError>;
}

/// One row posted by the admin form: `{id, qty, position}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedLink {
    pub id: i64,

    #[serde(default)]
    pub qty: Option<f64>,

    #[serde(default)]
    pub position: Option<i64>,
}

impl PostedLink {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            qty: None,
            position: None,
        }
    }

    pub fn with_qty(mut self, qty: f64) -> Self {
        self.qty = Some(qty);
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

impl std::str::FromStr for PostedLink {
    type Err = String;

    /// Parse `id[:qty[:position]]`, e.g. `12:2.5:10`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let id = parts
            .next()
            .unwrap_or_default()
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid link '{}': id must be a number", s))?;

        let qty = match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
            Some(q) => Some(
                q.replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| format!("invalid link '{}': qty must be a number", s))?,
            ),
            None => None,
        };

        let position = match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(
                p.parse::<i64>()
                    .map_err(|_| format!("invalid link '{}': position must be an integer", s))?,
            ),
            None => None,
        };

        if parts.next().is_some() {
            return Err(format!("invalid link '{}': expected id[:qty[:position]]", s));
        }

        Ok(Self { id, qty, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_record_validates_target() {
        let source = EntityId::new(1).unwrap();
        assert_eq!(LinkRecord::new(source, 5).linked(), EntityId::new(5));
        assert_eq!(LinkRecord::new(source, 0).linked(), None);
        assert_eq!(LinkRecord::new(source, -2).linked(), None);
    }

    #[test]
    fn test_posted_link_parsing() {
        assert_eq!("12".parse::<PostedLink>().unwrap(), PostedLink::new(12));
        assert_eq!(
            "12:2.5:10".parse::<PostedLink>().unwrap(),
            PostedLink::new(12).with_qty(2.5).with_position(10)
        );
        assert_eq!(
            "7:1,5".parse::<PostedLink>().unwrap(),
            PostedLink::new(7).with_qty(1.5)
        );
        assert_eq!(
            "7::3".parse::<PostedLink>().unwrap(),
            PostedLink::new(7).with_position(3)
        );
        assert!("x:1".parse::<PostedLink>().is_err());
        assert!("1:2:3:4".parse::<PostedLink>().is_err());
    }
}
