//! Linked-entity resolution pipeline
//!
//! Turns the raw link rows of one source entity into an ordered, filtered
//! list of loaded entities carrying their quantity and position:
//!
//! 1. fetch the link rows for `(source, kind)`
//! 2. collect the ordered-unique valid target ids plus qty/position per id
//! 3. bulk load every target in one call
//! 4. drop missing entities and those the filter policy rejects
//! 5. restore link-declaration order (the bulk load has none)
//! 6. merge qty and position
//! 7. optionally stable-sort by position
//!
//! Duplicate target ids within one fetch keep the place of their first
//! occurrence; their qty and position come from the last occurrence.
//!
//! Resolution is best-effort: store failures are logged and produce an
//! empty result rather than an error.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, error};

use crate::core::entity::Entity;
use crate::core::error::StoreError;
use crate::core::filter::FilterPolicy;
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{BulkEntityLoader, LinkRecord, LinkRecordSource};
use crate::core::qty::{normalize, QtyContext};

/// Output ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Entities in link-declaration order
    #[default]
    OrderOnly,
    /// Entities sorted by position, ties in declaration order
    PositionSorted,
}

/// A resolved entity with its link metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem<E> {
    pub entity: E,
    pub qty: f64,
    pub position: i64,
}

/// Counters describing what happened during one resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    /// Link rows fetched
    pub records: usize,
    /// Rows discarded for a non-positive target id
    pub invalid: usize,
    /// Distinct valid target ids
    pub distinct: usize,
    /// Targets with no entity in the bulk load
    pub missing: usize,
    /// Loaded entities rejected by the filter policy
    pub filtered: usize,
}

/// Result of one resolution call, owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution<E> {
    pub items: Vec<ResolvedItem<E>>,
    /// Ids of `items`, in output order
    pub ids: Vec<EntityId>,
    pub stats: ResolutionStats,
}

impl<E> Resolution<E> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            ids: Vec::new(),
            stats: ResolutionStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    fn from_items(items: Vec<ResolvedItem<E>>, stats: ResolutionStats) -> Self
    where
        E: Entity,
    {
        let ids = items.iter().map(|item| item.entity.id()).collect();
        Self { items, ids, stats }
    }
}

/// Ordered-unique target ids with their per-id metadata
#[derive(Debug, Default)]
struct CollectedLinks {
    order: Vec<EntityId>,
    qty_by_id: HashMap<EntityId, Option<f64>>,
    pos_by_id: HashMap<EntityId, i64>,
    invalid: usize,
}

impl CollectedLinks {
    fn collect(records: &[LinkRecord]) -> Self {
        let mut collected = Self::default();
        let mut seen = HashSet::new();

        for record in records {
            let Some(id) = record.linked() else {
                collected.invalid += 1;
                continue;
            };
            if seen.insert(id) {
                collected.order.push(id);
            }
            collected.qty_by_id.insert(id, record.qty);
            collected.pos_by_id.insert(id, record.position.unwrap_or(0));
        }

        collected
    }
}

/// Resolves link rows into entities using the given collaborators
///
/// Holds only shared references; independent resolutions can run in
/// parallel whenever the collaborators are `Sync`.
pub struct ResolutionPipeline<'a, S, L> {
    source: &'a S,
    loader: &'a L,
}

impl<'a, S, L> ResolutionPipeline<'a, S, L>
where
    S: LinkRecordSource,
    L: BulkEntityLoader,
{
    pub fn new(source: &'a S, loader: &'a L) -> Self {
        Self { source, loader }
    }

    /// Resolve the links of `subject` for `kind` as a display list
    ///
    /// A `None` subject (never persisted) yields an empty result without
    /// touching the store.
    pub fn resolve(
        &self,
        subject: Option<EntityId>,
        kind: LinkKind,
        policy: &FilterPolicy,
        mode: ResolveMode,
    ) -> Resolution<L::Entity> {
        self.resolve_with_qty(subject, kind, policy, mode, QtyContext::Display)
    }

    /// Like `resolve`, with an explicit quantity default rule
    pub fn resolve_with_qty(
        &self,
        subject: Option<EntityId>,
        kind: LinkKind,
        policy: &FilterPolicy,
        mode: ResolveMode,
        qty_context: QtyContext,
    ) -> Resolution<L::Entity> {
        let Some(source_id) = subject else {
            debug!(kind = %kind, "no subject identity, nothing to resolve");
            return Resolution::empty();
        };

        match self.try_resolve(source_id, kind, policy, mode, qty_context) {
            Ok(resolution) => resolution,
            Err(StoreError::NotFound { id }) => {
                debug!(source = %id, kind = %kind, "source entity not found");
                Resolution::empty()
            }
            Err(e) => {
                error!(source = %source_id, kind = %kind, error = %e, "link resolution failed");
                Resolution::empty()
            }
        }
    }

    /// Ids of the order-only resolution
    pub fn linked_ids(
        &self,
        subject: Option<EntityId>,
        kind: LinkKind,
        policy: &FilterPolicy,
    ) -> Vec<EntityId> {
        self.resolve(subject, kind, policy, ResolveMode::OrderOnly).ids
    }

    /// Resolve several sources, one independent resolution each
    pub fn resolve_many(
        &self,
        subjects: &[EntityId],
        kind: LinkKind,
        policy: &FilterPolicy,
        mode: ResolveMode,
    ) -> BTreeMap<EntityId, Resolution<L::Entity>> {
        subjects
            .iter()
            .map(|&id| (id, self.resolve(Some(id), kind, policy, mode)))
            .collect()
    }

    /// Raw id -> qty map over every valid link row; no entity load
    ///
    /// Quantities are clamped to `>= 0` and default to `0.0` when absent.
    pub fn qty_map(&self, subject: Option<EntityId>, kind: LinkKind) -> BTreeMap<EntityId, f64> {
        let Some(source_id) = subject else {
            return BTreeMap::new();
        };

        let records = match self.source.fetch(source_id, kind) {
            Ok(records) => records,
            Err(StoreError::NotFound { .. }) => return BTreeMap::new(),
            Err(e) => {
                error!(source = %source_id, kind = %kind, error = %e, "qty map lookup failed");
                return BTreeMap::new();
            }
        };

        records
            .iter()
            .filter_map(|r| r.linked().map(|id| (id, normalize(r.qty, QtyContext::RawMap))))
            .collect()
    }

    fn try_resolve(
        &self,
        source_id: EntityId,
        kind: LinkKind,
        policy: &FilterPolicy,
        mode: ResolveMode,
        qty_context: QtyContext,
    ) -> Result<Resolution<L::Entity>, StoreError> {
        let records = self.source.fetch(source_id, kind)?;
        let links = CollectedLinks::collect(&records);

        let mut stats = ResolutionStats {
            records: records.len(),
            invalid: links.invalid,
            distinct: links.order.len(),
            ..Default::default()
        };

        if links.order.is_empty() {
            debug!(source = %source_id, kind = %kind, records = stats.records, "no valid links");
            return Ok(Resolution::from_items(Vec::new(), stats));
        }

        let mut loaded = self.loader.load_many(&links.order, &policy.attributes())?;

        let mut items = Vec::with_capacity(links.order.len());
        for id in &links.order {
            let Some(entity) = loaded.remove(id) else {
                stats.missing += 1;
                continue;
            };
            if !policy.includes(&entity) {
                stats.filtered += 1;
                continue;
            }
            items.push(ResolvedItem {
                entity,
                qty: normalize(links.qty_by_id.get(id).copied().flatten(), qty_context),
                position: links.pos_by_id.get(id).copied().unwrap_or(0),
            });
        }

        if mode == ResolveMode::PositionSorted {
            items.sort_by_key(|item| item.position);
        }

        debug!(
            source = %source_id,
            kind = %kind,
            resolved = items.len(),
            missing = stats.missing,
            filtered = stats.filtered,
            "resolved links"
        );

        Ok(Resolution::from_items(items, stats))
    }
}
