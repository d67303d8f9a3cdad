//! Write-side link maintenance
//!
//! Posted admin-form rows, copies and CSV imports all end up here. Every
//! write replaces the link set of one kind on one source entity and leaves
//! the links of other kinds exactly as they were.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::core::error::LinkError;
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{LinkReconciler, LinkTarget, PostedLink, StoredLink};

/// Merge a new link set for `kind` into the complete link list of a source
///
/// Links of other kinds keep their order. Links of `kind` are replaced by
/// `posted`, appended after them; a duplicated posted id keeps its first
/// place and takes the qty and position of its last occurrence.
pub fn reconcile(existing: &[StoredLink], kind: LinkKind, posted: &[LinkTarget]) -> Vec<StoredLink> {
    let mut merged: Vec<StoredLink> = existing
        .iter()
        .filter(|link| link.kind != kind)
        .cloned()
        .collect();

    let mut slot_by_id: HashMap<EntityId, usize> = HashMap::new();
    for target in posted {
        match slot_by_id.get(&target.linked_id) {
            Some(&slot) => merged[slot].target = target.clone(),
            None => {
                slot_by_id.insert(target.linked_id, merged.len());
                merged.push(StoredLink {
                    kind,
                    target: target.clone(),
                });
            }
        }
    }

    merged
}

/// What a write changed for one `(source, kind)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub added: Vec<EntityId>,
    pub retained: Vec<EntityId>,
    pub removed: Vec<EntityId>,
    /// Rows skipped as invalid (non-positive id, missing target on copy)
    pub skipped: usize,
}

impl WriteReport {
    fn diff(before: &[StoredLink], after: &[StoredLink], kind: LinkKind) -> Self {
        let ids_of = |links: &[StoredLink]| -> Vec<EntityId> {
            links
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| l.target.linked_id)
                .collect()
        };
        let old_ids = ids_of(before);
        let new_ids = ids_of(after);
        let old_set: BTreeSet<_> = old_ids.iter().copied().collect();
        let new_set: BTreeSet<_> = new_ids.iter().copied().collect();

        Self {
            added: new_ids.iter().filter(|id| !old_set.contains(id)).copied().collect(),
            retained: new_ids.iter().filter(|id| old_set.contains(id)).copied().collect(),
            removed: old_ids.iter().filter(|id| !new_set.contains(id)).copied().collect(),
            skipped: 0,
        }
    }
}

/// Applies link writes through a `LinkReconciler`
pub struct LinkWriter<'a, R> {
    store: &'a mut R,
}

impl<'a, R: LinkReconciler> LinkWriter<'a, R> {
    pub fn new(store: &'a mut R) -> Self {
        Self { store }
    }

    /// Apply the rows posted by the admin form for one link kind
    ///
    /// Non-positive ids are skipped. A posted id without an entity rejects
    /// the whole write. Absent qty is stored as `0.0`, absent position as `0`.
    pub fn apply_posted(
        &mut self,
        source: EntityId,
        kind: LinkKind,
        posted: &[PostedLink],
    ) -> Result<WriteReport, LinkError> {
        self.require_source(source)?;

        let mut skipped = 0;
        let mut targets = Vec::with_capacity(posted.len());
        for row in posted {
            let Some(linked_id) = EntityId::new(row.id) else {
                warn!(source = %source, kind = %kind, id = row.id, "skipping posted link with invalid id");
                skipped += 1;
                continue;
            };
            if !self.store.entity_exists(linked_id)? {
                return Err(LinkError::UnknownEntity { id: linked_id, kind });
            }
            targets.push(LinkTarget::new(
                linked_id,
                Some(row.qty.unwrap_or(0.0)),
                row.position.unwrap_or(0),
            ));
        }

        let mut report = self.set_links(source, kind, &targets)?;
        report.skipped = skipped;
        Ok(report)
    }

    /// Replace the `kind` links of `source` with already validated targets
    pub fn set_links(
        &mut self,
        source: EntityId,
        kind: LinkKind,
        targets: &[LinkTarget],
    ) -> Result<WriteReport, LinkError> {
        let before = self.store.stored_links(source)?;
        let after = reconcile(&before, kind, targets);
        let report = WriteReport::diff(&before, &after, kind);

        self.store.replace_links(source, &after)?;
        debug!(
            source = %source,
            kind = %kind,
            added = report.added.len(),
            retained = report.retained.len(),
            removed = report.removed.len(),
            "links reconciled"
        );
        Ok(report)
    }

    /// Copy the `kind` links of `from` onto `to`
    ///
    /// Qty and position are kept. Targets that no longer exist are skipped.
    /// Links `to` already has are kept; a copied row replaces one with the
    /// same target.
    pub fn copy_links(
        &mut self,
        from: EntityId,
        to: EntityId,
        kind: LinkKind,
    ) -> Result<WriteReport, LinkError> {
        self.require_source(from)?;
        self.require_source(to)?;

        let mut targets: Vec<LinkTarget> = self
            .store
            .stored_links(to)?
            .into_iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.target)
            .collect();

        let mut skipped = 0;
        for link in self.store.stored_links(from)? {
            if link.kind != kind {
                continue;
            }
            if !self.store.entity_exists(link.target.linked_id)? {
                warn!(from = %from, linked = %link.target.linked_id, "skipping copy of link to missing entity");
                skipped += 1;
                continue;
            }
            targets.push(link.target);
        }

        let mut report = self.set_links(to, kind, &targets)?;
        report.skipped = skipped;
        Ok(report)
    }

    fn require_source(&self, source: EntityId) -> Result<(), LinkError> {
        if self.store.entity_exists(source)? {
            Ok(())
        } else {
            Err(LinkError::SourceNotFound(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::CatalogEntity;
    use crate::core::memory::MemoryCatalog;

    fn id(raw: i64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn target(raw: i64) -> LinkTarget {
        LinkTarget::new(id(raw), Some(1.0), 0)
    }

    fn stored(kind: LinkKind, raw: i64) -> StoredLink {
        StoredLink {
            kind,
            target: target(raw),
        }
    }

    fn catalog(ids: &[i64]) -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        for &raw in ids {
            catalog.insert_entity(CatalogEntity::new(id(raw), format!("SKU-{}", raw)));
        }
        catalog
    }

    fn kind_ids(catalog: &MemoryCatalog, source: i64, kind: LinkKind) -> Vec<i64> {
        catalog
            .stored_links(id(source))
            .unwrap()
            .into_iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.target.linked_id.get())
            .collect()
    }

    #[test]
    fn test_reconcile_replaces_only_the_given_kind() {
        let existing = vec![
            stored(LinkKind::PARTLISTS, 2),
            stored(LinkKind::RELATED, 7),
            stored(LinkKind::PARTLISTS, 5),
        ];
        let merged = reconcile(&existing, LinkKind::PARTLISTS, &[target(2), target(9)]);

        assert_eq!(
            merged,
            vec![
                stored(LinkKind::RELATED, 7),
                stored(LinkKind::PARTLISTS, 2),
                stored(LinkKind::PARTLISTS, 9),
            ]
        );
    }

    #[test]
    fn test_reconcile_duplicate_posted_id_last_wins() {
        let posted = vec![
            LinkTarget::new(id(2), Some(1.0), 1),
            target(3),
            LinkTarget::new(id(2), Some(4.0), 8),
        ];
        let merged = reconcile(&[], LinkKind::PARTLISTS, &posted);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].target, LinkTarget::new(id(2), Some(4.0), 8));
    }

    #[test]
    fn test_apply_posted_reconciles_against_persisted_set() {
        let mut catalog = catalog(&[1, 2, 5, 7, 9]);
        {
            let mut writer = LinkWriter::new(&mut catalog);
            writer
                .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(2), PostedLink::new(5)])
                .unwrap();
            writer
                .apply_posted(id(1), LinkKind::RELATED, &[PostedLink::new(7)])
                .unwrap();
        }

        let report = LinkWriter::new(&mut catalog)
            .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(2), PostedLink::new(9)])
            .unwrap();

        assert_eq!(report.added, vec![id(9)]);
        assert_eq!(report.retained, vec![id(2)]);
        assert_eq!(report.removed, vec![id(5)]);
        assert_eq!(kind_ids(&catalog, 1, LinkKind::PARTLISTS), vec![2, 9]);
        assert_eq!(kind_ids(&catalog, 1, LinkKind::RELATED), vec![7]);
    }

    #[test]
    fn test_apply_posted_defaults_qty_and_position() {
        let mut catalog = catalog(&[1, 2]);
        LinkWriter::new(&mut catalog)
            .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(2)])
            .unwrap();

        let links = catalog.stored_links(id(1)).unwrap();
        assert_eq!(links[0].target, LinkTarget::new(id(2), Some(0.0), 0));
    }

    #[test]
    fn test_apply_posted_skips_invalid_rows() {
        let mut catalog = catalog(&[1, 2]);
        let report = LinkWriter::new(&mut catalog)
            .apply_posted(
                id(1),
                LinkKind::PARTLISTS,
                &[PostedLink::new(0), PostedLink::new(2), PostedLink::new(-4)],
            )
            .unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(kind_ids(&catalog, 1, LinkKind::PARTLISTS), vec![2]);
    }

    #[test]
    fn test_apply_posted_rejects_unknown_source() {
        let mut catalog = catalog(&[2]);
        let err = LinkWriter::new(&mut catalog)
            .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(2)])
            .unwrap_err();
        assert!(matches!(err, LinkError::SourceNotFound(_)));
    }

    #[test]
    fn test_apply_posted_rejects_unknown_target_without_writing() {
        let mut catalog = catalog(&[1, 2]);
        LinkWriter::new(&mut catalog)
            .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(2)])
            .unwrap();

        let err = LinkWriter::new(&mut catalog)
            .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(42)])
            .unwrap_err();

        assert!(matches!(err, LinkError::UnknownEntity { .. }));
        assert_eq!(kind_ids(&catalog, 1, LinkKind::PARTLISTS), vec![2]);
    }

    #[test]
    fn test_empty_post_removes_all_links_of_kind() {
        let mut catalog = catalog(&[1, 2, 3]);
        let mut writer = LinkWriter::new(&mut catalog);
        writer
            .apply_posted(id(1), LinkKind::PARTLISTS, &[PostedLink::new(2)])
            .unwrap();
        writer
            .apply_posted(id(1), LinkKind::UP_SELL, &[PostedLink::new(3)])
            .unwrap();
        let report = writer.apply_posted(id(1), LinkKind::PARTLISTS, &[]).unwrap();

        assert_eq!(report.removed, vec![id(2)]);
        assert!(kind_ids(&catalog, 1, LinkKind::PARTLISTS).is_empty());
        assert_eq!(kind_ids(&catalog, 1, LinkKind::UP_SELL), vec![3]);
    }

    #[test]
    fn test_copy_links_keeps_metadata_and_skips_missing() {
        let mut catalog = catalog(&[1, 2, 3, 4, 10]);
        LinkWriter::new(&mut catalog)
            .apply_posted(
                id(1),
                LinkKind::PARTLISTS,
                &[
                    PostedLink::new(2).with_qty(3.0).with_position(1),
                    PostedLink::new(3).with_qty(1.5).with_position(2),
                ],
            )
            .unwrap();
        catalog.remove_entity(id(3));

        LinkWriter::new(&mut catalog)
            .apply_posted(id(10), LinkKind::PARTLISTS, &[PostedLink::new(4)])
            .unwrap();

        let report = LinkWriter::new(&mut catalog)
            .copy_links(id(1), id(10), LinkKind::PARTLISTS)
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.added, vec![id(2)]);
        let links = catalog.stored_links(id(10)).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].target, LinkTarget::new(id(2), Some(3.0), 1));
    }

    #[test]
    fn test_copy_links_requires_both_entities() {
        let mut catalog = catalog(&[1]);
        let err = LinkWriter::new(&mut catalog)
            .copy_links(id(1), id(99), LinkKind::PARTLISTS)
            .unwrap_err();
        assert!(matches!(err, LinkError::SourceNotFound(e) if e == id(99)));
    }
}
