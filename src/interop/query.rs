//! JSON query boundary
//!
//! Shape served to API consumers: the ordered parts of one entity with a
//! reference to each linked entity. Items are sorted by position, and the
//! quantity is the stored value clamped to zero, with no display default.

use serde::{Deserialize, Serialize};

use crate::core::entity::CatalogEntity;
use crate::core::filter::{Attribute, FilterPolicy};
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{BulkEntityLoader, LinkRecordSource};
use crate::core::qty::QtyContext;
use crate::core::resolve::{Resolution, ResolutionPipeline, ResolveMode};

/// Fields serialised into a `ProductRef`
const REQUIRED_ATTRIBUTES: [Attribute; 2] = [Attribute::Sku, Attribute::TypeId];

/// Reference to a linked entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: EntityId,
    pub sku: String,
    pub type_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryItem {
    pub product: ProductRef,
    pub qty: f64,
    pub position: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub items: Vec<QueryItem>,
}

impl QueryResponse {
    /// Answer a query for the `kind` links of `source`
    pub fn build<S, L>(
        pipeline: &ResolutionPipeline<'_, S, L>,
        source: Option<EntityId>,
        kind: LinkKind,
        policy: &FilterPolicy,
    ) -> Self
    where
        S: LinkRecordSource,
        L: BulkEntityLoader<Entity = CatalogEntity>,
    {
        let policy = policy.clone().with_required_attributes(REQUIRED_ATTRIBUTES);
        let resolution = pipeline.resolve_with_qty(
            source,
            kind,
            &policy,
            ResolveMode::PositionSorted,
            QtyContext::RawMap,
        );
        Self::from_resolution(&resolution)
    }

    pub fn from_resolution(resolution: &Resolution<CatalogEntity>) -> Self {
        let items = resolution
            .items
            .iter()
            .map(|item| QueryItem {
                product: ProductRef {
                    id: item.entity.id,
                    sku: item.entity.sku.clone(),
                    type_id: item.entity.type_id.clone().unwrap_or_default(),
                },
                qty: item.qty,
                position: item.position,
            })
            .collect();
        Self { items }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::links::LinkRecord;
    use crate::core::memory::MemoryCatalog;

    fn id(raw: i64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn test_query_sorted_by_position_with_raw_qty() {
        let mut catalog = MemoryCatalog::new();
        for raw in [1, 2, 5, 8] {
            catalog.insert_entity(CatalogEntity::new(id(raw), format!("SKU-{}", raw)));
        }
        catalog.push_record(LinkKind::PARTLISTS, LinkRecord::new(id(1), 5).with_qty(1.0).with_position(2));
        catalog.push_record(LinkKind::PARTLISTS, LinkRecord::new(id(1), 2).with_position(1));
        catalog.push_record(LinkKind::PARTLISTS, LinkRecord::new(id(1), 8).with_qty(-2.0).with_position(0));

        let pipeline = ResolutionPipeline::new(&catalog, &catalog);
        let response = QueryResponse::build(&pipeline, Some(id(1)), LinkKind::PARTLISTS, &FilterPolicy::admin());

        let skus: Vec<&str> = response.items.iter().map(|i| i.product.sku.as_str()).collect();
        assert_eq!(skus, vec!["SKU-8", "SKU-2", "SKU-5"]);
        let qtys: Vec<f64> = response.items.iter().map(|i| i.qty).collect();
        assert_eq!(qtys, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_json_shape() {
        let response = QueryResponse {
            items: vec![QueryItem {
                product: ProductRef {
                    id: id(2),
                    sku: "BOLT".to_string(),
                    type_id: "simple".to_string(),
                },
                qty: 2.5,
                position: 1,
            }],
        };
        let value: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["items"][0]["product"]["id"], 2);
        assert_eq!(value["items"][0]["product"]["type_id"], "simple");
        assert_eq!(value["items"][0]["qty"], 2.5);
        assert_eq!(value["items"][0]["position"], 1);
    }

    #[test]
    fn test_no_subject_is_empty_response() {
        let catalog = MemoryCatalog::new();
        let pipeline = ResolutionPipeline::new(&catalog, &catalog);
        let response = QueryResponse::build(&pipeline, None, LinkKind::PARTLISTS, &FilterPolicy::admin());
        assert!(response.items.is_empty());
        assert_eq!(response.to_json_pretty().unwrap(), "{\n  \"items\": []\n}");
    }
}
