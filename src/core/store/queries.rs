//! Entity queries
//!
//! Columns the filter policy needs are always read. The optional columns are
//! read only when their attribute is selected; the rest stay `None`.

use rusqlite::{params, OptionalExtension, Row};

use super::CatalogStore;
use crate::core::entity::{CatalogEntity, Status, Visibility};
use crate::core::error::StoreError;
use crate::core::filter::{Attribute, AttributeSet};
use crate::core::identity::EntityId;

/// Always selected
const BASE_COLUMNS: &[&str] = &["id", "sku", "status", "visibility", "saleable"];

/// Every optional column
const OPTIONAL_COLUMNS: &[&str] = &[
    "name",
    "type_id",
    "price",
    "price_incl_tax",
    "special_price",
    "image",
    "thumbnail",
];

/// Column backing an attribute, if the catalog stores it
fn column_for(attribute: Attribute) -> Option<&'static str> {
    match attribute {
        Attribute::Name => Some("name"),
        Attribute::TypeId => Some("type_id"),
        Attribute::Price => Some("price"),
        Attribute::PriceInclTax => Some("price_incl_tax"),
        Attribute::SpecialPrice => Some("special_price"),
        Attribute::Image => Some("image"),
        Attribute::Thumbnail => Some("thumbnail"),
        Attribute::Sku
        | Attribute::Status
        | Attribute::Visibility
        | Attribute::SmallImage
        | Attribute::TaxClassId => None,
    }
}

/// Columns to select; `None` selects everything
pub(super) fn select_columns(attributes: Option<&AttributeSet>) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    match attributes {
        None => columns.extend_from_slice(OPTIONAL_COLUMNS),
        Some(set) => {
            for column in set.iter().filter_map(|a| column_for(*a)) {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
    }
    columns
}

/// Map a row selected with `columns` into an entity
pub(super) fn entity_from_row(row: &Row<'_>, columns: &[&str]) -> rusqlite::Result<CatalogEntity> {
    let text = |name: &str| -> rusqlite::Result<Option<String>> {
        if columns.contains(&name) {
            row.get(name)
        } else {
            Ok(None)
        }
    };
    let real = |name: &str| -> rusqlite::Result<Option<f64>> {
        if columns.contains(&name) {
            row.get(name)
        } else {
            Ok(None)
        }
    };

    let raw_id: i64 = row.get("id")?;
    let id = EntityId::new(raw_id).ok_or(rusqlite::Error::IntegralValueOutOfRange(0, raw_id))?;

    Ok(CatalogEntity {
        id,
        sku: row.get("sku")?,
        name: text("name")?,
        type_id: text("type_id")?,
        status: Status::from_code(row.get("status")?),
        visibility: Visibility::from_code(row.get("visibility")?),
        saleable: row.get("saleable")?,
        price: real("price")?,
        price_incl_tax: real("price_incl_tax")?,
        special_price: real("special_price")?,
        image: text("image")?,
        thumbnail: text("thumbnail")?,
    })
}

impl CatalogStore {
    /// Insert an entity, or update every field of an existing one
    ///
    /// Updating keeps the entity's links.
    pub fn upsert_entity(&self, entity: &CatalogEntity) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO entities
                   (id, sku, name, type_id, status, visibility, saleable,
                    price, price_incl_tax, special_price, image, thumbnail)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
               ON CONFLICT(id) DO UPDATE SET
                   sku = excluded.sku,
                   name = excluded.name,
                   type_id = excluded.type_id,
                   status = excluded.status,
                   visibility = excluded.visibility,
                   saleable = excluded.saleable,
                   price = excluded.price,
                   price_incl_tax = excluded.price_incl_tax,
                   special_price = excluded.special_price,
                   image = excluded.image,
                   thumbnail = excluded.thumbnail"#,
            params![
                entity.id.get(),
                entity.sku,
                entity.name,
                entity.type_id,
                entity.status.code(),
                entity.visibility.code(),
                entity.saleable,
                entity.price,
                entity.price_incl_tax,
                entity.special_price,
                entity.image,
                entity.thumbnail,
            ],
        )?;
        Ok(())
    }

    /// Get one entity with every column populated
    pub fn get_entity(&self, id: EntityId) -> Result<Option<CatalogEntity>, StoreError> {
        let columns = select_columns(None);
        let sql = format!("SELECT {} FROM entities WHERE id = ?1", columns.join(", "));
        Ok(self
            .conn
            .query_row(&sql, params![id.get()], |row| entity_from_row(row, &columns))
            .optional()?)
    }

    /// All entities ordered by id
    pub fn list_entities(&self) -> Result<Vec<CatalogEntity>, StoreError> {
        let columns = select_columns(None);
        let sql = format!("SELECT {} FROM entities ORDER BY id", columns.join(", "));
        let mut stmt = self.conn.prepare(&sql)?;
        let entities = stmt
            .query_map([], |row| entity_from_row(row, &columns))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entities)
    }

    /// Delete an entity and its outgoing links
    ///
    /// Links from other entities pointing at it are left in place.
    pub fn delete_entity(&self, id: EntityId) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM entities WHERE id = ?1", params![id.get()])?;
        Ok(deleted > 0)
    }

    /// Next free entity id
    pub fn next_entity_id(&self) -> Result<EntityId, StoreError> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM entities", [], |row| row.get(0))?;
        let next = max.unwrap_or(0).max(0) + 1;
        EntityId::new(next).ok_or_else(|| StoreError::Unavailable("entity id space exhausted".to_string()))
    }
}
