//! Entity trait - the view the resolution pipeline has of a loaded entity

use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;

/// Common trait for entities that can be the target of a link
///
/// The pipeline never looks past these accessors; everything else on the
/// entity is carried through untouched.
pub trait Entity {
    /// Get the entity's id
    fn id(&self) -> EntityId;

    /// Enabled/disabled status
    fn status(&self) -> Status;

    /// Catalog visibility
    fn visibility(&self) -> Visibility;

    /// Whether the entity is currently purchasable
    fn is_saleable(&self) -> bool;
}

/// Entity status as stored in the catalog (`1` enabled, `2` disabled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Enabled,
    Disabled,
}

impl Status {
    pub fn code(self) -> i64 {
        match self {
            Status::Enabled => 1,
            Status::Disabled => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Status::Enabled
        } else {
            Status::Disabled
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Enabled => write!(f, "enabled"),
            Status::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" | "1" => Ok(Status::Enabled),
            "disabled" | "2" => Ok(Status::Disabled),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Catalog visibility as stored in the catalog (`1`..`4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    NotVisible,
    InCatalog,
    InSearch,
    #[default]
    Both,
}

impl Visibility {
    pub fn code(self) -> i64 {
        match self {
            Visibility::NotVisible => 1,
            Visibility::InCatalog => 2,
            Visibility::InSearch => 3,
            Visibility::Both => 4,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Visibility::InCatalog,
            3 => Visibility::InSearch,
            4 => Visibility::Both,
            _ => Visibility::NotVisible,
        }
    }

    /// Visibilities that make an entity discoverable on listing pages
    pub fn visible_in_catalog() -> &'static [Visibility] {
        &[Visibility::InCatalog, Visibility::Both]
    }

    pub fn is_visible_in_catalog(self) -> bool {
        Self::visible_in_catalog().contains(&self)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::NotVisible => write!(f, "not_visible"),
            Visibility::InCatalog => write!(f, "catalog"),
            Visibility::InSearch => write!(f, "search"),
            Visibility::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not_visible" | "none" | "1" => Ok(Visibility::NotVisible),
            "catalog" | "in_catalog" | "2" => Ok(Visibility::InCatalog),
            "search" | "in_search" | "3" => Ok(Visibility::InSearch),
            "both" | "4" => Ok(Visibility::Both),
            _ => Err(format!("Unknown visibility: {}", s)),
        }
    }
}

/// A catalog entity as produced by the bundled stores
///
/// Optional fields are only populated when their attribute was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub id: EntityId,

    pub sku: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Product type code (simple, configurable, bundle, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub saleable: bool,

    /// Base (tax-excluded) final price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Tax-included final price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_incl_tax: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CatalogEntity {
    /// A minimal enabled, visible, saleable entity
    pub fn new(id: EntityId, sku: impl Into<String>) -> Self {
        Self {
            id,
            sku: sku.into(),
            name: None,
            type_id: Some("simple".to_string()),
            status: Status::Enabled,
            visibility: Visibility::Both,
            saleable: true,
            price: None,
            price_incl_tax: None,
            special_price: None,
            image: None,
            thumbnail: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_saleable(mut self, saleable: bool) -> Self {
        self.saleable = saleable;
        self
    }

    pub fn with_prices(mut self, base: f64, incl_tax: Option<f64>) -> Self {
        self.price = Some(base);
        self.price_incl_tax = incl_tax;
        self
    }

    /// Display name, falling back to the sku
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.sku)
    }
}

impl Entity for CatalogEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn status(&self) -> Status {
        self.status
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn is_saleable(&self) -> bool {
        self.saleable
    }
}
