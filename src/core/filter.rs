//! Filter policy - which loaded entities make it into a resolution
//!
//! A `FilterPolicy` is an immutable value. It decides both which attributes
//! the loader must populate and which loaded entities survive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::entity::{Entity, Status};

/// Fields a bulk loader can be asked to populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Name,
    Sku,
    Image,
    SmallImage,
    Thumbnail,
    Price,
    SpecialPrice,
    PriceInclTax,
    TaxClassId,
    Status,
    Visibility,
    TypeId,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Sku => "sku",
            Attribute::Image => "image",
            Attribute::SmallImage => "small_image",
            Attribute::Thumbnail => "thumbnail",
            Attribute::Price => "price",
            Attribute::SpecialPrice => "special_price",
            Attribute::PriceInclTax => "price_incl_tax",
            Attribute::TaxClassId => "tax_class_id",
            Attribute::Status => "status",
            Attribute::Visibility => "visibility",
            Attribute::TypeId => "type_id",
        }
    }

    pub fn all() -> &'static [Attribute] {
        &[
            Attribute::Name,
            Attribute::Sku,
            Attribute::Image,
            Attribute::SmallImage,
            Attribute::Thumbnail,
            Attribute::Price,
            Attribute::SpecialPrice,
            Attribute::PriceInclTax,
            Attribute::TaxClassId,
            Attribute::Status,
            Attribute::Visibility,
            Attribute::TypeId,
        ]
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Attribute::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| format!("Unknown attribute: {}", s))
    }
}

/// Ordered set of attributes to select
pub type AttributeSet = BTreeSet<Attribute>;

/// Attributes selected when disabled entities are shown
pub fn minimal_attributes() -> AttributeSet {
    [
        Attribute::Name,
        Attribute::Sku,
        Attribute::Image,
        Attribute::Thumbnail,
        Attribute::Price,
        Attribute::SpecialPrice,
        Attribute::Status,
        Attribute::Visibility,
    ]
    .into_iter()
    .collect()
}

/// Attributes selected for the standard list view
pub fn list_view_attributes() -> AttributeSet {
    let mut set = minimal_attributes();
    set.extend([
        Attribute::SmallImage,
        Attribute::TaxClassId,
        Attribute::TypeId,
        Attribute::PriceInclTax,
    ]);
    set
}

/// Inclusion rules evaluated against loaded entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    /// Bypass status and saleability filtering entirely
    pub include_disabled: bool,

    /// Bypass the "currently purchasable" filter (status still applies)
    pub include_all_products: bool,

    /// Bypass the catalog-visibility filter
    pub include_invisible: bool,

    /// Explicit attribute selection; `None` uses the default for the policy
    pub attributes_to_select: Option<AttributeSet>,
}

impl FilterPolicy {
    /// Storefront defaults: enabled, saleable, visible in catalog
    pub fn storefront() -> Self {
        Self::default()
    }

    /// Everything linked, regardless of status, saleability or visibility
    pub fn admin() -> Self {
        Self {
            include_disabled: true,
            include_all_products: true,
            include_invisible: true,
            attributes_to_select: None,
        }
    }

    pub fn with_disabled(mut self, include: bool) -> Self {
        self.include_disabled = include;
        self
    }

    pub fn with_all_products(mut self, include: bool) -> Self {
        self.include_all_products = include;
        self
    }

    pub fn with_invisible(mut self, include: bool) -> Self {
        self.include_invisible = include;
        self
    }

    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes_to_select = Some(attributes);
        self
    }

    /// Keep the policy's selection and add the fields a caller reads
    pub fn with_required_attributes(self, required: impl IntoIterator<Item = Attribute>) -> Self {
        let mut attributes = self.attributes();
        attributes.extend(required);
        self.with_attributes(attributes)
    }

    /// The attribute set the loader must populate
    pub fn attributes(&self) -> AttributeSet {
        match &self.attributes_to_select {
            Some(explicit) => explicit.clone(),
            None if self.include_disabled => minimal_attributes(),
            None => list_view_attributes(),
        }
    }

    /// Whether a loaded entity passes every applicable predicate
    pub fn includes<E: Entity>(&self, entity: &E) -> bool {
        let visible = self.include_invisible || entity.visibility().is_visible_in_catalog();
        if self.include_disabled {
            return visible;
        }

        entity.status() == Status::Enabled
            && (self.include_all_products || entity.is_saleable())
            && visible
    }
}
