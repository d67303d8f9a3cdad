//! Display amount selection
//!
//! Prices are computed by the external catalog; this module only picks which
//! of the supplied amounts to show for the configured tax display mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::CatalogEntity;

/// How the storefront displays prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaxDisplayMode {
    #[default]
    ExcludingTax,
    IncludingTax,
    Both,
}

impl TaxDisplayMode {
    /// Whether the tax-included amount is the one to show
    pub fn uses_tax_included(self) -> bool {
        matches!(self, TaxDisplayMode::IncludingTax | TaxDisplayMode::Both)
    }
}

impl fmt::Display for TaxDisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxDisplayMode::ExcludingTax => write!(f, "excluding_tax"),
            TaxDisplayMode::IncludingTax => write!(f, "including_tax"),
            TaxDisplayMode::Both => write!(f, "both"),
        }
    }
}

impl FromStr for TaxDisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "excluding_tax" | "excl" | "1" => Ok(TaxDisplayMode::ExcludingTax),
            "including_tax" | "incl" | "2" => Ok(TaxDisplayMode::IncludingTax),
            "both" | "3" => Ok(TaxDisplayMode::Both),
            _ => Err(format!(
                "Unknown tax display mode: {} (valid: excluding_tax, including_tax, both)",
                s
            )),
        }
    }
}

/// Chooses the amount to display for an entity
pub trait AmountSelector<E> {
    fn amount_for_display(&self, entity: &E, mode: TaxDisplayMode) -> f64;
}

/// Selector for entities produced by the bundled stores
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogAmountSelector;

impl AmountSelector<CatalogEntity> for CatalogAmountSelector {
    fn amount_for_display(&self, entity: &CatalogEntity, mode: TaxDisplayMode) -> f64 {
        let amount = if mode.uses_tax_included() {
            entity.price_incl_tax.or(entity.price)
        } else {
            entity.price
        };
        amount.unwrap_or(0.0)
    }
}

/// Line total for a display row
pub fn line_total(qty: f64, unit_amount: f64) -> f64 {
    qty * unit_amount
}
