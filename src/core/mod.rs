//! Core module - link resolution and the collaborators around it

pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod identity;
pub mod links;
pub mod memory;
pub mod pricing;
pub mod project;
pub mod qty;
pub mod reconcile;
pub mod resolve;
pub mod store;

pub use config::Config;
pub use entity::{CatalogEntity, Entity, Status, Visibility};
pub use error::{LinkError, StoreError};
pub use filter::{Attribute, AttributeSet, FilterPolicy};
pub use identity::{EntityId, IdParseError, LinkKind};
pub use links::{
    BulkEntityLoader, LinkRecord, LinkRecordSource, LinkReconciler, LinkTarget, PostedLink,
    StoredLink,
};
pub use memory::MemoryCatalog;
pub use pricing::{AmountSelector, CatalogAmountSelector, TaxDisplayMode};
pub use project::{Project, ProjectError};
pub use qty::{format_qty, normalize, QtyContext};
pub use reconcile::{reconcile, LinkWriter, WriteReport};
pub use resolve::{Resolution, ResolutionPipeline, ResolutionStats, ResolveMode, ResolvedItem};
pub use store::CatalogStore;
