//! Error types for link resolution and link writes
//!
//! Read paths swallow these (logged, degraded to an empty result). Write paths
//! surface them to the caller as rejected operations.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::{EntityId, LinkKind};

/// Failures of the external entity/link store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The subject entity does not exist
    #[error("entity {id} not found")]
    #[diagnostic(code(partlink::store::not_found))]
    NotFound { id: EntityId },

    /// Transient failure of the record source or bulk loader
    #[error("store unavailable: {0}")]
    #[diagnostic(
        code(partlink::store::unavailable),
        help("check that the catalog database exists and is readable (run 'partlink init')")
    )]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    #[diagnostic(code(partlink::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),
}

/// Failures of write/import paths
#[derive(Debug, Error, Diagnostic)]
pub enum LinkError {
    #[error("cannot link from entity {0}: it does not exist")]
    #[diagnostic(code(partlink::link::source_not_found))]
    SourceNotFound(EntityId),

    #[error("cannot add {kind} link to entity {id}: it does not exist")]
    #[diagnostic(
        code(partlink::link::unknown_entity),
        help("create the entity first with 'partlink entity add'")
    )]
    UnknownEntity { id: EntityId, kind: LinkKind },

    #[error("no entity with sku '{0}'")]
    #[diagnostic(code(partlink::link::unknown_sku))]
    UnknownSku(String),

    #[error("invalid link row '{row}': {reason}")]
    #[diagnostic(code(partlink::link::invalid_row))]
    InvalidLinkRow { row: String, reason: String },

    #[error("CSV error: {0}")]
    #[diagnostic(code(partlink::link::csv))]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(partlink::link::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl LinkError {
    pub fn invalid_row(row: impl Into<String>, reason: impl Into<String>) -> Self {
        LinkError::InvalidLinkRow {
            row: row.into(),
            reason: reason.into(),
        }
    }
}
