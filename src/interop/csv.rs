//! Bulk CSV import and export of links
//!
//! Each entity row carries all of its links of one kind in a single column
//! named after the kind (`_partlists_`). The field holds `sku|qty|position`
//! triples joined by `,`:
//!
//! ```text
//! sku,_partlists_
//! FRAME-1,"BOLT-M8|4|0,NUT-M8|4|1"
//! BOLT-M8,
//! ```
//!
//! An empty or missing column means "no links of this kind" on export and
//! "leave the links alone" on import.

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::{debug, warn};

use crate::core::error::LinkError;
use crate::core::identity::{EntityId, LinkKind};
use crate::core::links::{LinkReconciler, LinkTarget};
use crate::core::reconcile::LinkWriter;

/// Separates the triples of one field
pub const LINK_SEPARATOR: char = ',';
/// Separates sku, qty and position inside a triple
pub const FIELD_SEPARATOR: char = '|';

/// One link as written in a CSV field
#[derive(Debug, Clone, PartialEq)]
pub struct CsvLink {
    pub sku: String,
    pub qty: Option<f64>,
    pub position: Option<i64>,
}

impl CsvLink {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
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

/// Encode links into one field; `None` when there is nothing to write
///
/// Missing qty is written as `1`, missing position as `0`.
pub fn encode_links(links: &[CsvLink]) -> Option<String> {
    if links.is_empty() {
        return None;
    }

    let encoded: Vec<String> = links
        .iter()
        .map(|link| {
            format!(
                "{}{sep}{}{sep}{}",
                link.sku,
                link.qty.unwrap_or(1.0),
                link.position.unwrap_or(0),
                sep = FIELD_SEPARATOR
            )
        })
        .collect();
    Some(encoded.join(&LINK_SEPARATOR.to_string()))
}

/// Decode one field; every triple yields a link or an `InvalidLinkRow`
pub fn decode_links(field: &str) -> Vec<Result<CsvLink, LinkError>> {
    field
        .split(LINK_SEPARATOR)
        .map(str::trim)
        .filter(|triple| !triple.is_empty())
        .map(decode_triple)
        .collect()
}

fn decode_triple(triple: &str) -> Result<CsvLink, LinkError> {
    let parts: Vec<&str> = triple.split(FIELD_SEPARATOR).map(str::trim).collect();
    if parts.len() > 3 {
        return Err(LinkError::invalid_row(triple, "expected sku|qty|position"));
    }

    let sku = parts[0];
    if sku.is_empty() {
        return Err(LinkError::invalid_row(triple, "empty sku"));
    }

    let qty = match parts.get(1).filter(|q| !q.is_empty()) {
        Some(q) => Some(
            q.parse::<f64>()
                .map_err(|_| LinkError::invalid_row(triple, format!("qty '{}' is not a number", q)))?,
        ),
        None => None,
    };
    let position = match parts.get(2).filter(|p| !p.is_empty()) {
        Some(p) => Some(
            p.parse::<i64>()
                .map_err(|_| LinkError::invalid_row(triple, format!("position '{}' is not an integer", p)))?,
        ),
        None => None,
    };

    Ok(CsvLink {
        sku: sku.to_string(),
        qty,
        position,
    })
}

/// Export statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub rows: usize,
    pub links: usize,
    /// Links whose target entity no longer exists
    pub dangling: usize,
}

/// Write one row per entity with its `kind` links
pub fn export_rows<R, W>(store: &R, kind: LinkKind, writer: W) -> Result<ExportStats, LinkError>
where
    R: LinkReconciler,
    W: Write,
{
    let catalog = store.catalog_skus()?;
    let sku_by_id: HashMap<EntityId, &str> = catalog.iter().map(|(id, sku)| (*id, sku.as_str())).collect();

    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(["sku", kind.csv_column().as_str()])?;

    let mut stats = ExportStats::default();
    for (id, sku) in &catalog {
        let mut links = Vec::new();
        for stored in store.stored_links(*id)?.into_iter().filter(|l| l.kind == kind) {
            let Some(linked_sku) = sku_by_id.get(&stored.target.linked_id) else {
                debug!(source = %id, linked = %stored.target.linked_id, "not exporting link to missing entity");
                stats.dangling += 1;
                continue;
            };
            links.push(CsvLink {
                sku: linked_sku.to_string(),
                qty: stored.target.qty,
                position: Some(stored.target.position),
            });
        }

        stats.rows += 1;
        stats.links += links.len();
        let field = encode_links(&links).unwrap_or_default();
        wtr.write_record([sku.as_str(), field.as_str()])?;
    }

    wtr.flush()?;
    Ok(stats)
}

/// Import statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub rows_processed: usize,
    /// Entities whose links of the kind were replaced
    pub sources_updated: usize,
    pub links_written: usize,
    /// Rows with an empty or missing link column, or no valid links in it
    pub untouched: usize,
    /// Rows whose own sku is not in the catalog
    pub unknown_sources: usize,
    /// Linked skus not in the catalog
    pub unknown_skus: usize,
    /// Malformed rows and triples
    pub invalid: usize,
}

/// Read rows written by `export_rows` (or by hand) and replace links
///
/// Bad rows and unresolvable skus are skipped and counted; the rest of the
/// file still applies. With `dry_run` nothing is written.
pub fn import_rows<R, Rd>(
    store: &mut R,
    kind: LinkKind,
    reader: Rd,
    dry_run: bool,
) -> Result<ImportStats, LinkError>
where
    R: LinkReconciler,
    Rd: Read,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let sku_col = column_index(&headers, "sku")
        .ok_or_else(|| LinkError::invalid_row("header", "missing 'sku' column"))?;
    let link_col = column_index(&headers, &kind.csv_column());

    let mut stats = ImportStats::default();
    for (row_idx, result) in rdr.records().enumerate() {
        let row_num = row_idx + 2; // +2 for 1-indexed and header row
        stats.rows_processed += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = row_num, error = %e, "skipping unparsable CSV row");
                stats.invalid += 1;
                continue;
            }
        };

        let field = link_col.and_then(|col| record.get(col)).unwrap_or_default();
        if field.is_empty() {
            stats.untouched += 1;
            continue;
        }

        let sku = record.get(sku_col).unwrap_or_default();
        if sku.is_empty() {
            warn!(row = row_num, "skipping row without sku");
            stats.invalid += 1;
            continue;
        }
        let Some(source) = store.resolve_sku(sku)? else {
            warn!(row = row_num, sku, "skipping row for unknown entity");
            stats.unknown_sources += 1;
            continue;
        };

        let mut targets = Vec::new();
        for decoded in decode_links(field) {
            let link = match decoded {
                Ok(link) => link,
                Err(e) => {
                    warn!(row = row_num, error = %e, "skipping malformed link");
                    stats.invalid += 1;
                    continue;
                }
            };
            match store.resolve_sku(&link.sku)? {
                Some(linked_id) => targets.push(LinkTarget::new(
                    linked_id,
                    link.qty,
                    link.position.unwrap_or(0),
                )),
                None => {
                    warn!(row = row_num, sku = %link.sku, "skipping link to unknown sku");
                    stats.unknown_skus += 1;
                }
            }
        }

        // A field with nothing resolvable keeps the existing links
        if targets.is_empty() {
            warn!(row = row_num, sku, "no valid links in row, leaving links untouched");
            stats.untouched += 1;
            continue;
        }

        if !dry_run {
            LinkWriter::new(store).set_links(source, kind, &targets)?;
        }
        stats.sources_updated += 1;
        stats.links_written += targets.len();
    }

    Ok(stats)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}
