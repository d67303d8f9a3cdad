//! Adapters at the outer boundaries: CSV bulk transfer and the JSON query shape

pub mod csv;
pub mod query;

pub use self::csv::{decode_links, encode_links, export_rows, import_rows, CsvLink, ExportStats, ImportStats};
pub use self::query::{ProductRef, QueryItem, QueryResponse};
