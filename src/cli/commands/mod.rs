//! Command implementations

pub mod completions;
pub mod config;
pub mod entity;
pub mod export;
pub mod import;
pub mod init;
pub mod link;
pub mod qty_map;
pub mod query;
pub mod show;
