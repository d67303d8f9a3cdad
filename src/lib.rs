//! partlink: linked-entity resolution for catalog parts lists
//!
//! Resolves the links of a catalog entity (its parts, related or up-sell
//! entities) into an ordered, filtered list carrying quantity and position,
//! loading every target in a single bulk call.

pub mod cli;
pub mod core;
pub mod interop;
