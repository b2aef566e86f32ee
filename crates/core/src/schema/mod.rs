//! Schema construction.
//!
//! [`SchemaBuilder`] indexes the dump, parses enums and structs, flattens every
//! template across its base chain, and only then classifies fields, once all
//! three name sets are known. Embedded classes are discovered last from
//! collection element types.

pub mod builder;
pub mod classify;
pub mod hierarchy;

pub use builder::{build, content_hash, SchemaBuilder};
pub use classify::{classify, collection_element, Classification, KnownTypes};
pub use hierarchy::{ancestor_chain, collect_fields, MAX_CHAIN_DEPTH};
