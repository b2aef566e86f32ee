//! dumpscope-core
//!
//! Core library for turning an IL2CPP reflection dump into a versioned schema
//! and checking what that schema says against other builds and extracted data.
//!
//! - [`dump`] finds type declarations and their field/enum lines
//! - [`schema`] flattens inheritance, classifies fields and builds the snapshot
//! - [`diff`] grades changes between two snapshots
//! - [`validate`] checks extracted instance files against a snapshot
//!
//! [`config`] holds the type-name sets and thresholds all of the above read.

pub mod config;
pub mod diff;
pub mod dump;
pub mod model;
pub mod schema;
pub mod validate;

/// Crate version baked in at build time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
