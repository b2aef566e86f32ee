//! Reading the reflection dump.
//!
//! The dump is a C#-like listing of every compiled type. Only a small subset
//! of its grammar matters here:
//!
//! - declaration headers (`class`, `abstract class`, `struct`, `enum`) with an
//!   optional `: Base`, followed by a brace-delimited body
//! - field lines ending in a `// 0x<offset>` comment
//! - enum constants `const <type> <name> = <integer>;`
//!
//! Everything else (methods, properties, attributes) is skipped. Bodies are cut
//! out with a brace-depth scanner so nested blocks never truncate a type.

pub mod declaration;
pub mod fields;

pub use declaration::{matching_brace, DeclKind, Declaration, DumpIndex};
pub use fields::{parse_enum, parse_fields, RawField};
