pub mod build;
pub mod diff;
pub mod inspect;
pub mod validate;

pub use build::*;
pub use diff::*;
pub use inspect::*;
pub use validate::*;
