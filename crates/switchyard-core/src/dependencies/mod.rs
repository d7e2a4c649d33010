//! Feature dependency index: "feature X requires features [Y, Z]".
//!
//! Built once from static configuration into an immutable value. Readers
//! share it behind an `Arc`; reloading builds a fresh index.

pub mod index;
pub mod loader;

pub use index::DependencyIndex;
pub use loader::{parse_dependencies, DependencyFormat};
