//! Fast hash collections used on hot paths (assignment diffing, closures).

pub use rustc_hash::{FxHashMap, FxHashSet};
