//! # switchyard-core
//!
//! Foundation crate for the Switchyard feature-toggle engine.
//! Defines the feature and assignment types, errors, config, the dependency
//! index, the storage traits and the assignable registry.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod dependencies;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::SwitchyardConfig;
pub use dependencies::DependencyIndex;
pub use errors::error_code::ErrorCode;
pub use errors::{ConfigError, StorageError, ToggleError, ToggleResult};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::identifiers::{AssignableId, FeatureId};
