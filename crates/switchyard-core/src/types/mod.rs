//! Core data types shared across the workspace.

pub mod assignment;
pub mod collections;
pub mod feature;
pub mod identifiers;
pub mod query;

pub use assignment::{
    AssignmentBatch, AssignmentKey, AssignmentPlan, BulkWriteStats, FeatureAssignment,
    ToggleDirection,
};
pub use feature::{derive_identifier, Feature, FeatureStatus, FeatureUpdate, NewFeature};
pub use identifiers::{AssignableId, AssignableRef, FeatureId};
pub use query::{FeatureQuery, ScopeFilter};
