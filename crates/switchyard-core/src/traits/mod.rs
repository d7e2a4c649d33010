//! Storage and population traits.
//!
//! These traits define the contract between the toggle engine and the
//! underlying store. The SQLite implementation lives in
//! `switchyard-storage`. All traits are object-safe, `Send + Sync`, and have
//! blanket `Arc<T>` impls.

pub mod assignable;
pub mod assignment_store;
pub mod feature_store;

pub use assignable::{AssignableRegistry, AssignableSource};
pub use assignment_store::{AssignmentActivity, IAssignmentStore, ACTIVITY_WINDOWS_DAYS};
pub use feature_store::IFeatureStore;
