//! Adoption analytics over real host tables.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use switchyard_core::config::AssignableConfig;
use switchyard_core::errors::{StorageError, ToggleError};
use switchyard_core::traits::{AssignableRegistry, AssignableSource, IAssignmentStore, IFeatureStore};
use switchyard_core::types::{AssignableId, AssignableRef, FeatureId, NewFeature};
use switchyard_core::{DependencyIndex, SwitchyardConfig};
use switchyard_engine::{BulkFilters, Switchyard};
use switchyard_storage::SwitchyardStorageEngine;

use common::{active, create_table, switchyard_with_users};

#[test]
fn dark_mode_two_of_five() {
    let (_engine, sy) = switchyard_with_users(5);
    active(&sy, "dark_mode");
    for id in [1, 2] {
        sy.assignable(AssignableRef::new("User", id))
            .unwrap()
            .enable("dark_mode")
            .unwrap();
    }

    let records = sy.track("dark_mode").unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.assignable, "User");
    assert_eq!(record.feature, "dark_mode");
    assert_eq!(record.total_count, 5);
    assert_eq!(record.enabled_count, 2);
    assert_eq!(record.disabled_count, 3);
    assert_eq!(record.percentage_enabled, "40.0%");
    assert_eq!(record.percentage_disabled, "60.0%");
    assert_eq!(record.past_7_days, 2);
    assert!(record.first_created.is_some());
    assert!(record.first_created <= record.last_created);
}

#[test]
fn unknown_feature_is_empty_report() {
    let (_engine, sy) = switchyard_with_users(2);
    assert!(sy.track("nope").unwrap().is_empty());
}

#[test]
fn feature_without_assignments_has_no_records() {
    let (_engine, sy) = switchyard_with_users(2);
    active(&sy, "idle");
    assert!(sy.track("idle").unwrap().is_empty());
}

#[test]
fn one_record_per_type_and_unregistered_types_are_skipped() {
    let engine = Arc::new(SwitchyardStorageEngine::open_in_memory().unwrap());
    create_table(&engine, "users", 3);
    create_table(&engine, "accounts", 4);
    let config = SwitchyardConfig {
        assignables: vec![
            AssignableConfig::new("User", "users"),
            AssignableConfig::new("Account", "accounts"),
        ],
        ..SwitchyardConfig::default()
    };
    let sy = Switchyard::from_engine(Arc::clone(&engine), &config).unwrap();
    active(&sy, "exports");

    sy.bulk_enable("Account", ["exports"], &BulkFilters::new()).unwrap();
    sy.assignable(AssignableRef::new("User", 3)).unwrap().enable("exports").unwrap();

    // A row whose type no longer has a registered source.
    let feature = sy.feature("exports").unwrap();
    engine
        .assign(&AssignableRef::new("LegacyOrg", 1), feature.id, Utc::now())
        .unwrap();

    let records = sy.track("exports").unwrap();
    let kinds: Vec<&str> = records.iter().map(|r| r.assignable.as_str()).collect();
    assert_eq!(kinds, ["Account", "User"]);

    assert_eq!(records[0].enabled_count, 4);
    assert_eq!(records[0].percentage_enabled, "100.0%");
    assert_eq!(records[0].percentage_disabled, "0.0%");
    assert_eq!(records[1].enabled_count, 1);
    assert_eq!(records[1].total_count, 3);
    assert_eq!(records[1].percentage_enabled, "33.33%");
    assert_eq!(records[1].percentage_disabled, "66.67%");
}

#[test]
fn activity_windows_count_back_from_now() {
    let (engine, sy) = switchyard_with_users(4);
    active(&sy, "history");
    let feature = sy.feature("history").unwrap();
    let now = Utc::now();
    for (id, age) in [(1, 2), (2, 9), (3, 20), (4, 60)] {
        engine
            .assign(&AssignableRef::new("User", id), feature.id, now - Duration::days(age))
            .unwrap();
    }

    let record = &sy.track_at("history", now).unwrap()[0];
    assert_eq!(record.past_7_days, 1);
    assert_eq!(record.past_14_days, 2);
    assert_eq!(record.past_30_days, 3);
    assert_eq!(
        record.first_created.map(|t| t.timestamp()),
        Some((now - Duration::days(60)).timestamp())
    );
}

#[test]
fn record_serializes_with_snake_case_keys() {
    let (_engine, sy) = switchyard_with_users(1);
    active(&sy, "json_me");
    sy.assignable(AssignableRef::new("User", 1)).unwrap().enable("json_me").unwrap();

    let records = sy.track("json_me").unwrap();
    let value = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(value["assignable"], "User");
    assert_eq!(value["enabled_count"], 1);
    assert_eq!(value["percentage_enabled"], "100.0%");
    assert!(value["past_30_days"].is_i64());
}

/// A registered population whose every query reports a busy database.
struct BusyUsers;

impl AssignableSource for BusyUsers {
    fn kind(&self) -> &str {
        "User"
    }
    fn with_features(&self, _: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
        Err(StorageError::DbBusy)
    }
    fn without_features(&self, _: &[FeatureId]) -> Result<Vec<AssignableId>, StorageError> {
        Err(StorageError::DbBusy)
    }
    fn count(&self) -> Result<i64, StorageError> {
        Err(StorageError::DbBusy)
    }
    fn exists(&self, _: AssignableId) -> Result<bool, StorageError> {
        Err(StorageError::DbBusy)
    }
}

#[test]
fn storage_failure_of_registered_type_aborts_report() {
    let engine = Arc::new(SwitchyardStorageEngine::open_in_memory().unwrap());
    let mut registry = AssignableRegistry::new();
    registry.register(Arc::new(BusyUsers));
    let sy = Switchyard::new(
        Arc::clone(&engine) as Arc<dyn IFeatureStore>,
        Arc::clone(&engine) as Arc<dyn IAssignmentStore>,
        registry,
        DependencyIndex::empty(),
    );
    let feature = sy.create_feature(NewFeature::new("dark_mode").active()).unwrap();
    engine
        .assign(&AssignableRef::new("User", 1), feature.id, Utc::now())
        .unwrap();

    let err = sy.track("dark_mode").unwrap_err();
    assert!(
        matches!(err, ToggleError::Storage(StorageError::DbBusy)),
        "got {err:?}"
    );
}
