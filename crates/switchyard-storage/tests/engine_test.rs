//! SwitchyardStorageEngine integration tests: feature CRUD through the
//! traits, cascade deletes, bulk batch atomicity, host-table populations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use switchyard_core::config::{AssignableConfig, StorageConfig};
use switchyard_core::errors::StorageError;
use switchyard_core::traits::{AssignableRegistry, AssignableSource, IAssignmentStore, IFeatureStore};
use switchyard_core::types::{
    AssignableRef, AssignmentBatch, FeatureQuery, FeatureStatus, FeatureUpdate, NewFeature,
    ToggleDirection,
};
use switchyard_storage::SwitchyardStorageEngine;
use tempfile::TempDir;

fn sqe(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError { message: e.to_string() }
}

fn engine_with_users(n: i64) -> SwitchyardStorageEngine {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    create_users(&engine, n);
    engine
}

fn create_users(engine: &SwitchyardStorageEngine, n: i64) {
    engine
        .with_writer(|conn| {
            conn.execute_batch("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, email TEXT)")
                .map_err(sqe)?;
            for i in 1..=n {
                conn.execute(
                    "INSERT INTO users (id, email) VALUES (?1, ?2)",
                    rusqlite::params![i, format!("user{i}@example.com")],
                )
                .map_err(sqe)?;
            }
            Ok(())
        })
        .unwrap();
}

// ---- Features ----

#[test]
fn feature_crud_round_trip() {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    let now = Utc::now();

    let created = engine
        .insert_feature(
            &NewFeature::new("Beta Checkout").group("beta").environment("production"),
            now,
        )
        .unwrap();
    assert_eq!(created.identifier, "beta_checkout");
    assert_eq!(engine.count_features().unwrap(), 1);

    let later = now + Duration::seconds(30);
    let updated = engine
        .update_feature(
            created.id,
            &FeatureUpdate {
                group: Some(None),
                tenant_id: Some(Some("acme".into())),
                ..FeatureUpdate::default()
            },
            later,
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.group, None);
    assert_eq!(updated.tenant_id.as_deref(), Some("acme"));
    assert_eq!(updated.updated_at.timestamp(), later.timestamp());
    assert_eq!(updated.created_at.timestamp(), now.timestamp());

    let active = engine
        .set_feature_status(created.id, FeatureStatus::Active, later)
        .unwrap()
        .unwrap();
    assert!(active.is_active());

    assert!(engine.update_feature(999, &FeatureUpdate::default(), now).unwrap().is_none());
    assert!(engine.set_feature_status(999, FeatureStatus::Active, now).unwrap().is_none());
}

#[test]
fn query_features_combines_filters() {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    engine.insert_feature(&NewFeature::new("a").group("beta").environment("prod").active(), now).unwrap();
    engine.insert_feature(&NewFeature::new("b").group("beta").environment("staging"), now).unwrap();
    engine.insert_feature(&NewFeature::new("c").environment("prod").tenant_id("t1"), now).unwrap();

    let ids = |q: FeatureQuery| -> Vec<String> {
        engine
            .query_features(&q)
            .unwrap()
            .into_iter()
            .map(|f| f.identifier)
            .collect()
    };

    assert_eq!(ids(FeatureQuery::new()), ["a", "b", "c"]);
    assert_eq!(ids(FeatureQuery::new().role("beta")), ["a", "b"]);
    assert_eq!(ids(FeatureQuery::new().role("beta").env("prod")), ["a"]);
    assert_eq!(ids(FeatureQuery::new().without_group()), ["c"]);
    assert_eq!(ids(FeatureQuery::new().without_tenant().env("prod")), ["a"]);
    assert_eq!(ids(FeatureQuery::new().status(FeatureStatus::Inactive)), ["b", "c"]);
    assert_eq!(ids(FeatureQuery::new().identifiers(["c", "a", "zz"])), ["a", "c"]);
    assert!(ids(FeatureQuery::new().identifier("zz")).is_empty());
}

#[test]
fn deleting_a_feature_cascades_its_assignments() {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let keep = engine.insert_feature(&NewFeature::new("keep"), now).unwrap();
    let gone = engine.insert_feature(&NewFeature::new("gone"), now).unwrap();
    for id in 1..=3 {
        engine.assign(&AssignableRef::new("User", id), gone.id, now).unwrap();
    }
    engine.assign(&AssignableRef::new("User", 1), keep.id, now).unwrap();

    assert_eq!(engine.delete_feature(gone.id).unwrap(), Some(3));
    assert!(engine.get_feature(gone.id).unwrap().is_none());
    assert_eq!(engine.count_assignments().unwrap(), 1);
    assert_eq!(engine.delete_feature(gone.id).unwrap(), None);
}

// ---- Assignments ----

#[test]
fn batch_failure_rolls_back_every_row() {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let f = engine.insert_feature(&NewFeature::new("f"), now).unwrap();
    engine
        .with_writer(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_seven BEFORE INSERT ON feature_assignments
                 WHEN NEW.assignable_id = 7
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .map_err(sqe)
        })
        .unwrap();

    let batch = AssignmentBatch::new("User", ToggleDirection::Enable, (1..=10).collect(), vec![f.id]);
    let err = engine.apply_batch(&batch, now).unwrap_err();
    assert!(err.to_string().contains("rejected"), "got {err}");
    assert_eq!(engine.count_assignments().unwrap(), 0);
}

#[test]
fn assignment_listing_and_types() {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let f = engine.insert_feature(&NewFeature::new("f"), now).unwrap();
    engine.assign(&AssignableRef::new("User", 1), f.id, now).unwrap();
    engine.assign(&AssignableRef::new("User", 2), f.id, now).unwrap();
    engine.assign(&AssignableRef::new("Account", 1), f.id, now).unwrap();

    assert_eq!(engine.assignable_types_for_feature(f.id).unwrap(), ["Account", "User"]);
    assert_eq!(engine.assignments_for_feature(f.id).unwrap().len(), 3);
    let users = engine.assignments_for_type("User").unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].assignable(), AssignableRef::new("User", 1));

    let user_one = AssignableRef::new("User", 1);
    assert_eq!(engine.assigned_feature_ids(&user_one).unwrap(), [f.id]);
    assert_eq!(engine.clear_assignments(&user_one).unwrap(), 1);
    assert!(!engine.has_assignment(&user_one, &[f.id]).unwrap());
}

// ---- Populations ----

#[test]
fn sqlite_source_partitions_users() {
    let engine = engine_with_users(6);
    let now = Utc::now();
    let f = engine.insert_feature(&NewFeature::new("f"), now).unwrap();
    for id in [2, 4] {
        engine.assign(&AssignableRef::new("User", id), f.id, now).unwrap();
    }

    let users = engine.assignable_source(&AssignableConfig::new("User", "users")).unwrap();
    assert_eq!(users.kind(), "User");
    assert_eq!(users.count().unwrap(), 6);
    assert_eq!(users.with_features(&[f.id]).unwrap(), [2, 4]);
    assert_eq!(users.without_features(&[f.id]).unwrap(), [1, 3, 5, 6]);
    assert!(users.exists(6).unwrap());
    assert!(!users.exists(7).unwrap());
}

#[test]
fn registering_a_bad_table_name_fails() {
    let engine = SwitchyardStorageEngine::open_in_memory().unwrap();
    let mut registry = AssignableRegistry::new();
    let err = engine
        .register_assignables(&[AssignableConfig::new("User", "users; DROP TABLE features")], &mut registry)
        .unwrap_err();
    assert!(err.to_string().contains("not a plain SQL identifier"));
    assert!(registry.is_empty());
}

#[test]
fn file_backed_engine_reads_through_pool() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        path: Some(dir.path().join("toggles.db")),
        read_pool_size: Some(2),
        ..StorageConfig::default()
    };
    let engine = Arc::new(SwitchyardStorageEngine::from_config(&config).unwrap());
    assert!(engine.path().is_some());
    create_users(&engine, 3);

    let mut registry = AssignableRegistry::new();
    engine
        .register_assignables(&[AssignableConfig::new("User", "users")], &mut registry)
        .unwrap();
    let users = registry.require("User").unwrap();

    let f = engine.insert_feature(&NewFeature::new("f"), Utc::now()).unwrap();
    let batch = AssignmentBatch::new("User", ToggleDirection::Enable, vec![1, 3], vec![f.id]);
    engine.apply_batch(&batch, Utc::now()).unwrap();

    // Readers round-robin; each must observe the committed batch.
    for _ in 0..4 {
        assert_eq!(users.with_features(&[f.id]).unwrap(), [1, 3]);
        assert_eq!(users.without_features(&[f.id]).unwrap(), [2]);
    }
    engine.checkpoint().unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn with_and_without_partition_the_population(
        assigned in proptest::collection::btree_set(1i64..=20, 0..20),
        use_both in any::<bool>(),
    ) {
        let engine = engine_with_users(20);
        let now = Utc::now();
        let f1 = engine.insert_feature(&NewFeature::new("f1"), now).unwrap();
        let f2 = engine.insert_feature(&NewFeature::new("f2"), now).unwrap();
        for (i, id) in assigned.iter().enumerate() {
            let feature = if i % 2 == 0 { f1.id } else { f2.id };
            engine.assign(&AssignableRef::new("User", *id), feature, now).unwrap();
        }

        let features = if use_both { vec![f1.id, f2.id] } else { vec![f1.id] };
        let users = engine.assignable_source(&AssignableConfig::new("User", "users")).unwrap();
        let with = users.with_features(&features).unwrap();
        let without = users.without_features(&features).unwrap();

        prop_assert_eq!(with.len() + without.len(), 20);
        let mut all: Vec<i64> = with.iter().chain(without.iter()).copied().collect();
        all.sort_unstable();
        all.dedup();
        prop_assert_eq!(all, (1..=20).collect::<Vec<_>>());
    }
}
