//! Feature lifecycle through the facade, plus config-driven startup.

mod common;

use std::fs;
use std::sync::Arc;

use switchyard_core::config::AssignableConfig;
use switchyard_core::errors::{StorageError, ToggleError};
use switchyard_core::types::{AssignableRef, FeatureQuery, FeatureStatus, FeatureUpdate, NewFeature};
use switchyard_core::{ErrorCode, SwitchyardConfig};
use switchyard_engine::{BulkFilters, Switchyard};
use switchyard_storage::SwitchyardStorageEngine;
use tempfile::TempDir;

use common::{active, create_table, switchyard_with_users};

#[test]
fn create_derives_identifier_and_defaults_inactive() {
    let (_engine, sy) = switchyard_with_users(0);
    let feature = sy.create_feature(NewFeature::new("Super Powers!")).unwrap();
    assert_eq!(feature.identifier, "super_powers");
    assert_eq!(feature.status, FeatureStatus::Inactive);

    let explicit = sy
        .create_feature(NewFeature::new("Other").identifier("Keep-As-Is"))
        .unwrap();
    assert_eq!(explicit.identifier, "Keep-As-Is");
}

#[test]
fn blank_and_duplicate_names_are_rejected() {
    let (_engine, sy) = switchyard_with_users(0);
    assert!(matches!(
        sy.create_feature(NewFeature::new("   ")),
        Err(ToggleError::InvalidInput(_))
    ));

    sy.create_feature(NewFeature::new("Dup")).unwrap();
    let err = sy.create_feature(NewFeature::new("Dup")).unwrap_err();
    assert!(matches!(
        err,
        ToggleError::Storage(StorageError::UniqueViolation { .. })
    ));
    assert_eq!(err.error_code(), "UNIQUE_VIOLATION");
}

#[test]
fn status_changes() {
    let (_engine, sy) = switchyard_with_users(0);
    sy.create_feature(NewFeature::new("flip")).unwrap();

    assert!(sy.toggle_feature("flip").unwrap().is_active());
    assert!(!sy.toggle_feature("flip").unwrap().is_active());
    assert!(sy.activate_feature("flip").unwrap().is_active());
    assert!(sy.activate_feature("flip").unwrap().is_active());
    assert!(!sy.inactivate_feature("flip").unwrap().is_active());
    assert_eq!(sy.toggle_feature("nope").unwrap_err().error_code(), "FEATURE_NOT_FOUND");
}

#[test]
fn update_changes_attributes_and_keeps_identifier() {
    let (_engine, sy) = switchyard_with_users(0);
    sy.create_feature(NewFeature::new("reports").group("beta")).unwrap();

    let updated = sy
        .update_feature(
            "reports",
            FeatureUpdate {
                name: Some("Reports v2".into()),
                group: Some(None),
                environment: Some(Some("staging".into())),
                ..FeatureUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Reports v2");
    assert_eq!(updated.identifier, "reports");
    assert_eq!(updated.group, None);
    assert_eq!(updated.environment.as_deref(), Some("staging"));

    let err = sy
        .update_feature(
            "reports",
            FeatureUpdate {
                name: Some(" ".into()),
                ..FeatureUpdate::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
}

#[test]
fn destroy_cascades_assignments() {
    let (_engine, sy) = switchyard_with_users(3);
    active(&sy, "doomed");
    sy.bulk_enable("User", ["doomed"], &BulkFilters::new()).unwrap();

    assert_eq!(sy.destroy_feature("doomed").unwrap(), 3);
    assert!(sy.assignments_for_type("User").unwrap().is_empty());
    assert!(matches!(
        sy.feature("doomed"),
        Err(ToggleError::FeatureNotFound { .. })
    ));
    assert!(sy.destroy_feature("doomed").is_err());
}

#[test]
fn resolve_features_applies_every_filter() {
    let (_engine, sy) = switchyard_with_users(0);
    sy.create_feature(NewFeature::new("a").group("admin").environment("prod").active())
        .unwrap();
    sy.create_feature(NewFeature::new("b").group("admin")).unwrap();
    sy.create_feature(NewFeature::new("c")).unwrap();

    let ids = |features: Vec<switchyard_core::types::Feature>| -> Vec<String> {
        features.into_iter().map(|f| f.identifier).collect()
    };

    let no_ids: [&str; 0] = [];
    assert_eq!(ids(sy.resolve_features(no_ids, &FeatureQuery::new()).unwrap()), ["a", "b", "c"]);
    assert_eq!(
        ids(sy.resolve_features(["a", "b", "c"], &FeatureQuery::new().role("admin")).unwrap()),
        ["a", "b"]
    );
    assert_eq!(
        ids(sy
            .resolve_features(["a", "b"], &FeatureQuery::new().role("admin").status(FeatureStatus::Active))
            .unwrap()),
        ["a"]
    );
    assert_eq!(
        ids(sy.resolve_features(no_ids, &FeatureQuery::new().without_group()).unwrap()),
        ["c"]
    );
    assert!(sy
        .resolve_features(["a"], &FeatureQuery::new().env("staging"))
        .unwrap()
        .is_empty());
}

#[test]
fn open_from_config_files() {
    let dir = TempDir::new().unwrap();
    let deps = dir.path().join("deps.yml");
    fs::write(&deps, "feature_dependency:\n  checkout_v2: [payments]\n").unwrap();

    let config_path = dir.path().join("switchyard.toml");
    fs::write(
        &config_path,
        format!(
            "[storage]\npath = {:?}\n\n[dependencies]\npath = {:?}\n\n[[assignables]]\nkind = \"User\"\ntable = \"users\"\n",
            dir.path().join("switchyard.db"),
            deps,
        ),
    )
    .unwrap();

    let config = SwitchyardConfig::load(&config_path).unwrap();
    let engine = Arc::new(SwitchyardStorageEngine::from_config(&config.storage).unwrap());
    create_table(&engine, "users", 2);
    let sy = Switchyard::from_engine(Arc::clone(&engine), &config).unwrap();

    assert_eq!(sy.dependencies_for("checkout_v2"), ["payments"]);
    assert_eq!(sy.registry().kinds(), ["User"]);

    active(&sy, "payments");
    sy.assignable(AssignableRef::new("User", 2)).unwrap().enable("payments").unwrap();
    assert_eq!(sy.track("payments").unwrap()[0].enabled_count, 1);
}

#[test]
fn reload_from_bad_file_keeps_current_index() {
    let dir = TempDir::new().unwrap();
    let deps = dir.path().join("deps.yml");
    fs::write(&deps, "a: [b]\nb: [a]\n").unwrap();

    let engine = Arc::new(SwitchyardStorageEngine::open_in_memory().unwrap());
    let config = SwitchyardConfig {
        assignables: vec![AssignableConfig::new("User", "users")],
        ..SwitchyardConfig::default()
    };
    let sy = Switchyard::from_engine(engine, &config).unwrap();

    let err = sy.reload_dependencies_from(&deps).unwrap_err();
    assert_eq!(err.error_code(), "CONFIG_DEPENDENCY_CYCLE");
    assert!(sy.dependency_index().is_empty());

    fs::write(&deps, "a: [b]\n").unwrap();
    sy.reload_dependencies_from(&deps).unwrap();
    assert_eq!(sy.dependents_of("b"), ["a"]);
}
