//! End-to-end migration of legacy databases through an injected row loader.

use anyhow::Result;
use serde_json::json;
use std::collections::HashMap;
use tabula::migration::{InMemoryRowDocumentLoader, migrate, migrate_with_report, row_document_key};
use tabula::testing::{FailingRowLoader, create_legacy_database, init_test_tracing, seed_row};
use tabula::{DatabaseHandle, MigrationOptions};
use tabula_api::{DatabaseError, FieldType, NewField, TARGET_SCHEMA_VERSION, TypeOptionData, ViewLayout};

const ROLLUP: i64 = FieldType::Rollup.tag();
const TIME: i64 = FieldType::Time.tag();

fn blob(value: serde_json::Value) -> TypeOptionData {
    value.as_object().cloned().unwrap_or_default()
}

/// Legacy database with three views:
///
/// - `grid` and `board` both reference `r1`
/// - `calendar` alone references `r2`
///
/// Fields: `f1` is a Time field stored with the Rollup tag, `f2` is a real
/// Rollup, `f3` a Number. Row `r3` exists but no view references it.
async fn scenario(loader: &InMemoryRowDocumentLoader) -> Result<DatabaseHandle> {
    let db = create_legacy_database("db").await?;

    db.create_field(NewField::new("Title", FieldType::RichText).with_id("f0").primary())
        .await?;
    db.create_field(
        NewField::new("Due", FieldType::Rollup)
            .with_id("f1")
            .with_type_option(blob(json!({"time_format": 1, "include_time": true}))),
    )
    .await?;
    db.create_field(
        NewField::new("Total", FieldType::Rollup)
            .with_id("f2")
            .with_type_option(blob(json!({"relation_field_id": "rel", "calculation_type": 0}))),
    )
    .await?;
    db.create_field(NewField::new("Amount", FieldType::Number).with_id("f3"))
        .await?;

    db.create_view("grid", "Grid", ViewLayout::Grid).await?;
    db.create_view("board", "Board", ViewLayout::Board).await?;
    db.create_view("calendar", "Calendar", ViewLayout::Calendar).await?;
    db.append_row_order("grid", "r1").await?;
    db.append_row_order("board", "r1").await?;
    db.append_row_order("calendar", "r2").await?;

    seed_row(
        loader,
        &db,
        "r1",
        &[
            ("f1", FieldType::Rollup, None),
            ("f2", FieldType::Rollup, Some(FieldType::Rollup)),
        ],
    )
    .await?;
    seed_row(
        loader,
        &db,
        "r2",
        &[
            ("f1", FieldType::Summary, Some(FieldType::Rollup)),
            ("f3", FieldType::Rollup, None),
        ],
    )
    .await?;
    seed_row(loader, &db, "r3", &[("f1", FieldType::Rollup, None)]).await?;
    Ok(db)
}

async fn stamps(
    loader: &InMemoryRowDocumentLoader,
    row_id: &str,
    field_id: &str,
) -> Result<(Option<i64>, Option<i64>)> {
    let doc = loader
        .get(&row_document_key("db", row_id))
        .ok_or_else(|| anyhow::anyhow!("row {} not seeded", row_id))?;
    let cell = tabula::RowDocument::open(doc)
        .cell(field_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("cell {} missing", field_id))?;
    Ok((cell.field_type, cell.source_field_type))
}

#[tokio::test]
async fn test_two_views_scenario() -> Result<()> {
    init_test_tracing();
    let loader = InMemoryRowDocumentLoader::new();
    let db = scenario(&loader).await?;

    let report = migrate_with_report(db.doc(), Some(&loader), MigrationOptions::default())
        .await?
        .ok_or_else(|| anyhow::anyhow!("expected migration work"))?;
    assert_eq!(report.fields_corrected, 1);
    assert_eq!(report.rows_visited, 2);
    assert_eq!(report.cells_corrected, 2);
    assert!(report.version_committed);

    let f1 = db.field("f1").await?;
    assert_eq!(f1.field_type(), Some(FieldType::Time));
    assert_eq!(
        f1.type_options.get(FieldType::Time),
        Some(&blob(json!({"time_format": 1, "include_time": true})))
    );
    assert!(f1.type_options.get(FieldType::Rollup).is_none());
    assert_eq!(db.schema_version().await?, TARGET_SCHEMA_VERSION);

    let mut requested = loader.requested_keys();
    requested.sort();
    assert_eq!(requested, vec!["db_rows_r1", "db_rows_r2"]);
    Ok(())
}

#[tokio::test]
async fn test_cell_stamps_are_corrected_independently() -> Result<()> {
    let loader = InMemoryRowDocumentLoader::new();
    let db = scenario(&loader).await?;
    migrate(db.doc(), Some(&loader), MigrationOptions::default()).await?;

    assert_eq!(stamps(&loader, "r1", "f1").await?, (Some(TIME), None));
    // f2 is a real Rollup; its stamps stay.
    assert_eq!(stamps(&loader, "r1", "f2").await?, (Some(ROLLUP), Some(ROLLUP)));
    // Only the source stamp referred to the retagged field.
    assert_eq!(
        stamps(&loader, "r2", "f1").await?,
        (Some(FieldType::Summary.tag()), Some(TIME))
    );
    // f3 is a Number field, so a stray Rollup stamp is not rewritten.
    assert_eq!(stamps(&loader, "r2", "f3").await?, (Some(ROLLUP), None));
    Ok(())
}

#[tokio::test]
async fn test_unreferenced_rows_are_never_loaded() -> Result<()> {
    let loader = InMemoryRowDocumentLoader::new();
    let db = scenario(&loader).await?;
    migrate(db.doc(), Some(&loader), MigrationOptions::default()).await?;

    assert!(!loader.requested_keys().contains(&"db_rows_r3".to_string()));
    assert_eq!(stamps(&loader, "r3", "f1").await?, (Some(ROLLUP), None));
    Ok(())
}

#[tokio::test]
async fn test_second_run_is_a_no_op() -> Result<()> {
    let loader = InMemoryRowDocumentLoader::new();
    let db = scenario(&loader).await?;
    assert!(migrate(db.doc(), Some(&loader), MigrationOptions::default()).await?);

    let fields = db.fields().await?;
    let r2 = stamps(&loader, "r2", "f1").await?;
    let loads = loader.requested_keys().len();

    assert!(!migrate(db.doc(), Some(&loader), MigrationOptions::default()).await?);
    assert_eq!(db.fields().await?, fields);
    assert_eq!(stamps(&loader, "r2", "f1").await?, r2);
    assert_eq!(loader.requested_keys().len(), loads);
    Ok(())
}

#[tokio::test]
async fn test_explicit_row_ids_replace_collection() -> Result<()> {
    let loader = InMemoryRowDocumentLoader::new();
    let db = scenario(&loader).await?;
    let options = MigrationOptions::new().with_row_ids(vec!["r3".to_string()]);
    migrate(db.doc(), Some(&loader), options).await?;

    assert_eq!(loader.requested_keys(), vec!["db_rows_r3"]);
    assert_eq!(stamps(&loader, "r3", "f1").await?, (Some(TIME), None));
    assert_eq!(stamps(&loader, "r1", "f1").await?, (Some(ROLLUP), None));
    Ok(())
}

#[tokio::test]
async fn test_without_version_commit_runs_again() -> Result<()> {
    let loader = InMemoryRowDocumentLoader::new();
    let db = scenario(&loader).await?;

    let options = MigrationOptions::new().without_version_commit();
    let report = migrate_with_report(db.doc(), Some(&loader), options.clone())
        .await?
        .ok_or_else(|| anyhow::anyhow!("expected migration work"))?;
    assert!(!report.version_committed);
    assert_eq!(db.schema_version().await?, 0);

    let again = migrate_with_report(db.doc(), Some(&loader), options)
        .await?
        .ok_or_else(|| anyhow::anyhow!("expected migration work"))?;
    assert_eq!(again.fields_corrected, 0);
    assert_eq!(again.cells_corrected, 0);
    assert_eq!(again.rows_visited, 2);
    Ok(())
}

#[tokio::test]
async fn test_loader_failure_keeps_partial_progress() -> Result<()> {
    let seeded = InMemoryRowDocumentLoader::new();
    let db = scenario(&seeded).await?;
    let loader = FailingRowLoader::new(seeded);
    loader.fail_on(row_document_key("db", "r2"));

    let options = MigrationOptions::new().with_row_ids(vec!["r1".to_string(), "r2".to_string()]);
    let err = migrate(db.doc(), Some(&loader), options.clone())
        .await
        .expect_err("loader failure must propagate");
    assert!(matches!(err, DatabaseError::LoaderFailed { ref key, .. } if key == "db_rows_r2"));

    assert_eq!(db.field("f1").await?.field_type(), Some(FieldType::Time));
    assert_eq!(db.schema_version().await?, 0);
    assert_eq!(stamps(loader.inner(), "r1", "f1").await?, (Some(TIME), None));
    assert_eq!(
        stamps(loader.inner(), "r2", "f1").await?,
        (Some(FieldType::Summary.tag()), Some(ROLLUP))
    );

    loader.clear_failures();
    let report = migrate_with_report(db.doc(), Some(&loader), options)
        .await?
        .ok_or_else(|| anyhow::anyhow!("retry should perform work"))?;
    assert_eq!(report.fields_corrected, 0);
    assert_eq!(report.cells_corrected, 1);
    assert_eq!(db.schema_version().await?, TARGET_SCHEMA_VERSION);
    assert_eq!(
        stamps(loader.inner(), "r2", "f1").await?,
        (Some(FieldType::Summary.tag()), Some(TIME))
    );
    Ok(())
}

#[tokio::test]
async fn test_field_batch_is_one_change() -> Result<()> {
    let db = create_legacy_database("db").await?;
    for id in ["a", "b", "c"] {
        db.create_field(NewField::new(id, FieldType::Rollup).with_id(id))
            .await?;
    }

    let changes = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = changes.clone();
    let _subscription = db
        .doc()
        .subscribe(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        })
        .await;

    // Field pass and version bump, no loader.
    migrate(db.doc(), None, MigrationOptions::default()).await?;
    assert_eq!(changes.load(std::sync::atomic::Ordering::SeqCst), 2);

    let types: HashMap<String, Option<FieldType>> = db
        .fields()
        .await?
        .into_iter()
        .map(|f| (f.id.clone(), f.field_type()))
        .collect();
    assert!(types.values().all(|t| *t == Some(FieldType::Time)));
    Ok(())
}

#[tokio::test]
async fn test_database_without_fields_is_skipped() -> Result<()> {
    let doc = std::sync::Arc::new(tabula::ReplicatedDoc::new("db"));
    doc.with_write(|d| {
        d.get_map(tabula::schema::DATABASE).insert("id", "db")?;
        Ok(())
    })
    .await?;
    assert!(!migrate(&doc, None, MigrationOptions::default()).await?);
    Ok(())
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Kind {
        LegacyTime,
        Rollup,
        Time,
        Number,
    }

    fn kind() -> impl Strategy<Value = Kind> {
        prop_oneof![
            Just(Kind::LegacyTime),
            Just(Kind::Rollup),
            Just(Kind::Time),
            Just(Kind::Number),
        ]
    }

    fn new_field(index: usize, kind: Kind) -> NewField {
        let id = format!("f{}", index);
        let field = match kind {
            Kind::LegacyTime => NewField::new(&id, FieldType::Rollup)
                .with_type_option(blob(json!({"date_format": 2}))),
            Kind::Rollup => NewField::new(&id, FieldType::Rollup)
                .with_type_option(blob(json!({"target_field_id": "t", "date_format": 2}))),
            Kind::Time => NewField::new(&id, FieldType::Time),
            Kind::Number => NewField::new(&id, FieldType::Number)
                .with_type_option(blob(json!({"format": 1}))),
        };
        field.with_id(id)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_migration_is_scoped_and_idempotent(kinds in proptest::collection::vec(kind(), 1..8)) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            runtime.block_on(async {
                let db = create_legacy_database("db").await?;
                for (i, k) in kinds.iter().enumerate() {
                    db.create_field(new_field(i, *k)).await?;
                }

                migrate(db.doc(), None, MigrationOptions::default()).await?;
                let after_first = db.fields().await?;
                let second = migrate(db.doc(), None, MigrationOptions::default()).await?;
                prop_assert!(!second);
                prop_assert_eq!(&db.fields().await?, &after_first);

                for (i, k) in kinds.iter().enumerate() {
                    let field = db.field(&format!("f{}", i)).await?;
                    let expected = match k {
                        Kind::LegacyTime | Kind::Time => FieldType::Time,
                        Kind::Rollup => FieldType::Rollup,
                        Kind::Number => FieldType::Number,
                    };
                    prop_assert_eq!(field.field_type(), Some(expected));
                }
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
