mod common;

use std::sync::Arc;

use sea_orm::sea_query::{Alias, Table, TableCreateStatement};
use sea_orm::{EntityTrait, Schema, Set};

use common::entities::{author, book};
use db_lifecycle::{open_sqlite_v2, DatabaseV2, DbConfig, DbError, Model};

async fn open_fresh(dir: &tempfile::TempDir, name: &str) -> Arc<dyn DatabaseV2> {
    let locator = dir.path().join(name);
    open_sqlite_v2(DbConfig::new(locator.to_str().unwrap()), &[])
        .await
        .unwrap()
}

async fn assert_schema_queryable(db: &Arc<dyn DatabaseV2>) {
    let conn = db.connection().unwrap();

    let ursula = author::ActiveModel {
        id: Set(1),
        name: Set("Ursula".to_owned()),
    };
    author::Entity::insert(ursula)
        .exec(conn.as_ref())
        .await
        .unwrap();

    let dispossessed = book::ActiveModel {
        id: Set(1),
        author_id: Set(1),
        title: Set("The Dispossessed".to_owned()),
    };
    book::Entity::insert(dispossessed)
        .exec(conn.as_ref())
        .await
        .unwrap();

    let books = book::Entity::find().all(conn.as_ref()).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "The Dispossessed");
}

#[tokio::test]
async fn parent_then_child_yields_queryable_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_fresh(&dir, "ordered.db").await;

    let models: [&dyn Model; 2] = [&author::Entity, &book::Entity];
    db.migrate(&models).await.unwrap();
    assert_schema_queryable(&db).await;
}

#[tokio::test]
async fn child_then_parent_succeeds_identically() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_fresh(&dir, "reversed.db").await;

    // The engine resolves the child's foreign-key reference lazily, so the
    // reversed order behaves exactly like the forward one.
    let models: [&dyn Model; 2] = [&book::Entity, &author::Entity];
    db.migrate(&models).await.unwrap();
    assert_schema_queryable(&db).await;
}

#[tokio::test]
async fn repeated_migration_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_fresh(&dir, "repeat.db").await;

    let models: [&dyn Model; 2] = [&author::Entity, &book::Entity];
    db.migrate(&models).await.unwrap();
    assert_schema_queryable(&db).await;
    db.migrate(&models).await.unwrap();

    let conn = db.connection().unwrap();
    let books = book::Entity::find().all(conn.as_ref()).await.unwrap();
    assert_eq!(books.len(), 1, "existing rows survive a re-migration");
}

/// Descriptor producing DDL the engine rejects: a table with no columns.
struct BrokenModel;

impl Model for BrokenModel {
    fn descriptor(&self) -> String {
        "broken".to_string()
    }

    fn create_statement(&self, _schema: &Schema) -> TableCreateStatement {
        Table::create().table(Alias::new("broken")).to_owned()
    }
}

#[tokio::test]
async fn failed_model_is_named_in_the_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_fresh(&dir, "failing.db").await;

    let models: [&dyn Model; 2] = [&author::Entity, &BrokenModel];
    let err = db.migrate(&models).await.unwrap_err();

    assert!(matches!(err, DbError::MigrationFailed { .. }));
    assert!(err.to_string().contains("migrate model broken error"));

    // The model before the failing one was applied; migration is ordered
    // and aborts at the first failure.
    let conn = db.connection().unwrap();
    let authors = author::Entity::find().all(conn.as_ref()).await.unwrap();
    assert!(authors.is_empty());
}
