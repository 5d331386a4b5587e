mod db_utils;

use db_utils::TestDB;
use ela_whales::framework::migrations;
use ela_whales::framework::migrations::CURRENT_REVISION;
use ela_whales::framework::store as pg;
use ela_whales::Error;

#[tokio::test]
async fn test_fresh_db_is_fully_migrated() {
    let test_db = TestDB::new("schema_fresh").await;
    let client = pg::connect_and_init(&test_db.pgconf, false).await.unwrap();
    assert_eq!(
        migrations::get_revision(&client).await.unwrap(),
        CURRENT_REVISION
    );
    // Second start is a no-op
    pg::connect_and_init(&test_db.pgconf, false).await.unwrap();
    assert_eq!(test_db.count("cross_chain_supply").await, 0);
}

#[tokio::test]
async fn test_migrations_need_permission() {
    let test_db = TestDB::new("schema_permission").await;
    test_db.init_base_schema().await;

    let res = pg::connect_and_init(&test_db.pgconf, false).await;
    assert!(matches!(res, Err(Error::Revision { found: 1, .. })));

    let client = pg::connect_and_init(&test_db.pgconf, true).await.unwrap();
    assert_eq!(
        migrations::get_revision(&client).await.unwrap(),
        CURRENT_REVISION
    );
}

#[tokio::test]
async fn test_partially_applied_migration_is_repaired() {
    let test_db = TestDB::new("schema_partial").await;
    test_db.init_base_schema().await;

    // First steps of migration 1 went through, then it failed
    test_db
        .client
        .batch_execute(
            "
            alter table whales.snapshots add column chain text not null default 'mainchain';
            alter table whales.snapshots drop constraint snapshots_date_time_slot_key;
            ",
        )
        .await
        .unwrap();

    let client = pg::connect_and_init(&test_db.pgconf, true).await.unwrap();
    assert_eq!(
        migrations::get_revision(&client).await.unwrap(),
        CURRENT_REVISION
    );

    // Re-running all steps on a current schema is harmless too
    test_db
        .client
        .execute("update whales._rev set version = 1;", &[])
        .await
        .unwrap();
    pg::connect_and_init(&test_db.pgconf, true).await.unwrap();
    assert_eq!(test_db.count("cross_chain_supply").await, 0);
}

#[tokio::test]
async fn test_newer_db_is_rejected() {
    let test_db = TestDB::new("schema_newer").await;
    pg::connect_and_init(&test_db.pgconf, false).await.unwrap();
    test_db
        .client
        .execute("update whales._rev set version = 99;", &[])
        .await
        .unwrap();
    let res = pg::connect_and_init(&test_db.pgconf, true).await;
    assert!(matches!(res, Err(Error::Revision { found: 99, .. })));
}
