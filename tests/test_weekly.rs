mod common;
mod db_utils;

use rust_decimal::Decimal;
use time::macros::date;

use common::set_tracing_subscriber;
use common::snapshot;
use db_utils::TestDB;
use ela_whales::core::types::Chain;
use ela_whales::workers::snapshots::Ingestor;
use ela_whales::workers::weekly::WeeklyRollup;

async fn ingest_fixture(test_db: &TestDB) {
    let mut ingestor = Ingestor::new(&test_db.pgconf).await.unwrap();
    for raw in [
        snapshot(date!(2024 - 03 - 01), "08:00", Chain::Mainchain, &[("a", 500), ("b", 300), ("c", 100)]),
        snapshot(date!(2024 - 03 - 04), "08:00", Chain::Mainchain, &[("a", 500), ("b", 300), ("d", 150)]),
        snapshot(date!(2024 - 03 - 06), "08:00", Chain::Mainchain, &[("a", 400), ("b", 350), ("d", 150)]),
        snapshot(date!(2024 - 03 - 10), "08:00", Chain::Mainchain, &[("a", 420), ("b", 360), ("c", 120)]),
        snapshot(date!(2024 - 03 - 11), "08:00", Chain::Mainchain, &[("a", 420), ("b", 360), ("c", 120)]),
        // Other chains are ignored
        snapshot(date!(2024 - 03 - 20), "08:00", Chain::Esc, &[("x", 1)]),
    ] {
        ingestor.ingest(&raw).await.unwrap();
    }
}

#[tokio::test]
async fn test_pending_weeks() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("weekly_pending").await;
    ingest_fixture(&test_db).await;
    let mut rollup = WeeklyRollup::new(&test_db.pgconf).await.unwrap();

    // Weeks of Feb 26 and Mar 4, the week of Mar 11 is not complete yet
    assert_eq!(rollup.run_pending().await.unwrap(), 2);
    assert_eq!(rollup.run_pending().await.unwrap(), 0);
    assert_eq!(test_db.count("weekly_summary").await, 2);

    let qry = "
        select week_end
            , snapshot_count
            , new_entries
            , dropouts
            , net_flow
            , top_accumulator
            , top_accumulator_change
            , top_distributor
            , top_distributor_change
        from whales.weekly_summary
        where week_start = $1;";
    let row = test_db
        .client
        .query_one(qry, &[&date!(2024 - 03 - 04)])
        .await
        .unwrap();
    assert_eq!(row.get::<_, time::Date>(0), date!(2024 - 03 - 10));
    assert_eq!(row.get::<_, i32>(1), 3);
    assert_eq!(row.get::<_, i32>(2), 2);
    assert_eq!(row.get::<_, i32>(3), 2);
    assert_eq!(row.get::<_, Decimal>(4), Decimal::ZERO);
    assert_eq!(row.get::<_, String>(5), "b");
    assert_eq!(row.get::<_, Decimal>(6), Decimal::from(60));
    assert_eq!(row.get::<_, String>(7), "a");
    assert_eq!(row.get::<_, Decimal>(8), Decimal::from(-80));
}

#[tokio::test]
async fn test_rollup_is_idempotent() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("weekly_idempotent").await;
    ingest_fixture(&test_db).await;
    let mut rollup = WeeklyRollup::new(&test_db.pgconf).await.unwrap();

    // Any date of the week will do
    let first = rollup.run_week(date!(2024 - 03 - 06)).await.unwrap().unwrap();
    let second = rollup.run_week(date!(2024 - 03 - 10)).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.week_start, date!(2024 - 03 - 04));
    assert_eq!(test_db.count("weekly_summary").await, 1);

    // Explicit recomputation of an incomplete week is allowed
    let current = rollup.run_week(date!(2024 - 03 - 11)).await.unwrap().unwrap();
    assert_eq!(current.snapshot_count, 1);

    // Weeks without snapshots are not written
    assert!(rollup.run_week(date!(2023 - 01 - 02)).await.unwrap().is_none());
    assert_eq!(test_db.count("weekly_summary").await, 2);
}
