mod common;
mod db_utils;

use rust_decimal::Decimal;
use time::macros::date;

use common::set_tracing_subscriber;
use common::snapshot;
use db_utils::TestDB;
use ela_whales::core::types::Chain;
use ela_whales::workers::snapshots::IngestOutcome;
use ela_whales::workers::snapshots::Ingestor;
use ela_whales::Error;

#[derive(Debug, PartialEq)]
struct StoredEntry {
    rank: i32,
    prev_rank: Option<i32>,
    rank_change: Option<i32>,
    balance_change: Option<Decimal>,
    rank_streak: Option<i32>,
    trend: String,
}

async fn get_entry(test_db: &TestDB, day: time::Date, chain: Chain, address: &str) -> StoredEntry {
    let qry = "
        select e.rank
            , e.prev_rank
            , e.rank_change
            , e.balance_change
            , e.rank_streak
            , e.balance_trend::text
        from whales.snapshot_entries e
        join whales.snapshots s on s.id = e.snapshot_id
        where s.date = $1
            and s.chain = $2
            and e.address = $3;";
    let row = test_db
        .client
        .query_one(qry, &[&day, &chain.as_str(), &address])
        .await
        .unwrap();
    StoredEntry {
        rank: row.get(0),
        prev_rank: row.get(1),
        rank_change: row.get(2),
        balance_change: row.get(3),
        rank_streak: row.get(4),
        trend: row.get(5),
    }
}

async fn get_net_flow(test_db: &TestDB, day: time::Date, chain: Chain) -> Option<Decimal> {
    let qry = "
        select net_flow
        from whales.concentration_metrics
        where date = $1 and chain = $2;";
    test_db
        .client
        .query_one(qry, &[&day, &chain.as_str()])
        .await
        .unwrap()
        .get(0)
}

#[tokio::test]
async fn test_double_ingestion_is_skipped() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("ingest_double").await;
    let mut ingestor = Ingestor::new(&test_db.pgconf).await.unwrap();

    let raw = snapshot(
        date!(2024 - 03 - 01),
        "08:00",
        Chain::Mainchain,
        &[("a", 300), ("b", 200), ("c", 100)],
    );
    let first = ingestor.ingest(&raw).await.unwrap();
    assert!(matches!(first, IngestOutcome::Ingested(_)));
    let second = ingestor.ingest(&raw).await.unwrap();
    assert_eq!(second, IngestOutcome::Skipped);

    assert_eq!(test_db.count("snapshots").await, 1);
    assert_eq!(test_db.count("snapshot_entries").await, 3);
    assert_eq!(test_db.count("concentration_metrics").await, 1);
    assert_eq!(test_db.count("daily_summary").await, 1);
}

#[tokio::test]
async fn test_concurrent_ingestion_loser_is_skipped() {
    let _guard = set_tracing_subscriber(false);
    let mut test_db = TestDB::new("ingest_concurrent").await;
    let mut ingestor = Ingestor::new(&test_db.pgconf).await.unwrap();

    let day = date!(2024 - 03 - 01);
    let raw = snapshot(day, "08:00", Chain::Mainchain, &[("a", 300), ("b", 200)]);

    // Competing writer holds the same key in an open transaction
    let pgtx = test_db.client.transaction().await.unwrap();
    pgtx.execute(
        "insert into whales.snapshots (date, time_slot, chain, fetched_at, total_balance, entry_count)
        values ($1, '08:00', 'mainchain', now(), 0, 0);",
        &[&day],
    )
    .await
    .unwrap();

    // Uncommitted row is invisible, so the ingestor gets past its existence check
    let handle = tokio::spawn(async move { ingestor.ingest(&raw).await });

    // Wait until the ingestor blocks on the unique index
    let qry = "
        select count(*)
        from pg_stat_activity
        where datname = current_database()
            and wait_event_type = 'Lock'
            and pid <> pg_backend_pid();";
    let mut waiting = 0i64;
    for _ in 0..100 {
        waiting = pgtx.query_one(qry, &[]).await.unwrap().get(0);
        if waiting > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(waiting, 1);
    pgtx.commit().await.unwrap();

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);

    // Loser rolled back everything
    assert_eq!(test_db.count("snapshots").await, 1);
    assert_eq!(test_db.count("snapshot_entries").await, 0);
    assert_eq!(test_db.count("concentration_metrics").await, 0);
    assert_eq!(test_db.count("daily_summary").await, 0);
}

#[tokio::test]
async fn test_duplicate_key_is_unique_violation() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("ingest_unique").await;
    Ingestor::new(&test_db.pgconf).await.unwrap();

    let stmt = "
        insert into whales.snapshots (date, time_slot, chain, fetched_at, total_balance, entry_count)
        values ($1, '08:00', $2, now(), 0, 0);";
    let day = date!(2024 - 03 - 01);
    test_db
        .client
        .execute(stmt, &[&day, &Chain::Mainchain.as_str()])
        .await
        .unwrap();
    // Other chain is fine
    test_db
        .client
        .execute(stmt, &[&day, &Chain::Esc.as_str()])
        .await
        .unwrap();

    let err: Error = test_db
        .client
        .execute(stmt, &[&day, &Chain::Mainchain.as_str()])
        .await
        .unwrap_err()
        .into();
    assert!(err.is_unique_violation());
    assert!(!Error::InvalidInput("x".to_owned()).is_unique_violation());
}

#[tokio::test]
async fn test_invalid_snapshot_stores_nothing() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("ingest_invalid").await;
    let mut ingestor = Ingestor::new(&test_db.pgconf).await.unwrap();

    let raw = snapshot(
        date!(2024 - 03 - 01),
        "08:00",
        Chain::Mainchain,
        &[("a", 300), ("a", 200)],
    );
    let res = ingestor.ingest(&raw).await;
    assert!(matches!(res, Err(Error::InvalidSnapshot(_))));
    assert_eq!(test_db.count("snapshots").await, 0);
}

#[tokio::test]
async fn test_history_is_chain_scoped() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("ingest_chains").await;
    let mut ingestor = Ingestor::new(&test_db.pgconf).await.unwrap();

    let day1 = date!(2024 - 03 - 01);
    let day2 = date!(2024 - 03 - 02);
    for raw in [
        snapshot(day1, "08:00", Chain::Mainchain, &[("a", 300), ("b", 200)]),
        // Same date and slot on another chain is a different snapshot
        snapshot(day1, "08:00", Chain::Esc, &[("a", 50), ("x", 40)]),
        snapshot(day2, "08:00", Chain::Mainchain, &[("a", 150), ("b", 250)]),
    ] {
        let outcome = ingestor.ingest(&raw).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Ingested(_)));
    }

    let a = get_entry(&test_db, day2, Chain::Mainchain, "a").await;
    assert_eq!(
        a,
        StoredEntry {
            rank: 2,
            prev_rank: Some(1),
            rank_change: Some(-1),
            balance_change: Some(Decimal::from(-150)),
            rank_streak: Some(-1),
            trend: "distributing".to_owned(),
        }
    );
    let b = get_entry(&test_db, day2, Chain::Mainchain, "b").await;
    assert_eq!(b.rank_change, Some(1));
    assert_eq!(b.trend, "accumulating");

    // Esc entries have no main chain history
    let esc_a = get_entry(&test_db, day1, Chain::Esc, "a").await;
    assert_eq!(esc_a.prev_rank, None);
    assert_eq!(esc_a.trend, "holding");
    assert_eq!(get_net_flow(&test_db, day1, Chain::Esc).await, None);
    assert_eq!(
        get_net_flow(&test_db, day2, Chain::Mainchain).await,
        Some(Decimal::from(-100))
    );

    // Daily summaries are for the main chain only
    assert_eq!(test_db.count("daily_summary").await, 2);
}

#[tokio::test]
async fn test_backfill_repairs_out_of_order_ingestion() {
    let _guard = set_tracing_subscriber(false);
    let test_db = TestDB::new("ingest_backfill").await;
    let mut ingestor = Ingestor::new(&test_db.pgconf).await.unwrap();

    let day1 = date!(2024 - 03 - 01);
    let day2 = date!(2024 - 03 - 02);
    let early = snapshot(day1, "08:00", Chain::Mainchain, &[("a", 300), ("b", 200)]);
    let late = snapshot(day2, "08:00", Chain::Mainchain, &[("a", 100), ("b", 250)]);

    // Later snapshot first, so it gets no history
    ingestor.ingest(&late).await.unwrap();
    ingestor.ingest(&early).await.unwrap();
    assert_eq!(
        get_entry(&test_db, day2, Chain::Mainchain, "b").await.prev_rank,
        None
    );

    let n = ingestor.backfill(Chain::Mainchain).await.unwrap();
    assert_eq!(n, 2);

    let b = get_entry(&test_db, day2, Chain::Mainchain, "b").await;
    assert_eq!(b.prev_rank, Some(2));
    assert_eq!(b.rank_change, Some(1));
    assert_eq!(b.balance_change, Some(Decimal::from(50)));
    assert_eq!(
        get_net_flow(&test_db, day2, Chain::Mainchain).await,
        Some(Decimal::from(-150))
    );
    assert_eq!(test_db.count("snapshot_entries").await, 4);

    // Nothing to replay on other chains
    assert_eq!(ingestor.backfill(Chain::Esc).await.unwrap(), 0);
}
