use std::collections::HashMap;
use tokio_postgres::GenericClient;
use tokio_postgres::Transaction;

use super::super::types::EntryRecord;
use super::super::types::HistoryPoint;
use crate::constants::HISTORY_WINDOW;
use crate::core::types::Address;
use crate::core::types::Balance;
use crate::core::types::SnapshotID;
use crate::core::types::SnapshotKey;
use crate::error::Result;

/// Balances by address of given snapshot.
pub(super) async fn get_balances(
    client: &impl GenericClient,
    snapshot_id: SnapshotID,
) -> Result<HashMap<Address, Balance>> {
    tracing::trace!("get_balances {snapshot_id}");
    let qry = "
        select address
            , balance
        from whales.snapshot_entries
        where snapshot_id = $1;";
    Ok(client
        .query(qry, &[&snapshot_id])
        .await?
        .iter()
        .map(|r| (r.get(0), r.get(1)))
        .collect())
}

/// Prior entries of given addresses, oldest first.
///
/// Only entries of snapshots of the key's chain taken before the key count.
/// Limited to the last `HISTORY_WINDOW - 1` entries per address.
pub(super) async fn get_histories(
    client: &impl GenericClient,
    key: &SnapshotKey,
    addresses: &Vec<Address>,
) -> Result<HashMap<Address, Vec<HistoryPoint>>> {
    tracing::trace!("get_histories {key}");
    let qry = "
        select address
            , rank
            , balance
            , rank_streak
            , balance_streak
        from (
            select e.address
                , e.rank
                , e.balance
                , e.rank_streak
                , e.balance_streak
                , s.date
                , s.time_slot
                , row_number() over (
                    partition by e.address
                    order by s.date desc, s.time_slot desc
                ) as rn
            from whales.snapshot_entries e
            join whales.snapshots s on s.id = e.snapshot_id
            where s.chain = $1
                and (s.date, s.time_slot) < ($2, $3)
                and e.address = any($4)
        ) h
        where rn < $5
        order by address, date, time_slot;";
    let rows = client
        .query(
            qry,
            &[
                &key.chain.as_str(),
                &key.date,
                &key.time_slot.as_str(),
                addresses,
                &(HISTORY_WINDOW as i64),
            ],
        )
        .await?;
    let mut histories: HashMap<Address, Vec<HistoryPoint>> = HashMap::new();
    for r in rows {
        histories.entry(r.get(0)).or_default().push(HistoryPoint {
            rank: r.get(1),
            balance: r.get(2),
            rank_streak: r.get(3),
            balance_streak: r.get(4),
        });
    }
    Ok(histories)
}

/// Insert annotated entries of a snapshot.
pub(super) async fn insert_many(
    pgtx: &Transaction<'_>,
    snapshot_id: SnapshotID,
    records: &[EntryRecord],
) -> Result<()> {
    tracing::trace!("insert_many {snapshot_id} ({} entries)", records.len());
    let sql = "
        insert into whales.snapshot_entries (
            snapshot_id,
            rank,
            address,
            balance,
            percentage,
            prev_rank,
            rank_change,
            balance_change,
            rank_volatility,
            balance_trend,
            rank_streak,
            balance_streak
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);";
    // Untyped so the server resolves the trend enum
    let stmt = pgtx.prepare(sql).await?;
    for r in records {
        pgtx.execute(
            &stmt,
            &[
                &snapshot_id,
                &r.rank,
                &r.address,
                &r.balance,
                &r.percentage,
                &r.prev_rank,
                &r.rank_change,
                &r.balance_change,
                &r.rank_volatility,
                &r.balance_trend,
                &r.rank_streak,
                &r.balance_streak,
            ],
        )
        .await?;
    }
    Ok(())
}

/// Delete all entries of a snapshot.
pub(super) async fn delete_for(pgtx: &Transaction<'_>, snapshot_id: SnapshotID) -> Result<()> {
    tracing::trace!("delete_for {snapshot_id}");
    pgtx.execute(
        "delete from whales.snapshot_entries where snapshot_id = $1;",
        &[&snapshot_id],
    )
    .await?;
    Ok(())
}
