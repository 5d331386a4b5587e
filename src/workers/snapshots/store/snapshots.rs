use std::collections::HashMap;
use tokio_postgres::GenericClient;
use tokio_postgres::Transaction;

use super::super::types::RawHolder;
use super::super::types::RawSnapshot;
use super::super::types::SnapshotRecord;
use crate::core::types::Balance;
use crate::core::types::Chain;
use crate::core::types::SnapshotID;
use crate::core::types::SnapshotKey;
use crate::core::types::TimeSlot;
use crate::error::Result;

/// Minimal description of a stored snapshot.
pub(super) struct Header {
    pub id: SnapshotID,
    pub total_balance: Balance,
}

/// Returns true if a snapshot with given key is stored already.
pub(super) async fn exists(client: &impl GenericClient, key: &SnapshotKey) -> Result<bool> {
    tracing::trace!("exists {key}");
    let qry = "
        select exists(
            select *
            from whales.snapshots
            where date = $1
                and time_slot = $2
                and chain = $3
        );";
    let row = client
        .query_one(qry, &[&key.date, &key.time_slot.as_str(), &key.chain.as_str()])
        .await?;
    Ok(row.get(0))
}

/// Latest snapshot of the key's chain strictly before the key.
pub(super) async fn get_previous(
    client: &impl GenericClient,
    key: &SnapshotKey,
) -> Result<Option<Header>> {
    tracing::trace!("get_previous {key}");
    let qry = "
        select id
            , total_balance
        from whales.snapshots
        where chain = $1
            and (date, time_slot) < ($2, $3)
        order by date desc, time_slot desc
        limit 1;";
    let row = client
        .query_opt(qry, &[&key.chain.as_str(), &key.date, &key.time_slot.as_str()])
        .await?;
    Ok(row.map(|r| Header {
        id: r.get(0),
        total_balance: r.get(1),
    }))
}

/// Latest snapshot of the key's chain dated before the key's date.
pub(super) async fn get_day_baseline(
    client: &impl GenericClient,
    key: &SnapshotKey,
) -> Result<Option<Header>> {
    tracing::trace!("get_day_baseline {key}");
    let qry = "
        select id
            , total_balance
        from whales.snapshots
        where chain = $1
            and date < $2
        order by date desc, time_slot desc
        limit 1;";
    let row = client
        .query_opt(qry, &[&key.chain.as_str(), &key.date])
        .await?;
    Ok(row.map(|r| Header {
        id: r.get(0),
        total_balance: r.get(1),
    }))
}

/// Insert a snapshot and return its id.
pub(super) async fn insert(pgtx: &Transaction<'_>, rec: &SnapshotRecord) -> Result<SnapshotID> {
    tracing::trace!("insert {}", rec.key);
    let stmt = "
        insert into whales.snapshots (
            date,
            time_slot,
            chain,
            fetched_at,
            total_balance,
            entry_count
        ) values ($1, $2, $3, $4, $5, $6)
        returning id;";
    let row = pgtx
        .query_one(
            stmt,
            &[
                &rec.key.date,
                &rec.key.time_slot.as_str(),
                &rec.key.chain.as_str(),
                &rec.fetched_at,
                &rec.total_balance,
                &rec.entry_count,
            ],
        )
        .await?;
    Ok(row.get(0))
}

/// Refresh the totals of a replayed snapshot.
pub(super) async fn update_totals(
    pgtx: &Transaction<'_>,
    id: SnapshotID,
    rec: &SnapshotRecord,
) -> Result<()> {
    tracing::trace!("update_totals {id}");
    let stmt = "
        update whales.snapshots
        set total_balance = $2
            , entry_count = $3
        where id = $1;";
    pgtx.execute(stmt, &[&id, &rec.total_balance, &rec.entry_count])
        .await?;
    Ok(())
}

/// Rebuild all snapshots of a chain from their entries, in chronological order.
pub(super) async fn get_chain(
    client: &impl GenericClient,
    chain: Chain,
) -> Result<Vec<(SnapshotID, RawSnapshot)>> {
    tracing::trace!("get_chain {chain}");
    let qry = "
        select id
            , date
            , time_slot
            , fetched_at
        from whales.snapshots
        where chain = $1
        order by date, time_slot;";
    let rows = client.query(qry, &[&chain.as_str()]).await?;

    let qry = "
        select e.snapshot_id
            , e.address
            , e.balance
        from whales.snapshot_entries e
        join whales.snapshots s on s.id = e.snapshot_id
        where s.chain = $1
        order by e.snapshot_id, e.rank;";
    let mut holders: HashMap<SnapshotID, Vec<RawHolder>> = HashMap::new();
    for r in client.query(qry, &[&chain.as_str()]).await? {
        holders.entry(r.get(0)).or_default().push(RawHolder {
            address: r.get(1),
            balance: r.get(2),
        });
    }

    let mut snapshots = Vec::with_capacity(rows.len());
    for r in rows {
        let id: SnapshotID = r.get(0);
        let time_slot: String = r.get(2);
        snapshots.push((
            id,
            RawSnapshot {
                date: r.get(1),
                time_slot: TimeSlot::try_from(time_slot)?,
                chain,
                fetched_at: r.get(3),
                holders: holders.remove(&id).unwrap_or_default(),
            },
        ));
    }
    Ok(snapshots)
}
