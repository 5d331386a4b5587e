use std::collections::HashMap;
use tokio_postgres::GenericClient;
use tokio_postgres::Transaction;

use super::types::WeekData;
use super::types::WeekEntry;
use super::types::WeekSnapshot;
use super::types::WeeklySummaryRecord;
use crate::constants::ROLLUP_CHAIN;
use crate::core::types::Address;
use crate::core::types::SnapshotID;
use crate::error::Result;
use crate::utils::week_end;

/// Mondays of complete weeks without a summary, oldest first.
///
/// A week is complete once a snapshot dated after its Sunday exists.
pub(super) async fn get_pending_weeks(client: &impl GenericClient) -> Result<Vec<time::Date>> {
    tracing::trace!("get_pending_weeks");
    let qry = "
        with weeks as (
            select distinct date_trunc('week', date)::date as week_start
            from whales.snapshots
            where chain = $1
        )
        select w.week_start
        from weeks w
        where exists (
                select *
                from whales.snapshots s
                where s.chain = $1
                    and s.date > w.week_start + 6
            )
            and not exists (
                select *
                from whales.weekly_summary ws
                where ws.week_start = w.week_start
            )
        order by 1;";
    Ok(client
        .query(qry, &[&ROLLUP_CHAIN.as_str()])
        .await?
        .iter()
        .map(|r| r.get(0))
        .collect())
}

/// Snapshots, metrics and entries of the week starting on given Monday.
pub(super) async fn get_week(client: &impl GenericClient, week_start: &time::Date) -> Result<WeekData> {
    tracing::trace!("get_week {week_start}");
    let week_end = week_end(week_start);
    let chain = ROLLUP_CHAIN.as_str();

    let qry = "
        select s.id
            , s.total_balance
            , m.gini
            , m.net_flow
            , m.whale_activity_index
        from whales.snapshots s
        join whales.concentration_metrics m on m.snapshot_id = s.id
        where s.chain = $1
            and s.date >= $2
            and s.date <= $3
        order by s.date, s.time_slot;";
    let mut snapshots: Vec<WeekSnapshot> = client
        .query(qry, &[&chain, week_start, &week_end])
        .await?
        .iter()
        .map(|r| WeekSnapshot {
            id: r.get(0),
            total_balance: r.get(1),
            gini: r.get(2),
            net_flow: r.get(3),
            whale_activity_index: r.get(4),
            entries: vec![],
        })
        .collect();

    let ids: Vec<SnapshotID> = snapshots.iter().map(|s| s.id).collect();
    let qry = "
        select snapshot_id
            , address
            , balance_change
            , rank_volatility
        from whales.snapshot_entries
        where snapshot_id = any($1)
        order by snapshot_id, rank;";
    let mut entries: HashMap<SnapshotID, Vec<WeekEntry>> = HashMap::new();
    for r in client.query(qry, &[&ids]).await? {
        entries.entry(r.get(0)).or_default().push(WeekEntry {
            address: r.get(1),
            balance_change: r.get(2),
            rank_volatility: r.get(3),
        });
    }
    for snapshot in snapshots.iter_mut() {
        snapshot.entries = entries.remove(&snapshot.id).unwrap_or_default();
    }

    let qry = "
        select e.address
        from whales.snapshot_entries e
        where e.snapshot_id = (
            select id
            from whales.snapshots
            where chain = $1
                and date < $2
            order by date desc, time_slot desc
            limit 1
        );";
    let before: Vec<Address> = client
        .query(qry, &[&chain, week_start])
        .await?
        .iter()
        .map(|r| r.get(0))
        .collect();
    // An empty result means no snapshot, stored snapshots always have entries
    let before = if before.is_empty() { None } else { Some(before) };

    Ok(WeekData { snapshots, before })
}

/// Insert or replace the summary of a week.
pub(super) async fn upsert(pgtx: &Transaction<'_>, rec: &WeeklySummaryRecord) -> Result<()> {
    tracing::trace!("upsert {}", rec.week_start);
    let stmt = "
        insert into whales.weekly_summary (
            week_start,
            week_end,
            gini_start,
            gini_end,
            gini_change,
            total_balance_start,
            total_balance_end,
            net_flow,
            avg_whale_activity,
            new_entries,
            dropouts,
            top_accumulator,
            top_accumulator_change,
            top_distributor,
            top_distributor_change,
            avg_rank_volatility,
            snapshot_count
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        on conflict (week_start) do update
        set week_end = EXCLUDED.week_end
            , gini_start = EXCLUDED.gini_start
            , gini_end = EXCLUDED.gini_end
            , gini_change = EXCLUDED.gini_change
            , total_balance_start = EXCLUDED.total_balance_start
            , total_balance_end = EXCLUDED.total_balance_end
            , net_flow = EXCLUDED.net_flow
            , avg_whale_activity = EXCLUDED.avg_whale_activity
            , new_entries = EXCLUDED.new_entries
            , dropouts = EXCLUDED.dropouts
            , top_accumulator = EXCLUDED.top_accumulator
            , top_accumulator_change = EXCLUDED.top_accumulator_change
            , top_distributor = EXCLUDED.top_distributor
            , top_distributor_change = EXCLUDED.top_distributor_change
            , avg_rank_volatility = EXCLUDED.avg_rank_volatility
            , snapshot_count = EXCLUDED.snapshot_count
        ;";
    let acc = rec.top_accumulator.as_ref();
    let dis = rec.top_distributor.as_ref();
    pgtx.execute(
        stmt,
        &[
            &rec.week_start,
            &rec.week_end,
            &rec.gini_start,
            &rec.gini_end,
            &rec.gini_change,
            &rec.total_balance_start,
            &rec.total_balance_end,
            &rec.net_flow,
            &rec.avg_whale_activity,
            &rec.new_entries,
            &rec.dropouts,
            &acc.map(|a| a.address.as_str()),
            &acc.map(|a| a.change),
            &dis.map(|d| d.address.as_str()),
            &dis.map(|d| d.change),
            &rec.avg_rank_volatility,
            &rec.snapshot_count,
        ],
    )
    .await?;
    Ok(())
}
