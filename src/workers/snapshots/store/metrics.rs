use tokio_postgres::Transaction;

use super::super::types::MetricsRecord;
use crate::core::types::SnapshotID;
use crate::core::types::SnapshotKey;
use crate::error::Result;

/// Insert or replace the metrics of a snapshot.
pub(super) async fn upsert(
    pgtx: &Transaction<'_>,
    snapshot_id: SnapshotID,
    key: &SnapshotKey,
    rec: &MetricsRecord,
) -> Result<()> {
    tracing::trace!("upsert {snapshot_id}");
    let stmt = "
        insert into whales.concentration_metrics (
            snapshot_id,
            chain,
            date,
            time_slot,
            gini,
            hhi,
            top10_pct,
            top20_pct,
            top50_pct,
            net_flow,
            total_inflow,
            total_outflow,
            whale_activity_index,
            active_wallets,
            avg_rank_change,
            avg_balance_change_pct,
            new_entry_count,
            dropout_count
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        on conflict (snapshot_id) do update
        set gini = EXCLUDED.gini
            , hhi = EXCLUDED.hhi
            , top10_pct = EXCLUDED.top10_pct
            , top20_pct = EXCLUDED.top20_pct
            , top50_pct = EXCLUDED.top50_pct
            , net_flow = EXCLUDED.net_flow
            , total_inflow = EXCLUDED.total_inflow
            , total_outflow = EXCLUDED.total_outflow
            , whale_activity_index = EXCLUDED.whale_activity_index
            , active_wallets = EXCLUDED.active_wallets
            , avg_rank_change = EXCLUDED.avg_rank_change
            , avg_balance_change_pct = EXCLUDED.avg_balance_change_pct
            , new_entry_count = EXCLUDED.new_entry_count
            , dropout_count = EXCLUDED.dropout_count
        ;";
    pgtx.execute(
        stmt,
        &[
            &snapshot_id,
            &key.chain.as_str(),
            &key.date,
            &key.time_slot.as_str(),
            &rec.gini,
            &rec.hhi,
            &rec.top10_pct,
            &rec.top20_pct,
            &rec.top50_pct,
            &rec.net_flow,
            &rec.total_inflow,
            &rec.total_outflow,
            &rec.whale_activity_index,
            &rec.active_wallets,
            &rec.avg_rank_change,
            &rec.avg_balance_change_pct,
            &rec.new_entry_count,
            &rec.dropout_count,
        ],
    )
    .await?;
    Ok(())
}
