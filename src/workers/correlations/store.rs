use tokio_postgres::GenericClient;
use tokio_postgres::Transaction;

use super::types::BalanceSeries;
use super::types::CorrelationRecord;
use crate::constants::ROLLUP_CHAIN;
use crate::core::types::SnapshotID;
use crate::error::Result;

/// Id and date of the latest snapshot.
pub(super) async fn get_latest(
    client: &impl GenericClient,
) -> Result<Option<(SnapshotID, time::Date)>> {
    tracing::trace!("get_latest");
    let qry = "
        select id
            , date
        from whales.snapshots
        where chain = $1
        order by date desc, time_slot desc
        limit 1;";
    let row = client.query_opt(qry, &[&ROLLUP_CHAIN.as_str()]).await?;
    Ok(row.map(|r| (r.get(0), r.get(1))))
}

/// Balance series, within given dates, of the addresses in the `reference` snapshot.
pub(super) async fn get_series(
    client: &impl GenericClient,
    reference: SnapshotID,
    from: &time::Date,
    to: &time::Date,
) -> Result<BalanceSeries> {
    tracing::trace!("get_series {reference} {from} {to}");
    let qry = "
        select e.address
            , e.snapshot_id
            , e.balance
        from whales.snapshot_entries e
        join whales.snapshots s on s.id = e.snapshot_id
        where s.chain = $1
            and s.date >= $2
            and s.date <= $3
            and e.address in (
                select address
                from whales.snapshot_entries
                where snapshot_id = $4
            );";
    let mut series = BalanceSeries::new();
    for r in client
        .query(qry, &[&ROLLUP_CHAIN.as_str(), from, to, &reference])
        .await?
    {
        series
            .entry(r.get(0))
            .or_default()
            .insert(r.get(1), r.get(2));
    }
    Ok(series)
}

/// Replace all correlations of a period.
pub(super) async fn replace(
    pgtx: &Transaction<'_>,
    period: &str,
    records: &[CorrelationRecord],
    computed_at: &time::OffsetDateTime,
) -> Result<()> {
    tracing::trace!("replace {period} ({} pairs)", records.len());
    pgtx.execute(
        "delete from whales.wallet_correlations where period = $1;",
        &[&period],
    )
    .await?;
    let sql = "
        insert into whales.wallet_correlations (
            address_a,
            address_b,
            period,
            correlation,
            data_points,
            computed_at
        ) values ($1, $2, $3, $4, $5, $6);";
    let stmt = pgtx.prepare(sql).await?;
    for r in records {
        pgtx.execute(
            &stmt,
            &[
                &r.address_a,
                &r.address_b,
                &period,
                &r.correlation,
                &r.data_points,
                computed_at,
            ],
        )
        .await?;
    }
    Ok(())
}
