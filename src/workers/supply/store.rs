use tokio_postgres::GenericClient;

use super::types::SupplyRecord;
use crate::core::types::Balance;
use crate::core::types::Chain;
use crate::core::types::TimeSlot;
use crate::error::Result;

/// Total balance of the snapshot of a chain at given date and time slot.
pub(super) async fn get_snapshot_total(
    client: &impl GenericClient,
    date: &time::Date,
    time_slot: &TimeSlot,
    chain: Chain,
) -> Result<Option<Balance>> {
    tracing::trace!("get_snapshot_total {date} {time_slot} {chain}");
    let qry = "
        select total_balance
        from whales.snapshots
        where date = $1
            and time_slot = $2
            and chain = $3;";
    let row = client
        .query_opt(qry, &[date, &time_slot.as_str(), &chain.as_str()])
        .await?;
    Ok(row.map(|r| r.get(0)))
}

/// Insert or replace the supply record of a date and time slot.
pub(super) async fn upsert(client: &impl GenericClient, rec: &SupplyRecord) -> Result<()> {
    tracing::trace!("upsert {} {}", rec.date, rec.time_slot);
    let stmt = "
        insert into whales.cross_chain_supply (
            date,
            time_slot,
            mainchain_top100,
            bridge_balance,
            esc_total_supply,
            esc_top100,
            eth_bridged_supply,
            fetched_at
        ) values ($1, $2, $3, $4, $5, $6, $7, $8)
        on conflict (date, time_slot) do update
        set mainchain_top100 = EXCLUDED.mainchain_top100
            , bridge_balance = EXCLUDED.bridge_balance
            , esc_total_supply = EXCLUDED.esc_total_supply
            , esc_top100 = EXCLUDED.esc_top100
            , eth_bridged_supply = EXCLUDED.eth_bridged_supply
            , fetched_at = EXCLUDED.fetched_at
        ;";
    client
        .execute(
            stmt,
            &[
                &rec.date,
                &rec.time_slot.as_str(),
                &rec.mainchain_top100,
                &rec.bridge_balance,
                &rec.esc_total_supply,
                &rec.esc_top100,
                &rec.eth_bridged_supply,
                &rec.fetched_at,
            ],
        )
        .await?;
    Ok(())
}

/// Latest supply records, newest first.
pub(super) async fn get_latest(client: &impl GenericClient, limit: i64) -> Result<Vec<SupplyRecord>> {
    tracing::trace!("get_latest {limit}");
    let qry = "
        select date
            , time_slot
            , mainchain_top100
            , bridge_balance
            , esc_total_supply
            , esc_top100
            , eth_bridged_supply
            , fetched_at
        from whales.cross_chain_supply
        order by date desc, time_slot desc
        limit $1;";
    let mut records = vec![];
    for r in client.query(qry, &[&limit]).await? {
        let time_slot: String = r.get(1);
        records.push(SupplyRecord {
            date: r.get(0),
            time_slot: TimeSlot::try_from(time_slot)?,
            mainchain_top100: r.get(2),
            bridge_balance: r.get(3),
            esc_total_supply: r.get(4),
            esc_top100: r.get(5),
            eth_bridged_supply: r.get(6),
            fetched_at: r.get(7),
        });
    }
    Ok(records)
}
