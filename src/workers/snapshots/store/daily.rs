use tokio_postgres::Transaction;

use super::super::types::DailySummaryRecord;
use crate::error::Result;

/// Insert or replace the summary of a date.
pub(super) async fn upsert(pgtx: &Transaction<'_>, rec: &DailySummaryRecord) -> Result<()> {
    tracing::trace!("upsert {}", rec.date);
    let stmt = "
        insert into whales.daily_summary (
            date,
            new_entries,
            dropouts,
            biggest_gainer_address,
            biggest_gainer_change,
            biggest_loser_address,
            biggest_loser_change
        ) values ($1, $2, $3, $4, $5, $6, $7)
        on conflict (date) do update
        set new_entries = EXCLUDED.new_entries
            , dropouts = EXCLUDED.dropouts
            , biggest_gainer_address = EXCLUDED.biggest_gainer_address
            , biggest_gainer_change = EXCLUDED.biggest_gainer_change
            , biggest_loser_address = EXCLUDED.biggest_loser_address
            , biggest_loser_change = EXCLUDED.biggest_loser_change
        ;";
    let gainer = rec.biggest_gainer.as_ref();
    let loser = rec.biggest_loser.as_ref();
    pgtx.execute(
        stmt,
        &[
            &rec.date,
            &rec.new_entries,
            &rec.dropouts,
            &gainer.map(|g| g.address.as_str()),
            &gainer.map(|g| g.change),
            &loser.map(|l| l.address.as_str()),
            &loser.map(|l| l.change),
        ],
    )
    .await?;
    Ok(())
}
