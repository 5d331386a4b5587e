use tokio_postgres::Client;
use tokio_postgres::GenericClient;

use super::parsing::ParserCache;
use super::types::Batch;
use super::types::IngestOutcome;
use super::types::RawSnapshot;
use super::types::SnapshotView;
use crate::config::PostgresConfig;
use crate::core::types::Chain;
use crate::core::types::SnapshotID;
use crate::core::types::SnapshotKey;
use crate::error::Result;
use crate::framework::store as pg;

mod daily;
mod entries;
mod metrics;
mod snapshots;

pub(super) struct Store {
    client: Client,
}

impl Store {
    pub async fn new(pgconf: &PostgresConfig) -> Result<Self> {
        let client = pg::connect_and_init(pgconf, false).await?;
        Ok(Self { client })
    }

    /// Returns true if a snapshot with given key is stored already.
    pub async fn contains(&self, key: &SnapshotKey) -> Result<bool> {
        snapshots::exists(&self.client, key).await
    }

    /// Load everything needed to parse given snapshot.
    pub async fn load_parser_cache(&self, raw: &RawSnapshot) -> Result<ParserCache> {
        let key = raw.key();
        let previous = match snapshots::get_previous(&self.client, &key).await? {
            Some(header) => Some(load_view(&self.client, header).await?),
            None => None,
        };
        let day_baseline = match snapshots::get_day_baseline(&self.client, &key).await? {
            // Often the same snapshot as the previous one
            Some(header) if previous.as_ref().map(|p| p.id) == Some(header.id) => previous.clone(),
            Some(header) => Some(load_view(&self.client, header).await?),
            None => None,
        };
        let histories = entries::get_histories(&self.client, &key, &raw.addresses()).await?;
        Ok(ParserCache {
            previous,
            day_baseline,
            histories,
        })
    }

    /// Persist a new snapshot and everything derived from it.
    ///
    /// Losing a race against a concurrent ingestion of the same snapshot
    /// is not an error.
    pub async fn persist(&mut self, batch: &Batch) -> Result<IngestOutcome> {
        let pgtx = self.client.transaction().await?;
        let id = match snapshots::insert(&pgtx, &batch.snapshot).await {
            Ok(id) => id,
            Err(e) if e.is_unique_violation() => {
                tracing::warn!("snapshot {} got stored concurrently", batch.snapshot.key);
                pgtx.rollback().await?;
                return Ok(IngestOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };
        entries::insert_many(&pgtx, id, &batch.entries).await?;
        metrics::upsert(&pgtx, id, &batch.snapshot.key, &batch.metrics).await?;
        if let Some(summary) = &batch.daily_summary {
            daily::upsert(&pgtx, summary).await?;
        }
        pgtx.commit().await?;
        Ok(IngestOutcome::Ingested(id))
    }

    /// All stored snapshots of a chain, oldest first.
    pub async fn load_chain(&self, chain: Chain) -> Result<Vec<(SnapshotID, RawSnapshot)>> {
        snapshots::get_chain(&self.client, chain).await
    }

    /// Replace derived data of replayed snapshots, in a single transaction.
    pub async fn replace_many(&mut self, batches: &[(SnapshotID, Batch)]) -> Result<()> {
        let pgtx = self.client.transaction().await?;
        for (id, batch) in batches {
            snapshots::update_totals(&pgtx, *id, &batch.snapshot).await?;
            entries::delete_for(&pgtx, *id).await?;
            entries::insert_many(&pgtx, *id, &batch.entries).await?;
            metrics::upsert(&pgtx, *id, &batch.snapshot.key, &batch.metrics).await?;
            if let Some(summary) = &batch.daily_summary {
                daily::upsert(&pgtx, summary).await?;
            }
        }
        pgtx.commit().await?;
        Ok(())
    }
}

async fn load_view(client: &impl GenericClient, header: snapshots::Header) -> Result<SnapshotView> {
    Ok(SnapshotView {
        id: header.id,
        total_balance: header.total_balance,
        balances: entries::get_balances(client, header.id).await?,
    })
}
