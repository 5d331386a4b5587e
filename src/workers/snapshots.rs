//! Snapshot ingestion.
//!
//! Ranks the holders of a raw snapshot, annotates each entry against the
//! address's history, derives concentration and flow metrics and, for the
//! roll-up chain, the daily summary. Everything is stored in one go.
mod parsing;
mod store;
pub mod types;

use crate::config::PostgresConfig;
use crate::core::types::Chain;
use crate::error::Result;
use parsing::Parser;
use parsing::Replay;
use store::Store;
pub use types::IngestOutcome;
pub use types::RawHolder;
pub use types::RawSnapshot;

pub struct Ingestor {
    store: Store,
}

impl Ingestor {
    pub async fn new(pgconf: &PostgresConfig) -> Result<Self> {
        Ok(Self {
            store: Store::new(pgconf).await?,
        })
    }

    /// Ingest a raw snapshot.
    ///
    /// Returns `IngestOutcome::Skipped` if the snapshot is stored already.
    pub async fn ingest(&mut self, raw: &RawSnapshot) -> Result<IngestOutcome> {
        let key = raw.key();
        if self.store.contains(&key).await? {
            tracing::warn!("snapshot {key} exists already, skipping");
            return Ok(IngestOutcome::Skipped);
        }
        tracing::debug!("ingesting snapshot {key} ({} holders)", raw.holders.len());
        let cache = self.store.load_parser_cache(raw).await?;
        let batch = Parser::new(cache).extract_batch(raw)?;
        let outcome = self.store.persist(&batch).await?;
        if let IngestOutcome::Ingested(id) = outcome {
            tracing::info!(
                "ingested snapshot {key} as {id} - gini: {:.4}, net flow: {:?}",
                batch.metrics.gini,
                batch.metrics.net_flow
            );
        }
        Ok(outcome)
    }

    /// Recompute annotations, metrics and daily summaries of all snapshots of a chain.
    ///
    /// Returns the number of replayed snapshots.
    pub async fn backfill(&mut self, chain: Chain) -> Result<usize> {
        let snapshots = self.store.load_chain(chain).await?;
        tracing::info!("replaying {} {chain} snapshots", snapshots.len());
        let mut replay = Replay::new();
        let mut batches = Vec::with_capacity(snapshots.len());
        for (id, raw) in &snapshots {
            let batch = Parser::new(replay.cache_for(raw)).extract_batch(raw)?;
            replay.push(*id, &batch);
            batches.push((*id, batch));
        }
        self.store.replace_many(&batches).await?;
        tracing::info!("backfilled {} {chain} snapshots", batches.len());
        Ok(batches.len())
    }
}
