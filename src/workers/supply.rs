mod store;
pub mod types;

use tokio_postgres::Client;

use crate::config::PostgresConfig;
use crate::core::types::Balance;
use crate::core::types::Chain;
use crate::error::Result;
use crate::framework::store as pg;
use types::RawSupply;
use types::SupplyRecord;

/// Records cross-chain supply figures.
pub struct SupplyRecorder {
    client: Client,
}

impl SupplyRecorder {
    pub async fn new(pgconf: &PostgresConfig) -> Result<Self> {
        Ok(Self {
            client: pg::connect_and_init(pgconf, false).await?,
        })
    }

    /// Store supply figures, replacing any for the same date and time slot.
    pub async fn record(&self, raw: &RawSupply) -> Result<SupplyRecord> {
        let mainchain_total = match raw.mainchain_top100 {
            Some(_) => None,
            None => self.snapshot_total(raw, Chain::Mainchain).await?,
        };
        let esc_total = match raw.esc_top100 {
            Some(_) => None,
            None => self.snapshot_total(raw, Chain::Esc).await?,
        };
        let rec = SupplyRecord::new(raw, mainchain_total, esc_total);
        store::upsert(&self.client, &rec).await?;
        tracing::info!("recorded supply for {} {}", rec.date, rec.time_slot);
        Ok(rec)
    }

    /// Most recent supply records, newest first.
    pub async fn latest(&self, limit: i64) -> Result<Vec<SupplyRecord>> {
        store::get_latest(&self.client, limit).await
    }

    async fn snapshot_total(&self, raw: &RawSupply, chain: Chain) -> Result<Option<Balance>> {
        let total =
            store::get_snapshot_total(&self.client, &raw.date, &raw.time_slot, chain).await?;
        if total.is_none() {
            tracing::debug!("no {chain} snapshot for {} {}", raw.date, raw.time_slot);
        }
        Ok(total)
    }
}
