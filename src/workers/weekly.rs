mod parsing;
mod store;
pub mod types;

use async_trait::async_trait;
use tokio_postgres::Client;

use crate::config::PostgresConfig;
use crate::error::Result;
use crate::framework::store as pg;
use crate::framework::Job;
use crate::utils::week_start;
use types::WeeklySummaryRecord;

/// Weekly roll-up of the roll-up chain's snapshots.
pub struct WeeklyRollup {
    client: Client,
}

impl WeeklyRollup {
    pub async fn new(pgconf: &PostgresConfig) -> Result<Self> {
        Ok(Self {
            client: pg::connect_and_init(pgconf, false).await?,
        })
    }

    /// Summarize all complete weeks that have no summary yet.
    ///
    /// Returns the number of summarized weeks.
    pub async fn run_pending(&mut self) -> Result<usize> {
        let weeks = store::get_pending_weeks(&self.client).await?;
        tracing::debug!("{} pending weeks", weeks.len());
        let mut count = 0;
        for monday in weeks {
            if self.run_week(monday).await?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// (Re)compute the summary of the week containing `date`.
    ///
    /// Returns None, without writing anything, if the week has no snapshots.
    pub async fn run_week(&mut self, date: time::Date) -> Result<Option<WeeklySummaryRecord>> {
        let monday = week_start(&date);
        let pgtx = self.client.transaction().await?;
        let data = store::get_week(&pgtx, &monday).await?;
        let rec = match parsing::summarize(monday, &data) {
            Some(rec) => rec,
            None => {
                tracing::warn!("no snapshots in week of {monday}");
                return Ok(None);
            }
        };
        store::upsert(&pgtx, &rec).await?;
        pgtx.commit().await?;
        tracing::info!(
            "summarized week of {monday} - {} snapshots, gini change: {:.4}",
            rec.snapshot_count,
            rec.gini_change
        );
        Ok(Some(rec))
    }
}

#[async_trait]
impl Job for WeeklyRollup {
    async fn run_once(&mut self) -> Result<String> {
        let n = self.run_pending().await?;
        Ok(format!("summarized {n} week(s)"))
    }
}
