mod parsing;
mod store;
pub mod types;

use async_trait::async_trait;
use tokio_postgres::Client;

use crate::config::PostgresConfig;
use crate::error::Result;
use crate::framework::store as pg;
use crate::framework::Job;
use types::period_label;

/// Pairwise balance correlation of the addresses in the latest snapshot.
pub struct Correlator {
    client: Client,
    /// Trailing periods, in days, covered by scheduled runs
    periods: Vec<i32>,
}

impl Correlator {
    pub async fn new(pgconf: &PostgresConfig, periods: Vec<i32>) -> Result<Self> {
        Ok(Self {
            client: pg::connect_and_init(pgconf, false).await?,
            periods,
        })
    }

    /// Recompute correlations over the trailing `period_days`.
    ///
    /// Returns the number of stored pairs.
    pub async fn run(&mut self, period_days: i32) -> Result<usize> {
        // Reject bad periods before touching the database
        parsing::window_start(time::Date::MAX, period_days)?;
        let period = period_label(period_days);
        let (latest_id, latest_date) = match store::get_latest(&self.client).await? {
            Some(latest) => latest,
            None => {
                tracing::warn!("no snapshots, skipping {period} correlations");
                return Ok(0);
            }
        };
        let from = parsing::window_start(latest_date, period_days)?;
        let series = store::get_series(&self.client, latest_id, &from, &latest_date).await?;
        let records = parsing::correlate(&series);
        tracing::debug!("{} candidate addresses over {period}", series.len());

        let pgtx = self.client.transaction().await?;
        store::replace(
            &pgtx,
            &period,
            &records,
            &time::OffsetDateTime::now_utc(),
        )
        .await?;
        pgtx.commit().await?;
        tracing::info!("stored {} {period} correlations", records.len());
        Ok(records.len())
    }
}

#[async_trait]
impl Job for Correlator {
    async fn run_once(&mut self) -> Result<String> {
        let mut done = vec![];
        for days in self.periods.clone() {
            let n = self.run(days).await?;
            done.push(format!("{}: {n}", period_label(days)));
        }
        Ok(format!("stored correlations ({})", done.join(", ")))
    }
}
