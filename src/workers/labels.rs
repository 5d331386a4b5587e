mod store;
pub mod types;

use tokio_postgres::Client;

use crate::config::PostgresConfig;
use crate::error::Result;
use crate::framework::store as pg;
use types::AddressLabel;
use types::NewLabel;

/// Human readable labels for known addresses.
pub struct Labels {
    client: Client,
}

impl Labels {
    pub async fn new(pgconf: &PostgresConfig) -> Result<Self> {
        Ok(Self {
            client: pg::connect_and_init(pgconf, false).await?,
        })
    }

    /// Create or replace the label of an address.
    pub async fn upsert(&self, label: &NewLabel) -> Result<AddressLabel> {
        let label = label.validated()?;
        let stored = store::upsert(&self.client, &label).await?;
        tracing::info!("labelled {} as {}", stored.address, stored.label);
        Ok(stored)
    }

    pub async fn get(&self, address: &str) -> Result<Option<AddressLabel>> {
        store::get_one(&self.client, address).await
    }

    /// List labels, optionally of a single category.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<AddressLabel>> {
        store::get_many(&self.client, category).await
    }

    /// Remove the label of an address. Returns false if there was none.
    pub async fn delete(&self, address: &str) -> Result<bool> {
        let deleted = store::delete(&self.client, address).await?;
        if deleted {
            tracing::info!("removed label of {address}");
        }
        Ok(deleted)
    }
}
