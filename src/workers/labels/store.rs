use postgres_from_row::FromRow;
use tokio_postgres::GenericClient;

use super::types::AddressLabel;
use super::types::NewLabel;
use crate::error::Result;

pub(super) async fn upsert(client: &impl GenericClient, rec: &NewLabel) -> Result<AddressLabel> {
    tracing::trace!("upsert {}", rec.address);
    let stmt = "
        insert into whales.address_labels (address, label, category, notes, updated_at)
        values ($1, $2, $3, $4, now())
        on conflict (address) do update
        set label = EXCLUDED.label
            , category = EXCLUDED.category
            , notes = EXCLUDED.notes
            , updated_at = EXCLUDED.updated_at
        returning address
            , label
            , category
            , notes
            , updated_at;";
    let row = client
        .query_one(stmt, &[&rec.address, &rec.label, &rec.category, &rec.notes])
        .await?;
    Ok(AddressLabel::from_row(&row))
}

pub(super) async fn get_one(client: &impl GenericClient, address: &str) -> Result<Option<AddressLabel>> {
    tracing::trace!("get_one {address}");
    let qry = "
        select address
            , label
            , category
            , notes
            , updated_at
        from whales.address_labels
        where address = $1;";
    let row = client.query_opt(qry, &[&address]).await?;
    Ok(row.map(|r| AddressLabel::from_row(&r)))
}

/// All labels, optionally limited to a category, ordered by address.
pub(super) async fn get_many(
    client: &impl GenericClient,
    category: Option<&str>,
) -> Result<Vec<AddressLabel>> {
    tracing::trace!("get_many {category:?}");
    let qry = "
        select address
            , label
            , category
            , notes
            , updated_at
        from whales.address_labels
        where $1::text is null or category = $1
        order by address;";
    Ok(client
        .query(qry, &[&category])
        .await?
        .iter()
        .map(AddressLabel::from_row)
        .collect())
}

/// Returns true if a label got deleted.
pub(super) async fn delete(client: &impl GenericClient, address: &str) -> Result<bool> {
    tracing::trace!("delete {address}");
    let n = client
        .execute(
            "delete from whales.address_labels where address = $1;",
            &[&address],
        )
        .await?;
    Ok(n > 0)
}
