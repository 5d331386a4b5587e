use tokio_postgres::Client;
use tokio_postgres::GenericClient;
use tokio_postgres::NoTls;

use super::migrations;
use crate::config::PostgresConfig;
use crate::error::Result;

/// Name of the postgres schema holding all relations.
pub const SCHEMA_NAME: &str = "whales";

/// Base schema, at revision 1.
const BASE_SQL: &str = include_str!("schema.sql");

/// Opens a new connection and drives it on a background task.
pub async fn connect(pgconf: &PostgresConfig) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(&pgconf.connection_uri, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("connection error: {}", e);
        }
    });

    Ok(client)
}

/// Connects and ensures the schema exists and is up to date.
///
/// A fresh database gets the base schema and all migrations. An existing one
/// is only migrated when `allow_migrations` is set.
pub async fn connect_and_init(pgconf: &PostgresConfig, allow_migrations: bool) -> Result<Client> {
    let mut client = connect(pgconf).await?;
    init(&mut client, allow_migrations).await?;
    Ok(client)
}

/// Prepare schema if needed.
pub async fn init(client: &mut Client, allow_migrations: bool) -> Result<()> {
    if !schema_exists(&*client, SCHEMA_NAME).await? {
        tracing::info!("loading {SCHEMA_NAME} schema");
        let tx = client.transaction().await?;
        tx.batch_execute(BASE_SQL).await?;
        tx.commit().await?;
        return migrations::check(&*client, true).await;
    }
    migrations::check(&*client, allow_migrations).await
}

/// Returns True if a schema with given `name` exists.
pub async fn schema_exists(client: &impl GenericClient, name: &str) -> Result<bool> {
    tracing::trace!("checking for existing {} schema", &name);
    let qry = "
    select exists(
        select schema_name
        from information_schema.schemata
        where schema_name = $1
    );";
    Ok(client.query_one(qry, &[&name]).await?.get(0))
}
