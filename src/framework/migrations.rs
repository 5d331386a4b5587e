use tokio_postgres::Client;
use tokio_postgres::GenericClient;

use crate::error::Error;
use crate::error::Result;

mod mig_001;

// Revision 1 is the base schema
pub const CURRENT_REVISION: i32 = 2;

/// A single, individually guarded, schema change.
///
/// Steps must be safe to re-run so a partially applied migration
/// can be completed by a subsequent run.
pub(super) struct Step {
    pub description: &'static str,
    pub sql: &'static str,
}

/// Check db revision and apply migrations if needed.
pub(super) async fn check(client: &Client, allow_migrations: bool) -> Result<()> {
    let revision = get_revision(client).await?;
    tracing::debug!("current db revision is {revision}");

    if revision > CURRENT_REVISION {
        return Err(Error::Revision {
            found: revision,
            expected: CURRENT_REVISION,
            reason: "database was created by a more recent version of this program",
        });
    } else if revision == CURRENT_REVISION {
        tracing::debug!("db revision is up to date");
        return Ok(());
    }

    if !allow_migrations {
        return Err(Error::Revision {
            found: revision,
            expected: CURRENT_REVISION,
            reason: "run `ewt migrate` or pass --allow-migrations",
        });
    }
    // Migration ID = revision it applies to (i.e. migration 1 results in revision 2)
    for mig_id in revision..CURRENT_REVISION {
        apply_migration(client, mig_id).await?;
    }
    Ok(())
}

/// Retrieves current schema revision.
pub async fn get_revision(client: &impl GenericClient) -> Result<i32> {
    let row = client
        .query_one("select version from whales._rev;", &[])
        .await?;
    Ok(row.get(0))
}

fn steps(migration_id: i32) -> Result<&'static [Step]> {
    match migration_id {
        1 => Ok(mig_001::STEPS),
        _ => Err(Error::Revision {
            found: migration_id,
            expected: CURRENT_REVISION,
            reason: "no migration for this revision",
        }),
    }
}

/// Runs the steps of a migration one by one, then bumps the revision.
///
/// A failing step aborts the remaining ones and leaves the revision
/// untouched, so the next run starts over from the first step.
async fn apply_migration(client: &Client, migration_id: i32) -> Result<()> {
    tracing::info!(
        "applying migration {} (revision {})",
        migration_id,
        migration_id + 1
    );
    for step in steps(migration_id)? {
        tracing::info!("migration {migration_id}: {}", step.description);
        if let Err(source) = client.batch_execute(step.sql).await {
            tracing::error!(
                "migration {migration_id} failed at `{}`: {source}",
                step.description
            );
            return Err(Error::Migration {
                migration: migration_id,
                step: step.description,
                source,
            });
        }
    }
    client
        .execute("update whales._rev set version = $1;", &[&(migration_id + 1)])
        .await?;
    Ok(())
}
