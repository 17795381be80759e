//! Database pool construction and embedded-migration support.

use anyhow::{anyhow, Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<AsyncPgConnection>;

pub async fn connect(database_url: &str) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .await
        .context("Failed to build the database pool")
}

/// Run any pending embedded migrations on a blocking connection, returning
/// how many were applied. The migration harness is synchronous, so this runs
/// on the blocking thread pool before the async pool is used.
pub async fn run_migrations(migrations: EmbeddedMigrations, database_url: &str) -> Result<usize> {
    let url = database_url.to_owned();

    tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
