use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

const MAX_CONNECTIONS: u32 = 10;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}
