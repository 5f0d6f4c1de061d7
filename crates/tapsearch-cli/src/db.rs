//! `db` subcommand handlers.

use std::path::Path;

use sqlx::PgPool;

pub(crate) async fn connect(config: &tapsearch_core::AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = tapsearch_db::PoolConfig::from_app_config(config);
    let pool = tapsearch_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = tapsearch_db::run_migrations(pool).await?;
    println!("migrations applied: {applied}");
    Ok(())
}

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    tapsearch_db::health_check(pool).await?;
    println!("database ok");
    Ok(())
}

/// Load `path` and upsert it.
///
/// # Errors
///
/// Fails if the file does not parse as a dataset or any upsert fails; nothing
/// is written in that case.
pub(crate) async fn run_seed(pool: &PgPool, path: &Path) -> anyhow::Result<()> {
    let dataset = tapsearch_core::load_dataset(path)?;
    tracing::info!(
        path = %path.display(),
        buildings = dataset.buildings.len(),
        restaurants = dataset.restaurants.len(),
        "seeding dataset"
    );
    let summary = tapsearch_db::seed_dataset(pool, &dataset).await?;
    println!(
        "seeded {} buildings and {} restaurants from {}",
        summary.buildings,
        summary.restaurants,
        path.display()
    );
    Ok(())
}
