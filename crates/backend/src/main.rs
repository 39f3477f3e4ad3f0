pub mod domain;
pub mod shared;
pub mod system;
pub mod usecases;

use std::sync::Arc;

use shared::data::db_catalog_store::DbCatalogStore;
use system::scheduler::SyncScheduler;
use usecases::u501_sync_from_mflow::{MflowApiClient, SyncExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = shared::config::load_config()
        .map_err(|e| anyhow::anyhow!("config load failed: {e}"))?;
    config.validate()?;

    let db_path = shared::config::get_database_path(&config)?;
    let db_path_str = db_path.to_string_lossy().to_string();
    shared::data::db::initialize_database(Some(&db_path_str))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    let store = Arc::new(DbCatalogStore::new(
        shared::data::db::get_connection()?.clone(),
    ));
    let client = Arc::new(MflowApiClient::new(&config.mflow)?);
    let executor = Arc::new(SyncExecutor::new(client, store, config.sync.clone()));

    if config.schedule.enabled {
        let scheduler = SyncScheduler::new(executor, &config.schedule.cron)?;
        tracing::info!("Schedule enabled: '{}'", config.schedule.cron);
        scheduler.run_loop().await;
        return Ok(());
    }

    let report = executor.sync().await?;
    if report.errors > 0 {
        for item in &report.error_messages {
            tracing::warn!(
                "  {} (mflow id {}): {}",
                item.sku,
                item.remote_id,
                item.message
            );
        }
    }
    Ok(())
}
