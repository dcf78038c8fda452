use crate::config::AppConfig;
use crate::database::manager::{connect, run_migrations};

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = connect(&config.database).await?;
    run_migrations(&pool).await?;
    pool.close().await;
    Ok(())
}
