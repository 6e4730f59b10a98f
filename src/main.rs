use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use staylens::server;
use staylens::settings::Settings;
use staylens::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let settings = Settings::load()?;
    let store = Arc::new(Store::open(&settings.database)?);
    let app = server::router(store);
    let listener = tokio::net::TcpListener::bind(&settings.listen).await?;
    info!(listen = %settings.listen, database = %settings.database, "staylens serving");
    axum::serve(listener, app).await?;
    Ok(())
}
