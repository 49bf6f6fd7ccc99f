use std::sync::Arc;

use anyhow::Context;

use dentlab_api::app::{AppServices, build_app};
use dentlab_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dentlab_observability::init();

    let settings = Settings::load().context("failed to load settings")?;
    let services = Arc::new(AppServices::from_settings(&settings).await?);
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
