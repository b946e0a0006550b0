use cpsync::{
    config::StubConfig,
    stub::{StubState, stub_router},
};
use envconfig::Envconfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StubConfig::init_from_env()?;
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!(addr = %listener.local_addr()?, "control plane stub listening");

    axum::serve(listener, stub_router(StubState::default())).await?;
    Ok(())
}
