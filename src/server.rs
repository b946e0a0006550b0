use crate::{
    config::Config,
    control_plane::{ControlPlaneClient, StatusSink},
    reconciler::Reconciler,
    router,
    store::{KubeStore, ResourceStore},
    sync::Syncer,
    watch::WatchManager,
};
use kube::Client;
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct SyncServer {
    pub addr: SocketAddr,
    pub listener: tokio::net::TcpListener,
    pub router: axum::Router,
    pub syncer: Syncer,
    pub watches: WatchManager,
    shutdown: CancellationToken,
}

impl SyncServer {
    pub async fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = Client::try_default().await?;
        Self::new_with_client(config, client).await
    }

    pub async fn new_with_client(
        config: &Config,
        client: Client,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        config.validate()?;
        let shutdown = CancellationToken::new();
        let store: Arc<dyn ResourceStore> = Arc::new(KubeStore::new(client));
        let control_plane = ControlPlaneClient::new(
            config.poll_url.clone(),
            config.status_url.clone(),
            config.request_timeout(),
        )?;
        let sink: Arc<dyn StatusSink> = Arc::new(control_plane.clone());
        let watches = WatchManager::new(store.clone(), sink, shutdown.clone());
        let reconciler = Reconciler::new(store, watches.clone());
        let syncer = Syncer::new(control_plane, reconciler, config.interval());

        let router = router::new_router(watches.clone());
        let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
        let addr = listener.local_addr()?;

        Ok(SyncServer {
            addr,
            listener,
            router,
            syncer,
            watches,
            shutdown,
        })
    }

    /// Token that stops the sync loop, every watch and the HTTP listener.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let shutdown = self.shutdown.clone();
        let sync_handle = tokio::spawn(self.syncer.run(shutdown.clone()));

        info!(addr = %self.addr, "serving health endpoints");
        let http_shutdown = shutdown.clone();
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await?;

        shutdown.cancel();
        if let Err(err) = sync_handle.await {
            error!(error = %err, "sync loop failed");
        }
        self.watches.join().await;
        Ok(())
    }
}
