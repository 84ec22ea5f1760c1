use anyhow::Result;
use axum::Router;
use bucket_service::{
    BucketService, MemoryStorageClient, S3StorageClient,
    config::{AppConfig, Backend},
    handlers::AppState,
    routes,
};
use std::{io::ErrorKind, sync::Arc};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!(
        bucket = %cfg.bucket,
        backend = ?cfg.backend,
        region = ?cfg.s3.region,
        endpoint = ?cfg.s3.endpoint_url,
        "Starting bucket-service"
    );

    // --- Ensure download directory exists ---
    if fs::metadata(&cfg.download_dir).await.is_err() {
        fs::create_dir_all(&cfg.download_dir).await?;
        tracing::info!("Created download directory at {}", cfg.download_dir.display());
    }

    // --- Initialize storage client + facades ---
    let service = match cfg.backend {
        Backend::S3 => {
            let client = S3StorageClient::connect(&cfg.s3).await?;
            BucketService::new(Arc::new(client), cfg.bucket.clone())
        }
        Backend::Memory => {
            tracing::warn!("Using the in-memory backend; objects are lost on exit");
            let client = MemoryStorageClient::new().with_bucket(cfg.bucket.clone());
            BucketService::new(Arc::new(client), cfg.bucket.clone())
        }
    };

    // --- Build router ---
    let state = AppState::new(service, cfg.download_dir.clone());
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
