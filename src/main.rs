use anyhow::Context;
use docchat::{
    api, config, documents::DocumentService, inference::OllamaChatClient, logging,
    store::FileStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::init_config().context("Failed to load config from environment")?;
    logging::init_tracing();

    let store = FileStore::open(config.media_root.clone())
        .await
        .with_context(|| format!("Failed to open media root {}", config.media_root.display()))?;
    let inference = OllamaChatClient::from_config(config)?;
    tracing::info!(
        ollama_url = %config.ollama_url,
        model = %config.chat_model,
        timeout_secs = ?config.inference_timeout_secs,
        "Inference client ready"
    );
    let service = DocumentService::new(store, Box::new(inference), config.chat_model.clone());
    let app = api::create_router(Arc::new(service), config.max_upload_bytes);

    let (listener, port) = bind_listener(config.server_port)
        .await
        .context("Failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn bind_listener(server_port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8000..=8099;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8000-8099",
    ))
}
