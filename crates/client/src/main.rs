use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flightbay_client::api::ApiClient;
use flightbay_client::config::ClientConfig;
use flightbay_client::uploader::{ChunkUploadClient, UploadEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flightbay_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: flightbay-upload <file> [<file> ...]");
    }

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, uploader_id = config.uploader_id, "Loaded client configuration");

    let api = Arc::new(ApiClient::new(&config).context("building API client")?);
    let uploader = Arc::new(ChunkUploadClient::new(
        Arc::clone(&api),
        config.chunk_size_bytes,
    ));

    // Each file runs as its own independent sequence; one failure never
    // stops the others.
    let tasks = paths.into_iter().map(|path| {
        let uploader = Arc::clone(&uploader);
        tokio::spawn(async move {
            let name = path.display().to_string();
            let log_name = name.clone();
            let events = Arc::new(move |event: UploadEvent| match event {
                UploadEvent::Hashing { bytes_hashed, total } => {
                    tracing::debug!(file = %log_name, bytes_hashed, total, "hashing");
                }
                UploadEvent::Started { upload } => {
                    tracing::info!(
                        file = %log_name,
                        upload_id = upload.id,
                        uploaded_chunks = upload.uploaded_chunks,
                        number_chunks = upload.number_chunks,
                        "upload started"
                    );
                }
                UploadEvent::ChunkAccepted { upload } => {
                    tracing::debug!(
                        file = %log_name,
                        uploaded_chunks = upload.uploaded_chunks,
                        number_chunks = upload.number_chunks,
                        "chunk accepted"
                    );
                }
                UploadEvent::Completed { upload } => {
                    tracing::info!(file = %log_name, upload_id = upload.id, status = %upload.status, "upload complete");
                }
                UploadEvent::AlreadyUploaded => {
                    tracing::info!(file = %log_name, "already uploaded, nothing to send");
                }
                UploadEvent::Failed { message } => {
                    tracing::error!(file = %log_name, %message, "upload failed");
                }
            });
            let result = uploader.upload_file(&path, events).await;
            (name, result)
        })
    });

    let mut failures = 0usize;
    for task in futures::future::join_all(tasks).await {
        match task {
            Ok((_, Ok(_))) => {}
            Ok((name, Err(err))) => {
                failures += 1;
                tracing::error!(file = %name, error = %err, "sequence failed");
            }
            Err(join_err) => {
                failures += 1;
                tracing::error!(error = %join_err, "upload task panicked");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} upload(s) failed");
    }
    Ok(())
}
