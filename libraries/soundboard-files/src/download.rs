//! Starter sound downloads over HTTP

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use soundboard_core::{Result, SoundFetcher, SoundboardError};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Default request timeout for a single starter sound
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads remote sounds with `reqwest`
#[derive(Debug, Clone)]
pub struct HttpSoundFetcher {
    http: Client,
}

impl HttpSoundFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SoundboardError::fetch("client", err))?;
        Ok(Self { http })
    }

    /// Use an existing client (shared connection pool)
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    async fn download(&self, url: &str, dest_path: &Path) -> Result<u64> {
        debug!(url = %url, dest = %dest_path.display(), "Downloading sound");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| SoundboardError::fetch(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SoundboardError::fetch(url, format!("HTTP {}", status.as_u16())));
        }

        if let Some(parent) = dest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(dest_path).await.map_err(|err| {
            SoundboardError::copy_failed(dest_path.display().to_string(), err)
        })?;
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|err| SoundboardError::fetch(url, err))?;
            file.write_all(&chunk).await.map_err(|err| {
                SoundboardError::copy_failed(dest_path.display().to_string(), err)
            })?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await?;

        if downloaded == 0 {
            return Err(SoundboardError::fetch(url, "empty response body"));
        }

        info!(url = %url, dest = %dest_path.display(), size = downloaded, "Sound downloaded");
        Ok(downloaded)
    }
}

#[async_trait]
impl SoundFetcher for HttpSoundFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let result = self.download(url, dest).await;

        if result.is_err() {
            // Never leave a truncated file where validation would find it
            if let Err(err) = tokio::fs::remove_file(dest).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(dest = %dest.display(), error = %err, "Could not remove failed download");
                }
            }
        }

        result
    }
}
