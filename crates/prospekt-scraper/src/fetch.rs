//! Streamed file downloads for page images and flyer documents.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::FetchError;

/// HTTP downloader with a browser-like client identity.
///
/// Bodies are streamed into a sibling `.part` file and renamed into place
/// after the final chunk, so a failed transfer never leaves a truncated
/// file at the destination path.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    client: Client,
}

impl ResourceFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` to `dest`, logging and swallowing any failure.
    pub async fn download(&self, url: &str, dest: &Path) -> bool {
        match self.try_download(url, dest).await {
            Ok(bytes) => {
                tracing::debug!(url, bytes, dest = %dest.display(), "downloaded");
                true
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "download failed");
                false
            }
        }
    }

    /// Download `url` to `dest` and return the number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`]: network or TLS failure, or a broken body stream.
    /// - [`FetchError::UnexpectedStatus`]: any non-2xx status.
    /// - [`FetchError::EmptyBody`]: the server returned zero bytes.
    /// - [`FetchError::Io`]: the destination could not be written.
    pub async fn try_download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "image/avif,image/webp,image/*,application/pdf,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "de-DE,de;q=0.9,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let part = part_path(dest);
        let result = async {
            let mut file = tokio::fs::File::create(&part)
                .await
                .map_err(|e| io_error(&part, e))?;
            let mut written: u64 = 0;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| io_error(&part, e))?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(|e| io_error(&part, e))?;
            drop(file);

            if written == 0 {
                return Err(FetchError::EmptyBody {
                    url: url.to_owned(),
                });
            }
            tokio::fs::rename(&part, dest)
                .await
                .map_err(|e| io_error(dest, e))?;
            Ok(written)
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&part).await;
        }
        result
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.display().to_string(),
        source,
    }
}
