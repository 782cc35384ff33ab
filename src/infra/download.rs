//! HTTP download functionality
//!
//! Handles downloading source archives with progress reporting, checksum
//! verification, and retry with exponential backoff. Downloads are strictly
//! sequential; the installer never runs more than one transfer at a time.

use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::error::DownloadError;

/// Progress callback type for download progress reporting
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Download result containing file path and metadata
#[derive(Debug)]
pub struct DownloadResult {
    /// Path to the downloaded file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// SHA256 checksum of the downloaded content
    pub checksum: String,
}

/// Download manager for fetching source archives with retry support
#[derive(Debug, Clone)]
pub struct DownloadManager {
    /// HTTP client
    client: reqwest::Client,
    /// Maximum retry attempts
    max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds)
    base_delay_ms: u64,
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadManager {
    /// Create a new download manager
    pub fn new() -> Self {
        Self::with_config(defaults::MAX_DOWNLOAD_RETRIES, 1000)
    }

    /// Create a download manager with custom settings
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            max_retries,
            base_delay_ms,
        }
    }

    /// Get max retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Download a file with retry logic
    ///
    /// # Arguments
    /// * `url` - URL to download from
    /// * `dest` - Destination path
    /// * `progress` - Optional progress callback (`bytes_downloaded`, `total_bytes`)
    ///
    /// # Returns
    /// Download result with path, size, and checksum
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadResult, DownloadError> {
        let mut attempts = 0;
        let mut last_error = None;
        let mut delay_ms = self.base_delay_ms;

        while attempts < self.max_retries {
            attempts += 1;

            match self.download_once(url, dest, progress.as_ref()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::debug!(url, attempt = attempts, error = %e, "download attempt failed");
                    last_error = Some(e);

                    if attempts < self.max_retries {
                        // Exponential backoff with cap at 30 seconds
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(30_000);
                    }
                }
            }
        }

        // Clean up partial download on failure
        let _ = tokio::fs::remove_file(dest).await;

        Err(last_error.unwrap_or_else(|| DownloadError::MaxRetriesExceeded {
            url: url.to_string(),
            retries: self.max_retries,
        }))
    }

    /// Single download attempt without retry
    async fn download_once(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<DownloadResult, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::NetworkError {
                url: url.to_string(),
                error: format!("HTTP {}", response.status()),
            });
        }

        let total_size = response.content_length().unwrap_or(0);

        // Create parent directories if needed
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::IoError {
                path: dest.to_path_buf(),
                error: e.to_string(),
            })?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: dest.to_path_buf(),
                    error: e.to_string(),
                })?;

            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(cb) = progress {
                cb(downloaded, total_size);
            }
        }

        file.flush().await.map_err(|e| DownloadError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        let checksum = hex::encode(hasher.finalize());

        Ok(DownloadResult {
            path: dest.to_path_buf(),
            size: downloaded,
            checksum,
        })
    }

    /// Download a file and verify its checksum
    ///
    /// The corrupted file is removed on mismatch. Whether a mismatch is fatal
    /// is the caller's policy; the fetch stage treats it as advisory.
    pub async fn download_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_checksum: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadResult, DownloadError> {
        let result = self.download(url, dest, progress).await?;

        if result.checksum.to_lowercase() != expected_checksum.to_lowercase() {
            let actual = result.checksum.clone();
            let _ = tokio::fs::remove_file(dest).await;

            return Err(DownloadError::ChecksumMismatch {
                file: dest.display().to_string(),
                expected: expected_checksum.to_lowercase(),
                actual,
            });
        }

        Ok(result)
    }
}

/// Compute the SHA-256 of a file on disk and compare to an expected digest
pub fn verify_checksum(path: &Path, expected: &str) -> Result<bool, DownloadError> {
    let bytes = std::fs::read(path).map_err(|e| DownloadError::IoError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let actual = hex::encode(hasher.finalize());

    Ok(actual == expected.to_lowercase())
}
