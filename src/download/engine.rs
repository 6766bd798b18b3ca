// ─── Download Engine ───
// Single-file downloads with validate-skip, atomic writes and retries.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::asset::Asset;
use crate::error::{CoreError, CoreResult};
use crate::paths::write_atomic;
use crate::util::hash::{hash_bytes, validate_local_file};

/// Extensions the engine refuses to clobber when a file already exists.
/// These are user-editable configs that launchers must not reset.
pub const CONFIG_EXTENSIONS: [&str; 5] = ["txt", "json", "yml", "yaml", "dat"];

/// Retries per asset after the initial attempt, before the last captured
/// error is surfaced.
pub const MAX_ATTEMPTS: u32 = 10;

/// Raw per-stream progress. `transferred`/`total` are bytes; a retry emits a
/// single all-zero reset so aggregators can unwind the failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred: u64,
    pub total: u64,
}

impl TransferProgress {
    pub const RESET: TransferProgress = TransferProgress {
        transferred: 0,
        total: 0,
    };
}

pub type ProgressFn<'a> = dyn Fn(TransferProgress) + Send + Sync + 'a;

/// Hash-validated downloader over a shared HTTP client.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Materialize `asset.path` with content matching the declared digest,
    /// or fail. Reports raw received bytes through `on_progress`.
    ///
    /// Transient failures (HTTP 5xx, recognized transport errors) are
    /// retried up to [`MAX_ATTEMPTS`] times with `2^attempt` seconds of
    /// backoff. A digest mismatch after download is fatal immediately.
    pub async fn download_asset(
        &self,
        asset: &Asset,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> CoreResult<()> {
        if self.should_skip(asset).await? {
            return Ok(());
        }

        if let Some(parent) = asset.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::io(parent, e))?;
        }

        // Initial attempt plus MAX_ATTEMPTS retries, backing off 2^n seconds
        let mut last_error = None;
        for retry in 0..=MAX_ATTEMPTS {
            match self.attempt_download(asset, on_progress).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    // Partial output must not survive a failed attempt
                    if !matches!(e, CoreError::Validation { .. }) {
                        let _ = tokio::fs::remove_file(&asset.path).await;
                    }

                    if !e.is_transient() {
                        return Err(e);
                    }

                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        retry + 1,
                        MAX_ATTEMPTS + 1,
                        asset.id,
                        e
                    );
                    last_error = Some(e);

                    if retry < MAX_ATTEMPTS {
                        // Unwind this attempt's bytes before backing off
                        if let Some(cb) = on_progress {
                            cb(TransferProgress::RESET);
                        }
                        tokio::time::sleep(Duration::from_secs(1u64 << (retry + 1))).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CoreError::Other(format!("download of {} failed with no captured error", asset.id))
        }))
    }

    /// Skip rules: protected config files, then an on-disk digest match.
    async fn should_skip(&self, asset: &Asset) -> CoreResult<bool> {
        if is_config_file(&asset.path) && asset.path.exists() {
            debug!("Skipping user config {}", asset.id);
            return Ok(true);
        }

        if validate_local_file(&asset.path, asset.algorithm, &asset.hash).await? {
            debug!("Already valid on disk: {}", asset.id);
            return Ok(true);
        }

        Ok(false)
    }

    async fn attempt_download(
        &self,
        asset: &Asset,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> CoreResult<()> {
        let response = self.client.get(&asset.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::DownloadFailed {
                url: asset.url.clone(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length().unwrap_or(asset.size);
        let mut body = Vec::with_capacity(asset.size as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            body.extend_from_slice(&chunk);
            if let Some(cb) = on_progress {
                cb(TransferProgress {
                    transferred: body.len() as u64,
                    total,
                });
            }
        }

        write_atomic(&asset.path, &body).await?;

        // Re-hash what actually landed on disk
        let actual = crate::util::hash::hash_file(&asset.path, asset.algorithm).await?;
        if actual != asset.hash {
            return Err(CoreError::Validation {
                path: asset.path.clone(),
                algorithm: asset.algorithm.as_str(),
                expected: asset.hash.clone(),
                actual,
            });
        }

        debug!("Downloaded {} -> {:?}", asset.id, asset.path);
        Ok(())
    }

    /// Pre-write digest check on an in-memory body; used by callers that
    /// want the mismatch before anything touches the disk.
    pub fn validate_body(asset: &Asset, body: &[u8]) -> CoreResult<()> {
        let actual = hash_bytes(body, asset.algorithm);
        if actual != asset.hash {
            return Err(CoreError::Validation {
                path: asset.path.clone(),
                algorithm: asset.algorithm.as_str(),
                expected: asset.hash.clone(),
                actual,
            });
        }
        Ok(())
    }
}

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONFIG_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::HashAlgorithm;
    use crate::http::build_http_client;
    use std::path::PathBuf;

    fn asset_at(path: PathBuf, hash: &str) -> Asset {
        Asset::new(
            "test-asset",
            // Unroutable without a request ever being made in skip tests
            "http://127.0.0.1:1/never",
            11,
            hash,
            HashAlgorithm::Sha1,
            path,
        )
    }

    #[test]
    fn config_extensions_are_protected() {
        assert!(is_config_file(Path::new("/x/options.txt")));
        assert!(is_config_file(Path::new("/x/servers.DAT")));
        assert!(is_config_file(Path::new("/x/config.yml")));
        assert!(!is_config_file(Path::new("/x/client.jar")));
        assert!(!is_config_file(Path::new("/x/noext")));
    }

    #[tokio::test]
    async fn valid_file_on_disk_skips_the_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hello.bin");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let downloader = Downloader::new(build_http_client().unwrap());
        let asset = asset_at(path, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");

        // The URL is unroutable: success proves no request was performed
        downloader.download_asset(&asset, None).await.unwrap();
    }

    #[tokio::test]
    async fn existing_config_file_is_never_clobbered() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("options.txt");
        tokio::fs::write(&path, b"user content").await.unwrap();

        let downloader = Downloader::new(build_http_client().unwrap());
        // Digest intentionally wrong: the config rule wins before hashing
        let asset = asset_at(path.clone(), "0000000000000000000000000000000000000000");

        downloader.download_asset(&asset, None).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"user content");
    }

    #[test]
    fn body_validation_detects_mismatch() {
        let asset = asset_at(PathBuf::from("/x/a.jar"), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert!(Downloader::validate_body(&asset, b"hello world").is_ok());
        let err = Downloader::validate_body(&asset, b"tampered").unwrap_err();
        assert_eq!(err.kind(), "integrity");
    }

    #[tokio::test]
    async fn transient_500_is_retried_with_a_progress_reset() {
        use crate::util::testserver::{http_response, serve_responses};
        use std::sync::Mutex;

        let addr = serve_responses(vec![
            http_response("500 Internal Server Error", b""),
            http_response("200 OK", b"hello world"),
        ])
        .await;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hello.bin");
        let asset = Asset::new(
            "retry-asset",
            format!("http://{addr}/hello.bin"),
            11,
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed",
            HashAlgorithm::Sha1,
            path.clone(),
        );

        let events: Mutex<Vec<TransferProgress>> = Mutex::new(Vec::new());
        let downloader = Downloader::new(build_http_client().unwrap());
        downloader
            .download_asset(&asset, Some(&|p| events.lock().unwrap().push(p)))
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello world");

        let events = events.lock().unwrap();
        // Exactly one reset separates the failed attempt from the retry
        let resets = events
            .iter()
            .filter(|p| **p == TransferProgress::RESET)
            .count();
        assert_eq!(resets, 1);
        assert_eq!(events.last().unwrap().transferred, 11);
    }

    #[tokio::test]
    async fn atomic_write_replaces_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
        assert!(!dir.path().join("out.bin.part").exists());
    }
}
