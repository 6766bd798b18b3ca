// ─── Full Repair ───
// Composes the Mojang and distribution index processors against a selected
// server under the two-phase validate/download contract. The heavy workflow
// normally runs in a detached worker process (see transmitter/receiver);
// the orchestrator itself is process-agnostic.

mod message;
mod receiver;
mod transmitter;

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

pub use message::{WorkerCommand, WorkerReply};
pub use receiver::{run_receiver, FULL_REPAIR_HANDLER};
pub use transmitter::RepairTransmitter;

use tracing::info;

use crate::asset::Asset;
use crate::distribution::Distribution;
use crate::download::{DownloadQueue, Downloader};
use crate::error::{CoreError, CoreResult};
use crate::http::build_http_client;
use crate::index::{DistributionIndexProcessor, MojangIndexProcessor, Processor};
use crate::paths::LauncherPaths;

pub struct FullRepair {
    paths: LauncherPaths,
    server_id: String,
    dev_mode: bool,
    processors: Vec<Processor>,
    invalid: Vec<Asset>,
    validated: bool,
}

impl FullRepair {
    pub fn new(paths: LauncherPaths, server_id: impl Into<String>, dev_mode: bool) -> Self {
        Self {
            paths,
            server_id: server_id.into(),
            dev_mode,
            processors: Vec::new(),
            invalid: Vec::new(),
            validated: false,
        }
    }

    /// Phase one: build both processors against the locally-available
    /// distribution document and collect the invalid-asset set.
    ///
    /// `on_percent` observes integer stage progress, `floor(done/total*100)`.
    pub async fn verify<'a>(&'a mut self, on_percent: impl Fn(u8) + Send + Sync + 'a) -> CoreResult<usize> {
        let dist_path = self.paths.distribution_file(self.dev_mode);
        let distribution = Distribution::load(&dist_path).await?;
        let server = distribution
            .get_server(&self.server_id)
            .ok_or_else(|| {
                CoreError::Distribution(format!("unknown server id: {}", self.server_id))
            })?
            .clone();

        let client = build_http_client()?;
        self.processors = vec![
            Processor::Mojang(MojangIndexProcessor::new(
                client,
                self.paths.clone(),
                server.minecraft_version.clone(),
            )),
            Processor::Distribution(DistributionIndexProcessor::new(
                self.paths.clone(),
                server,
            )),
        ];

        for processor in &mut self.processors {
            processor.init().await?;
        }

        let total_stages: u32 = self.processors.iter().map(|p| p.total_stages()).sum();
        let completed = AtomicU32::new(0);
        let on_stage = move || {
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            on_percent((done * 100 / total_stages.max(1)) as u8);
        };

        self.invalid.clear();
        for processor in &mut self.processors {
            let invalid = processor.validate(&on_stage).await?;
            for (category, assets) in invalid {
                info!("{}: {} invalid", category, assets.len());
                self.invalid.extend(assets);
            }
        }

        self.validated = true;
        Ok(self.invalid.len())
    }

    /// Phase two: feed the retained invalid set through the download queue,
    /// then run every processor's finalizer.
    ///
    /// `on_percent` observes download progress as de-duplicated integer
    /// percent values.
    pub async fn download<'a>(&'a mut self, on_percent: impl Fn(u8) + Send + Sync + 'a) -> CoreResult<()> {
        if !self.validated {
            return Err(CoreError::ValidationPending);
        }

        if self.invalid.is_empty() {
            info!("Nothing to download for {}", self.server_id);
        } else {
            let queue = DownloadQueue::new(Downloader::new(build_http_client()?));
            let last_percent = AtomicU8::new(u8::MAX);
            queue
                .download_all(&self.invalid, |received, total| {
                    let percent = if total == 0 {
                        100
                    } else {
                        (received * 100 / total).min(100) as u8
                    };
                    // Only forward integer changes across the IPC boundary
                    if last_percent.swap(percent, Ordering::SeqCst) != percent {
                        on_percent(percent);
                    }
                })
                .await?;
        }

        for processor in &mut self.processors {
            processor.post_download().await?;
        }

        info!("Repair of {} complete", self.server_id);
        self.invalid.clear();
        Ok(())
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn download_before_validate_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = LauncherPaths::new(
            dir.path().join("l"),
            dir.path().join("c"),
            dir.path().join("i"),
            dir.path().join("d"),
        );
        let mut repair = FullRepair::new(paths, "main", false);
        let err = repair.download(|_| {}).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationPending));
    }

    #[tokio::test]
    async fn verify_without_distribution_document_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = LauncherPaths::new(
            dir.path().join("l"),
            dir.path().join("c"),
            dir.path().join("i"),
            dir.path().join("d"),
        );
        let mut repair = FullRepair::new(paths, "main", false);
        let err = repair.verify(|_| {}).await.unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
