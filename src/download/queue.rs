// ─── Download Queue ───
// Bounded-parallel execution of an asset set with byte-accurate aggregate
// progress. Individual retries stay inside the engine; the queue only
// accounts for bytes and failure propagation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::asset::Asset;
use crate::download::engine::{Downloader, TransferProgress};
use crate::error::{CoreError, CoreResult};
use crate::util::hash::validate_local_file;

/// Fixed worker-pool width for asset downloads.
pub const QUEUE_CONCURRENCY: usize = 15;

/// Outcome of a queue run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Bytes received over the wire, per asset id. Assets satisfied from
    /// disk never transfer and report zero.
    pub received: HashMap<String, u64>,
    /// Assets whose on-disk digest still disagrees after the run.
    pub corrupted: Vec<String>,
}

/// Per-asset byte ledger feeding a shared aggregate counter.
///
/// `record` returns the aggregate after applying the event's delta; a
/// backwards jump (the engine's retry reset) unwinds this asset's
/// contribution entirely.
struct ByteLedger {
    prev: AtomicU64,
    aggregate: Arc<AtomicU64>,
}

impl ByteLedger {
    fn new(aggregate: Arc<AtomicU64>) -> Self {
        Self {
            prev: AtomicU64::new(0),
            aggregate,
        }
    }

    fn record(&self, transferred: u64) -> u64 {
        let prev = self.prev.swap(transferred, Ordering::SeqCst);
        if transferred >= prev {
            self.aggregate.fetch_add(transferred - prev, Ordering::SeqCst) + (transferred - prev)
        } else {
            self.aggregate.fetch_sub(prev - transferred, Ordering::SeqCst) - (prev - transferred)
        }
    }

    fn total(&self) -> u64 {
        self.prev.load(Ordering::SeqCst)
    }
}

pub struct DownloadQueue {
    downloader: Downloader,
    concurrency: usize,
    /// Promote a received-vs-declared size disagreement whose on-disk
    /// digest also fails into a hard error instead of a report entry.
    strict_size_check: bool,
}

impl DownloadQueue {
    pub fn new(downloader: Downloader) -> Self {
        Self {
            downloader,
            concurrency: QUEUE_CONCURRENCY,
            strict_size_check: false,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_strict_size_check(mut self, strict: bool) -> Self {
        self.strict_size_check = strict;
        self
    }

    /// Drive every asset concurrently, reporting the cumulative received
    /// bytes against the declared total through `on_progress`.
    ///
    /// The first fatal failure is surfaced after in-flight work settles;
    /// queued assets that have not started yet are skipped once a failure
    /// has been observed.
    pub async fn download_all<'a>(
        &'a self,
        assets: &'a [Asset],
        on_progress: impl Fn(u64, u64) + Send + Sync + 'a,
    ) -> CoreResult<DownloadReport> {
        let expected_total: u64 = assets.iter().map(|a| a.size).sum();
        let aggregate = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicBool::new(false));

        info!(
            "Queueing {} assets ({} bytes) at concurrency {}",
            assets.len(),
            expected_total,
            self.concurrency
        );

        let mut results = stream::iter(assets.iter())
            .map(|asset| {
                let aggregate = Arc::clone(&aggregate);
                let failed = Arc::clone(&failed);
                let on_progress = &on_progress;
                async move {
                    if failed.load(Ordering::SeqCst) {
                        return (asset, Ok(None));
                    }

                    let ledger = ByteLedger::new(aggregate);
                    let callback = |p: TransferProgress| {
                        let current = ledger.record(p.transferred);
                        on_progress(current, expected_total);
                    };

                    let result = self
                        .downloader
                        .download_asset(asset, Some(&callback))
                        .await
                        .map(|_| Some(ledger.total()));
                    (asset, result)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut report = DownloadReport::default();
        let mut first_error: Option<CoreError> = None;

        while let Some((asset, result)) = results.next().await {
            match result {
                Ok(Some(received)) => {
                    report.received.insert(asset.id.clone(), received);
                }
                Ok(None) => {} // skipped after an observed failure
                Err(e) => {
                    failed.store(true, Ordering::SeqCst);
                    if first_error.is_none() {
                        first_error = Some(e);
                    } else {
                        warn!("Additional queue failure: {}", e);
                    }
                }
            }
        }
        drop(results);

        if let Some(e) = first_error {
            return Err(e);
        }

        self.post_run_check(assets, &mut report).await?;
        Ok(report)
    }

    /// Compare received bytes with declared sizes and re-validate on disk
    /// where they disagree. Disagreement alone only warns; a digest
    /// mismatch marks the asset corrupted (the next validate pass will
    /// queue it again).
    async fn post_run_check(
        &self,
        assets: &[Asset],
        report: &mut DownloadReport,
    ) -> CoreResult<()> {
        for asset in assets {
            let received = report.received.get(&asset.id).copied().unwrap_or(0);
            if received == asset.size {
                continue;
            }

            if received > 0 {
                warn!(
                    "{}: received {} bytes, declared {}",
                    asset.id, received, asset.size
                );
            }

            if !validate_local_file(&asset.path, asset.algorithm, &asset.hash).await? {
                warn!("{} failed post-run validation", asset.id);
                if self.strict_size_check {
                    return Err(CoreError::Validation {
                        path: asset.path.clone(),
                        algorithm: asset.algorithm.as_str(),
                        expected: asset.hash.clone(),
                        actual: "post-run re-validation failed".into(),
                    });
                }
                report.corrupted.push(asset.id.clone());
            }
        }
        Ok(())
    }
}
