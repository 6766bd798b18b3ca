mod engine;
mod queue;

pub use engine::{Downloader, ProgressFn, TransferProgress, CONFIG_EXTENSIONS, MAX_ATTEMPTS};
pub use queue::{DownloadQueue, DownloadReport, QUEUE_CONCURRENCY};
