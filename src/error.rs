use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire launcher core.
/// Every module returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("{algorithm} mismatch for {path:?}: expected {expected}, got {actual}")]
    Validation {
        path: PathBuf,
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Distribution ────────────────────────────────────
    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("Malformed server address: {0}")]
    MalformedAddress(String),

    #[error("Version {0} not found in the version manifest")]
    VersionNotFound(String),

    // ── Java ────────────────────────────────────────────
    #[error("No suitable Java runtime found for range {0}")]
    JavaNotFound(String),

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    #[error("Unknown Java distribution: {0}")]
    UnknownDistribution(String),

    // ── Worker ──────────────────────────────────────────
    #[error("Unknown receiver handler: {0}")]
    UnknownHandler(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Download requested before validation completed")]
    ValidationPending,

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive error: {0}")]
    Archive(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<std::io::Error> for CoreError {
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl CoreError {
    /// Wrap an IO error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Io { .. } => "io",
            CoreError::Http(_) | CoreError::DownloadFailed { .. } => "network",
            CoreError::Validation { .. } => "integrity",
            CoreError::InvalidMavenCoordinate(_) => "maven",
            CoreError::Json(_) => "parsing",
            CoreError::Distribution(_)
            | CoreError::MalformedAddress(_)
            | CoreError::VersionNotFound(_) => "distribution",
            CoreError::JavaNotFound(_)
            | CoreError::JavaExecution(_)
            | CoreError::UnknownDistribution(_) => "java",
            CoreError::UnknownHandler(_)
            | CoreError::Worker(_)
            | CoreError::ValidationPending => "worker",
            CoreError::Zip(_) | CoreError::Archive(_) => "archive",
            CoreError::Other(_) => "generic",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Http(_)
                | CoreError::DownloadFailed { .. }
                | CoreError::Io { .. }
                | CoreError::JavaNotFound(_)
        )
    }

    /// Whether the download engine may retry the failed attempt.
    ///
    /// Only HTTP 5xx and a recognized set of transport failures qualify;
    /// a `Validation` failure never does.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::DownloadFailed { status, .. } => (500..600).contains(status),
            CoreError::Http(e) => retryable_transport(e),
            CoreError::Io { source, .. } => retryable_io_kind(source.kind()),
            _ => false,
        }
    }
}

/// Transport errors worth another attempt.
///
/// The recognized set is a minimum: reqwest timeout/connect classification
/// plus any IO error kind from the set below found in the source chain.
pub fn retryable_transport(e: &reqwest::Error) -> bool {
    if e.is_timeout() || e.is_connect() {
        return true;
    }
    // Walk the source chain looking for a transient IO kind (reset, refused…)
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return retryable_io_kind(io.kind());
        }
        source = cause.source();
    }
    false
}

fn retryable_io_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::AddrInUse
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::Interrupted
    )
}
