pub mod compare;
pub mod download;
pub mod engine;
pub mod index;
pub mod progress;
pub mod tree;

use thiserror::Error;

use self::tree::TreeError;

/// Any error during a run is fatal; the first one aborts the whole sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("api error: {0}")]
    Api(#[from] drive_core::DriveError),
    #[error("path resolution failed: {0}")]
    Tree(#[from] TreeError),
    #[error("bad modification timestamp: {0}")]
    Timestamp(#[from] time::error::Parse),
    #[error("missing modification timestamp for {0}")]
    MissingTimestamp(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("download stream failed: {0}")]
    Stream(#[from] reqwest::Error),
    #[error("concurrency limiter is closed")]
    LimiterClosed,
    #[error("sync task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
