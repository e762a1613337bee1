use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use drive_core::DriveClient;
use filetime::FileTime;
use futures_util::StreamExt;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use super::SyncError;
use super::compare::SyncTask;
use super::progress::{TransferProgress, set_progress};

const INITIAL_LAUNCH_INTERVAL: Duration = Duration::from_millis(500);

/// The delay inserted before each task launch. It tightens to the fastest
/// completed download observed so far and never widens back up.
pub struct Pacing {
    interval: Mutex<Duration>,
}

impl Pacing {
    pub fn new(initial: Duration) -> Self {
        Self {
            interval: Mutex::new(initial),
        }
    }

    pub async fn current(&self) -> Duration {
        *self.interval.lock().await
    }

    pub async fn observe(&self, elapsed: Duration) {
        let mut interval = self.interval.lock().await;
        if elapsed < *interval {
            *interval = elapsed;
        }
    }
}

#[derive(Clone)]
pub struct Downloader {
    client: DriveClient,
    dest_root: PathBuf,
    process_name: String,
    limiter: Option<Arc<Semaphore>>,
}

impl Downloader {
    pub fn new(
        client: DriveClient,
        dest_root: PathBuf,
        process_name: String,
        max_parallel: Option<usize>,
    ) -> Self {
        Self {
            client,
            dest_root,
            process_name,
            limiter: max_parallel.map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
        }
    }

    /// Launches one unit per task in queue order, pacing launches with the
    /// adaptive interval. Units run independently and may complete out of
    /// order; the first failure aborts the run.
    pub async fn run_all(
        &self,
        tasks: Vec<SyncTask>,
        progress: Arc<TransferProgress>,
    ) -> Result<(), SyncError> {
        let pacing = Arc::new(Pacing::new(INITIAL_LAUNCH_INTERVAL));
        let mut handles: Vec<JoinHandle<Result<(), SyncError>>> = Vec::with_capacity(tasks.len());
        for task in tasks {
            tokio::time::sleep(pacing.current().await).await;
            let downloader = self.clone();
            let progress = Arc::clone(&progress);
            let pacing = Arc::clone(&pacing);
            handles.push(tokio::spawn(async move {
                downloader.download_one(task, &progress, &pacing).await
            }));
        }
        for handle in handles {
            handle.await??;
        }
        Ok(())
    }

    async fn download_one(
        &self,
        task: SyncTask,
        progress: &TransferProgress,
        pacing: &Pacing,
    ) -> Result<(), SyncError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(
                Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|_| SyncError::LimiterClosed)?,
            ),
            None => None,
        };
        let started = Instant::now();

        let final_path = self.dest_root.join(&task.path);
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = sibling_with_suffix(&final_path, ".tmp");
        let response = self.client.download_file(&task.id).await?;
        let mut stream = response.bytes_stream();
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            progress.add_bytes(chunk.len() as u64);
            set_progress(progress.fraction(), &progress.status(), true);
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        // Self-update: move the live executable aside before promoting the
        // replacement onto its path.
        if final_path.file_name() == Some(OsStr::new(&self.process_name))
            && tokio::fs::try_exists(&final_path).await.unwrap_or(false)
        {
            tokio::fs::rename(&final_path, sibling_with_suffix(&final_path, ".bkp")).await?;
        }

        tokio::fs::rename(&tmp_path, &final_path).await?;
        set_modified_time(&final_path, task.mod_time)?;

        progress.complete_file();
        set_progress(progress.fraction(), &progress.status(), true);
        pacing.observe(started.elapsed()).await;
        Ok(())
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn set_modified_time(path: &Path, when: OffsetDateTime) -> std::io::Result<()> {
    let mtime = FileTime::from_unix_time(when.unix_timestamp(), when.nanosecond());
    filetime::set_file_mtime(path, mtime)
}
