use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use drive_core::DriveFile;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::SyncError;
use super::index::RemoteIndex;
use super::tree;

// Drive reports modification times in UTC with exactly three fractional
// digits; anything else is a fatal timestamp error.
const MODIFIED_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// One queued download decision, consumed exactly once by the scheduler.
#[derive(Debug, Clone)]
pub struct SyncTask {
    pub id: String,
    pub path: PathBuf,
    pub size: u64,
    pub mod_time: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct SyncPlan {
    pub tasks: Vec<SyncTask>,
    pub total_bytes: u64,
    pub total_files: u64,
}

/// Compares every remote file against the local tree, one task per entry,
/// and returns the download queue sorted largest-first. Skipped outright:
/// folders, the root itself, and the names in `skip_names` (the running
/// executable and the policy-exempt config file).
pub async fn build_plan(
    index: Arc<RemoteIndex>,
    dest_root: PathBuf,
    skip_names: HashSet<String>,
) -> Result<SyncPlan, SyncError> {
    let plan = Arc::new(Mutex::new(SyncPlan::default()));
    let skip_names = Arc::new(skip_names);
    let dest_root = Arc::new(dest_root);

    let mut handles: Vec<JoinHandle<Result<(), SyncError>>> = Vec::with_capacity(index.len());
    for id in index.ids() {
        let index = Arc::clone(&index);
        let dest_root = Arc::clone(&dest_root);
        let skip_names = Arc::clone(&skip_names);
        let plan = Arc::clone(&plan);
        handles.push(tokio::spawn(async move {
            compare_entry(&index, &dest_root, &skip_names, &id, &plan).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let mut plan = std::mem::take(&mut *plan.lock().await);
    // Largest files first: front-loads bandwidth-bound work and lets the
    // launch pacing converge on a realistic per-task duration sooner.
    plan.tasks.sort_by(|a, b| b.size.cmp(&a.size));
    Ok(plan)
}

async fn compare_entry(
    index: &RemoteIndex,
    dest_root: &Path,
    skip_names: &HashSet<String>,
    id: &str,
    plan: &Mutex<SyncPlan>,
) -> Result<(), SyncError> {
    let Some(entry) = index.get(id) else {
        return Ok(());
    };
    let file = &entry.file;
    if file.is_folder() || skip_names.contains(&file.name) {
        return Ok(());
    }

    let rel = tree::resolve_path(index, id)?;
    if rel.as_os_str().is_empty() {
        return Ok(());
    }
    let mod_time = parse_modified_time(file)?;

    if needs_download(&dest_root.join(&rel), mod_time, file.md5_checksum.as_deref()).await {
        let mut plan = plan.lock().await;
        plan.total_bytes += file.size;
        plan.total_files += 1;
        plan.tasks.push(SyncTask {
            id: file.id.clone(),
            path: rel,
            size: file.size,
            mod_time,
        });
    }
    Ok(())
}

/// The decision ladder: missing or unreadable wins, then zero length, then
/// the timestamp check with the checksum as tie-breaker. The checksum is
/// only computed when the remote looks newer, so an up-to-date tree is
/// never re-hashed.
async fn needs_download(
    local: &Path,
    remote_modified: OffsetDateTime,
    remote_md5: Option<&str>,
) -> bool {
    let Ok(metadata) = tokio::fs::metadata(local).await else {
        return true;
    };
    if metadata.len() == 0 {
        return true;
    }
    let Ok(local_modified) = metadata.modified() else {
        return true;
    };
    if remote_modified <= OffsetDateTime::from(local_modified) {
        return false;
    }
    match (local_md5(local).await, remote_md5) {
        (Ok(local_md5), Some(remote_md5)) => !local_md5.eq_ignore_ascii_case(remote_md5),
        // An unobtainable checksum on either side counts as divergence.
        _ => true,
    }
}

async fn local_md5(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }
    Ok(format!("{:x}", context.compute()))
}

fn parse_modified_time(file: &DriveFile) -> Result<OffsetDateTime, SyncError> {
    let raw = file
        .modified_time
        .as_deref()
        .ok_or_else(|| SyncError::MissingTimestamp(file.name.clone()))?;
    let parsed = PrimitiveDateTime::parse(raw, MODIFIED_TIME_FORMAT)?;
    Ok(parsed.assume_utc())
}
