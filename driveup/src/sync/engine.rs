use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use drive_core::DriveClient;

use super::SyncError;
use super::compare;
use super::download::Downloader;
use super::index::RemoteIndex;
use super::progress::{
    STAGE_COMPARE, STAGE_DONE, STAGE_INDEX, STAGE_SYNC, STAGE_TREE, TransferProgress, set_progress,
};
use super::tree;
use crate::config::CONFIG_FILE_NAME;

/// Totals of one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub queued_files: u64,
    pub queued_bytes: u64,
}

/// One-shot mirror of the remote tree onto `dest_root`. The destination
/// and process name are injected so runs are fully testable.
pub struct Updater {
    client: DriveClient,
    dest_root: PathBuf,
    process_name: String,
    root_override: Option<String>,
    max_parallel: Option<usize>,
}

impl Updater {
    pub fn new(client: DriveClient, dest_root: PathBuf, process_name: String) -> Self {
        Self {
            client,
            dest_root,
            process_name,
            root_override: None,
            max_parallel: None,
        }
    }

    pub fn with_root_override(mut self, root_override: Option<String>) -> Self {
        self.root_override = root_override;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        set_progress(STAGE_INDEX, "Remote index...", false);
        let mut index = RemoteIndex::build(&self.client).await?;
        set_progress(STAGE_INDEX, "Remote index... OK", true);

        set_progress(STAGE_TREE, "File tree...", false);
        tree::link_parents(&mut index, self.root_override.as_deref());
        set_progress(STAGE_TREE, "File tree... OK", true);

        set_progress(STAGE_COMPARE, "Comparison...", false);
        let skip_names = HashSet::from([self.process_name.clone(), CONFIG_FILE_NAME.to_string()]);
        let plan =
            compare::build_plan(Arc::new(index), self.dest_root.clone(), skip_names).await?;
        set_progress(STAGE_COMPARE, "Comparison... OK", true);

        let report = SyncReport {
            queued_files: plan.total_files,
            queued_bytes: plan.total_bytes,
        };
        let progress = Arc::new(TransferProgress::new(plan.total_bytes, plan.total_files));
        set_progress(STAGE_SYNC, &progress.status(), false);
        let downloader = Downloader::new(
            self.client.clone(),
            self.dest_root.clone(),
            self.process_name.clone(),
            self.max_parallel,
        );
        downloader.run_all(plan.tasks, Arc::clone(&progress)).await?;
        set_progress(STAGE_SYNC, "Synchronization... OK", true);

        set_progress(STAGE_DONE, "All files up to date!", false);
        Ok(report)
    }
}
