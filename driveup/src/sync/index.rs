use std::collections::HashMap;

use drive_core::{DriveClient, DriveFile};

use super::SyncError;

/// One remote file or folder plus the parent link chosen by the tree
/// resolver.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub file: DriveFile,
    pub parent: Option<String>,
}

/// Every remote entry keyed by id. Built once per run, read-only after
/// the tree resolver links parents.
#[derive(Debug, Default)]
pub struct RemoteIndex {
    entries: HashMap<String, RemoteEntry>,
}

impl RemoteIndex {
    pub async fn build(client: &DriveClient) -> Result<Self, SyncError> {
        Ok(Self::from_files(client.list_all_files().await?))
    }

    pub fn from_files(files: Vec<DriveFile>) -> Self {
        let mut entries = HashMap::with_capacity(files.len());
        for file in files {
            entries.insert(file.id.clone(), RemoteEntry { file, parent: None });
        }
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&RemoteEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RemoteEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn set_parent(&mut self, id: &str, parent: Option<String>) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.parent = parent;
        }
    }
}
