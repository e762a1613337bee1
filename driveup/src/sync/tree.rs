use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use super::index::RemoteIndex;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("unknown entry id: {0}")]
    UnknownEntry(String),
    #[error("entry {entry} references missing parent {parent}")]
    DanglingParent { entry: String, parent: String },
    #[error("parent links form a cycle at {0}")]
    Cycle(String),
    #[error("entry name {0:?} is not a valid path component")]
    UnsupportedName(String),
}

/// Links every entry to its effective parent and returns the root id.
///
/// Entries listing several parents get the first one that resolves in the
/// index; an entry whose parents all resolve nowhere keeps the first id so
/// path resolution reports the dangling reference instead of silently
/// treating the entry as a root. A pinned root (or the auto-detected one)
/// has its parent link cleared so walks terminate there and paths come out
/// relative to it.
pub fn link_parents(index: &mut RemoteIndex, root_override: Option<&str>) -> Option<String> {
    let mut chosen: Vec<(String, String)> = Vec::new();
    let mut root_candidates: Vec<String> = Vec::new();

    for (id, entry) in index.iter() {
        if entry.file.parents.is_empty() {
            root_candidates.push(id.clone());
            continue;
        }
        let parent = entry
            .file
            .parents
            .iter()
            .find(|parent| index.contains(parent))
            .or_else(|| entry.file.parents.first())
            .cloned();
        if let Some(parent) = parent {
            chosen.push((id.clone(), parent));
        }
    }

    for (id, parent) in chosen {
        index.set_parent(&id, Some(parent));
    }

    let root_id = root_override
        .map(str::to_owned)
        .or_else(|| root_candidates.into_iter().min());
    if let Some(root_id) = &root_id {
        index.set_parent(root_id, None);
    }
    root_id
}

/// Walks parent links from the entry to the root, joining names into a
/// relative path. The root itself resolves to the empty path; callers skip
/// it. A dangling parent or a cycle surfaces as an error, never a panic.
pub fn resolve_path(index: &RemoteIndex, id: &str) -> Result<PathBuf, TreeError> {
    let mut current = index
        .get(id)
        .ok_or_else(|| TreeError::UnknownEntry(id.to_string()))?;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut parts: Vec<&str> = Vec::new();

    while let Some(parent_id) = current.parent.as_deref() {
        if !seen.insert(current.file.id.as_str()) {
            return Err(TreeError::Cycle(id.to_string()));
        }
        let name = current.file.name.as_str();
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(TreeError::UnsupportedName(name.to_string()));
        }
        parts.push(name);
        current = index.get(parent_id).ok_or_else(|| TreeError::DanglingParent {
            entry: id.to_string(),
            parent: parent_id.to_string(),
        })?;
    }

    let mut path = PathBuf::new();
    for part in parts.iter().rev() {
        path.push(part);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive_core::{DriveFile, FOLDER_MIME_TYPE};

    fn folder(id: &str, name: &str, parents: &[&str]) -> DriveFile {
        DriveFile {
            id: id.into(),
            name: name.into(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            mime_type: FOLDER_MIME_TYPE.into(),
            size: 0,
            md5_checksum: None,
            modified_time: None,
        }
    }

    fn file(id: &str, name: &str, parents: &[&str]) -> DriveFile {
        DriveFile {
            mime_type: "application/octet-stream".into(),
            ..folder(id, name, parents)
        }
    }

    #[test]
    fn root_resolves_to_the_empty_path() {
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            file("a", "data.bin", &["root"]),
        ]);
        let root = link_parents(&mut index, None);

        assert_eq!(root.as_deref(), Some("root"));
        assert_eq!(resolve_path(&index, "root").unwrap(), PathBuf::new());
    }

    #[test]
    fn path_joins_ancestor_names_from_root_to_entry() {
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            folder("d1", "maps", &["root"]),
            folder("d2", "winter", &["d1"]),
            file("a", "tundra.map", &["d2"]),
        ]);
        link_parents(&mut index, None);

        assert_eq!(
            resolve_path(&index, "a").unwrap(),
            PathBuf::from("maps").join("winter").join("tundra.map")
        );
    }

    #[test]
    fn first_resolvable_parent_wins() {
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            folder("d1", "one", &["root"]),
            folder("d2", "two", &["root"]),
            file("a", "data.bin", &["d1", "d2"]),
        ]);
        link_parents(&mut index, None);
        assert_eq!(
            resolve_path(&index, "a").unwrap(),
            PathBuf::from("one").join("data.bin")
        );

        // An unresolvable first parent falls through to the next one.
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            folder("d2", "two", &["root"]),
            file("a", "data.bin", &["ghost", "d2"]),
        ]);
        link_parents(&mut index, None);
        assert_eq!(
            resolve_path(&index, "a").unwrap(),
            PathBuf::from("two").join("data.bin")
        );
    }

    #[test]
    fn dangling_parent_is_an_error_not_a_root() {
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            file("a", "data.bin", &["ghost"]),
        ]);
        link_parents(&mut index, None);

        assert!(matches!(
            resolve_path(&index, "a"),
            Err(TreeError::DanglingParent { entry, parent }) if entry == "a" && parent == "ghost"
        ));
    }

    #[test]
    fn cycle_in_parent_links_is_detected() {
        let mut index = RemoteIndex::from_files(vec![
            folder("a", "one", &["b"]),
            folder("b", "two", &["a"]),
        ]);
        link_parents(&mut index, None);
        // Both entries have parents, so no auto-detected root breaks the loop.

        assert!(matches!(resolve_path(&index, "a"), Err(TreeError::Cycle(_))));
    }

    #[test]
    fn pinned_root_makes_paths_relative_to_it() {
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            folder("sub", "content", &["root"]),
            file("a", "data.bin", &["sub"]),
        ]);
        let root = link_parents(&mut index, Some("sub"));

        assert_eq!(root.as_deref(), Some("sub"));
        assert_eq!(resolve_path(&index, "sub").unwrap(), PathBuf::new());
        assert_eq!(resolve_path(&index, "a").unwrap(), PathBuf::from("data.bin"));
    }

    #[test]
    fn traversal_names_are_rejected() {
        let mut index = RemoteIndex::from_files(vec![
            folder("root", "top", &[]),
            file("a", "..", &["root"]),
        ]);
        link_parents(&mut index, None);

        assert!(matches!(
            resolve_path(&index, "a"),
            Err(TreeError::UnsupportedName(name)) if name == ".."
        ));
    }

    #[test]
    fn unknown_entry_is_an_error() {
        let index = RemoteIndex::from_files(Vec::new());
        assert!(matches!(
            resolve_path(&index, "ghost"),
            Err(TreeError::UnknownEntry(_))
        ));
    }
}
