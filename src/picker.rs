//! Folder picker results handed over by the host environment.
//!
//! The native dialog yields an absolute directory or nothing when the user
//! cancels. The browser fallback only exposes the relative paths of the
//! files inside the chosen directory, so the folder is derived from the
//! first file by stripping its file name. Either way the result still has
//! to pass [`crate::sandbox`] before it is scanned.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderSelection {
    Native(Option<PathBuf>),
    Browser(Vec<String>),
}

impl FolderSelection {
    pub fn resolve(&self) -> Option<String> {
        match self {
            FolderSelection::Native(path) => path.as_ref().map(|p| p.display().to_string()),
            FolderSelection::Browser(relative_paths) => relative_paths
                .first()
                .and_then(|first| folder_from_relative_path(first)),
        }
    }
}

/// `"reports/q1/a.xml"` → `"reports/q1"`. `None` when there is no folder part.
pub fn folder_from_relative_path(relative: &str) -> Option<String> {
    let normalized = relative.trim().replace('\\', "/");
    let (folder, _file) = normalized.rsplit_once('/')?;
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        None
    } else {
        Some(folder.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_selection_passes_through() {
        let selection = FolderSelection::Native(Some(PathBuf::from("/home/me/test-data")));
        assert_eq!(selection.resolve().as_deref(), Some("/home/me/test-data"));
        assert_eq!(FolderSelection::Native(None).resolve(), None);
    }

    #[test]
    fn browser_selection_uses_first_file() {
        let selection = FolderSelection::Browser(vec![
            "q1/a.xml".to_string(),
            "q1/nested/b.xml".to_string(),
        ]);
        assert_eq!(selection.resolve().as_deref(), Some("q1"));

        let windows = FolderSelection::Browser(vec![r"test-data\q2\c.xml".to_string()]);
        assert_eq!(windows.resolve().as_deref(), Some("test-data/q2"));
    }

    #[test]
    fn browser_selection_without_folder_is_none() {
        assert_eq!(FolderSelection::Browser(vec![]).resolve(), None);
        assert_eq!(FolderSelection::Browser(vec!["a.xml".into()]).resolve(), None);
        assert_eq!(folder_from_relative_path("/a.xml"), None);
    }
}
