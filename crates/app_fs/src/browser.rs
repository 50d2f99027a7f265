//! Directory listing used to discover albums and images

use crate::{FsError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory entry with the metadata needed for filtering
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub is_hidden: bool,
    /// Lowercased extension without the leading dot
    pub extension: String,
}

impl FileEntry {
    /// Create a new file entry from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Follows symlinks, so a link to a folder counts as a folder
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            is_hidden: name.starts_with('.'),
            name,
            is_dir: metadata.is_dir(),
            extension,
        })
    }

    /// Regular (non-directory) entry?
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// Options for listing directory contents
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub show_hidden: bool,
    pub show_directories: bool,
    pub show_files: bool,
    /// Lowercased extensions without dots; `None` accepts every file
    pub filter_extensions: Option<Vec<String>>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            show_directories: true,
            show_files: true,
            filter_extensions: None,
        }
    }
}

impl ListOptions {
    /// Visible subdirectories only (album discovery)
    pub fn directories_only() -> Self {
        Self {
            show_files: false,
            ..Default::default()
        }
    }

    /// Visible files whose extension is in the allowlist.
    /// Entries may be written as ".jpg", "jpg" or "JPG".
    pub fn files_with_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        let normalized = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            show_directories: false,
            filter_extensions: Some(normalized),
            ..Default::default()
        }
    }
}

/// List directory contents, sorted by name in byte order
pub fn list_directory<P: AsRef<Path>>(path: P, options: &ListOptions) -> Result<Vec<FileEntry>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FsError::NotFound(path.display().to_string()));
    }

    if !path.is_dir() {
        return Err(FsError::InvalidPath(format!("Not a directory: {}", path.display())));
    }

    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_entry = match FileEntry::from_path(entry.path()) {
            Ok(e) => e,
            Err(e) => {
                // Dangling symlinks and entries removed mid-scan
                tracing::debug!("Skipping unreadable entry {:?}: {}", entry.path(), e);
                continue;
            }
        };

        if !options.show_hidden && file_entry.is_hidden {
            continue;
        }

        if !options.show_directories && file_entry.is_dir {
            continue;
        }

        if !options.show_files && file_entry.is_file() {
            continue;
        }

        if let Some(ref exts) = options.filter_extensions {
            if file_entry.is_file() && !exts.contains(&file_entry.extension) {
                continue;
            }
        }

        entries.push(file_entry);
    }

    entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_directories_only_skips_hidden_and_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("dogs")).unwrap();
        fs::create_dir(dir.path().join("cats")).unwrap();
        fs::create_dir(dir.path().join(".thumbs")).unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let entries = list_directory(dir.path(), &ListOptions::directories_only()).unwrap();
        assert_eq!(names(&entries), vec!["cats", "dogs"]);
    }

    #[test]
    fn test_sort_is_case_sensitive_byte_order() {
        let dir = TempDir::new().unwrap();
        for name in ["beta", "Zeta", "alpha", "Alpha"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let entries = list_directory(dir.path(), &ListOptions::directories_only()).unwrap();
        assert_eq!(names(&entries), vec!["Alpha", "Zeta", "alpha", "beta"]);
    }

    #[test]
    fn test_extension_filter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        fs::write(dir.path().join("c.txt"), b"x").unwrap();
        fs::write(dir.path().join(".d.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join("e.jpg")).unwrap();

        let options = ListOptions::files_with_extensions(&[".jpg", "png"]);
        let entries = list_directory(dir.path(), &options).unwrap();
        assert_eq!(names(&entries), vec!["a.jpg", "b.PNG"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            list_directory(&missing, &ListOptions::default()),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            list_directory(&file, &ListOptions::default()),
            Err(FsError::InvalidPath(_))
        ));
    }
}
