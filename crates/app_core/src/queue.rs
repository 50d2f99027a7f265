//! Snapshot of the images to file and the forward-only cursor over them

use crate::AppError;
use app_fs::{list_directory, ListOptions};
use std::path::{Path, PathBuf};

/// Images found in the source directory when the session started
#[derive(Debug, Clone, Default)]
pub struct ImageQueue {
    images: Vec<PathBuf>,
    cursor: usize,
}

impl ImageQueue {
    /// Scan `source` once for files in the extension allowlist
    pub fn scan<S: AsRef<str>>(source: &Path, extensions: &[S]) -> Result<Self, AppError> {
        if !source.is_dir() {
            return Err(AppError::NotFound(source.to_path_buf()));
        }

        let root = source.canonicalize()?;
        let entries = list_directory(&root, &ListOptions::files_with_extensions(extensions))?;
        let images: Vec<PathBuf> = entries.into_iter().map(|e| e.path).collect();

        tracing::info!("{} items found in {:?}", images.len(), root);
        Ok(Self::from_paths(images))
    }

    pub fn from_paths(images: Vec<PathBuf>) -> Self {
        Self { images, cursor: 0 }
    }

    pub fn current(&self) -> Option<&Path> {
        self.images.get(self.cursor).map(PathBuf::as_path)
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Images not yet filed or skipped, including the current one
    pub fn remaining(&self) -> usize {
        self.images.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.images.len()
    }

    /// Move past the current image. Returns false once exhausted.
    pub fn advance(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.cursor += 1;
        !self.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "C.JPG", "notes.txt", ".hidden.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("album.jpg")).unwrap();

        let queue = ImageQueue::scan(dir.path(), &[".jpg", ".png"]).unwrap();
        let names: Vec<_> = queue
            .images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["C.JPG", "a.jpg", "b.png"]);
    }

    #[test]
    fn test_snapshot_ignores_new_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        let queue = ImageQueue::scan(dir.path(), &["jpg"]).unwrap();

        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cursor_moves_forward_only() {
        let mut queue = ImageQueue::from_paths(vec!["a.jpg".into(), "b.jpg".into()]);
        assert_eq!(queue.current(), Some(Path::new("a.jpg")));
        assert_eq!(queue.remaining(), 2);

        assert!(queue.advance());
        assert_eq!(queue.current(), Some(Path::new("b.jpg")));

        assert!(!queue.advance());
        assert!(queue.is_exhausted());
        assert_eq!(queue.current(), None);
        assert_eq!(queue.remaining(), 0);

        assert!(!queue.advance());
        assert_eq!(queue.position(), 2);
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ImageQueue::scan(&dir.path().join("nope"), &["jpg"]),
            Err(AppError::NotFound(_))
        ));
    }
}
