//! Album discovery and the fixed-size slot table

use crate::config::validate_geometry;
use crate::{AppError, ModifierLayer};
use app_fs::{list_directory, ListOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A destination folder. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Album {
    pub name: String,
    pub path: PathBuf,
}

/// Ordered table of exactly `max_slots` entries, filled layer 0 first
#[derive(Debug, Clone)]
pub struct AlbumSlotTable {
    slots: Vec<Option<Album>>,
    slots_per_layer: usize,
    dropped: usize,
}

impl AlbumSlotTable {
    /// Discover the visible subdirectories of `album_directory` and assign
    /// them to slots in name order.
    pub fn build(
        album_directory: &Path,
        max_slots: usize,
        slots_per_layer: usize,
    ) -> Result<Self, AppError> {
        validate_geometry(max_slots, slots_per_layer)?;

        if !album_directory.is_dir() {
            return Err(AppError::NotFound(album_directory.to_path_buf()));
        }

        let root = album_directory.canonicalize()?;
        let entries = list_directory(&root, &ListOptions::directories_only())?;

        let albums: Vec<Album> = entries
            .into_iter()
            .map(|entry| Album {
                name: entry.name,
                path: entry.path,
            })
            .collect();

        tracing::debug!("Album directory {:?} has {} albums", root, albums.len());
        Self::from_albums(&root, albums, max_slots, slots_per_layer)
    }

    /// Pad or truncate an already sorted album list to `max_slots`
    fn from_albums(
        root: &Path,
        albums: Vec<Album>,
        max_slots: usize,
        slots_per_layer: usize,
    ) -> Result<Self, AppError> {
        if albums.is_empty() {
            return Err(AppError::EmptyAlbumSet(root.to_path_buf()));
        }

        let found = albums.len();
        let dropped = found.saturating_sub(max_slots);

        if dropped > 0 {
            tracing::warn!(
                "Album directory {:?} has too many albums ({}) - truncating to {}",
                root,
                found,
                max_slots
            );
        } else if found < max_slots {
            tracing::info!(
                "Album directory {:?} has {} albums - padding to {}",
                root,
                found,
                max_slots
            );
        }

        let mut slots: Vec<Option<Album>> = albums.into_iter().take(max_slots).map(Some).collect();
        slots.resize(max_slots, None);

        Ok(Self {
            slots,
            slots_per_layer,
            dropped,
        })
    }

    /// Bounds-checked lookup; out of range is treated as an empty slot
    pub fn lookup(&self, index: usize) -> Option<&Album> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots_per_layer(&self) -> usize {
        self.slots_per_layer
    }

    pub fn layer_count(&self) -> usize {
        self.slots.len() / self.slots_per_layer
    }

    /// Number of slots holding an album
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Albums discarded because they did not fit
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Option<Album>> {
        self.slots.iter()
    }

    /// `(slot index, album name)` for every slot of one layer
    pub fn layer_snapshot(&self, layer: ModifierLayer) -> Vec<(usize, Option<String>)> {
        let start = layer.ordinal() * self.slots_per_layer;
        let end = (start + self.slots_per_layer).min(self.slots.len());

        (start..end)
            .map(|index| (index, self.lookup(index).map(|a| a.name.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn album_dir(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        dir
    }

    fn populated_names(table: &AlbumSlotTable) -> Vec<String> {
        table
            .iter()
            .flatten()
            .map(|a| a.name.clone())
            .collect()
    }

    #[test]
    fn test_pads_to_max_slots_in_name_order() {
        let dir = album_dir(&["dogs", "cats", "birds"]);
        let table = AlbumSlotTable::build(dir.path(), 36, 9).unwrap();

        assert_eq!(table.len(), 36);
        assert_eq!(table.populated(), 3);
        assert_eq!(table.dropped(), 0);
        assert_eq!(populated_names(&table), vec!["birds", "cats", "dogs"]);
        assert!(table.iter().skip(3).all(Option::is_none));
    }

    #[test]
    fn test_truncates_excess_albums() {
        let names: Vec<String> = (0..40).map(|i| format!("album{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = album_dir(&refs);

        let table = AlbumSlotTable::build(dir.path(), 36, 9).unwrap();

        assert_eq!(table.len(), 36);
        assert_eq!(table.populated(), 36);
        assert_eq!(table.dropped(), 4);
        assert_eq!(populated_names(&table), names[..36].to_vec());
    }

    #[test]
    fn test_exactly_full() {
        let dir = album_dir(&["a", "b", "c", "d"]);
        let table = AlbumSlotTable::build(dir.path(), 4, 2).unwrap();
        assert_eq!(table.populated(), 4);
        assert_eq!(table.dropped(), 0);
        assert_eq!(table.layer_count(), 2);
    }

    #[test]
    fn test_hidden_and_files_excluded() {
        let dir = album_dir(&["cats", ".git"]);
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let table = AlbumSlotTable::build(dir.path(), 36, 9).unwrap();
        assert_eq!(populated_names(&table), vec!["cats"]);
    }

    #[test]
    fn test_empty_album_set() {
        let dir = album_dir(&[".hidden"]);
        assert!(matches!(
            AlbumSlotTable::build(dir.path(), 36, 9),
            Err(AppError::EmptyAlbumSet(_))
        ));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("albums");
        assert!(matches!(
            AlbumSlotTable::build(&missing, 36, 9),
            Err(AppError::NotFound(_))
        ));

        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            AlbumSlotTable::build(&file, 36, 9),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_bad_geometry() {
        let dir = album_dir(&["cats"]);
        assert!(matches!(
            AlbumSlotTable::build(dir.path(), 36, 7),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_lookup_out_of_range_is_empty() {
        let dir = album_dir(&["cats"]);
        let table = AlbumSlotTable::build(dir.path(), 36, 9).unwrap();
        assert!(table.lookup(0).is_some());
        assert!(table.lookup(1).is_none());
        assert!(table.lookup(36).is_none());
        assert!(table.lookup(usize::MAX).is_none());
    }

    #[test]
    fn test_album_paths_are_absolute() {
        let dir = album_dir(&["cats"]);
        let table = AlbumSlotTable::build(dir.path(), 36, 9).unwrap();
        let cats = table.lookup(0).unwrap();
        assert!(cats.path.is_absolute());
        assert!(cats.path.ends_with("cats"));
    }

    #[test]
    fn test_layer_snapshot() {
        let names: Vec<String> = (0..11).map(|i| format!("a{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = album_dir(&refs);
        let table = AlbumSlotTable::build(dir.path(), 36, 9).unwrap();

        let shift = table.layer_snapshot(ModifierLayer::Shift);
        assert_eq!(shift.len(), 9);
        assert_eq!(shift[0], (9, Some("a09".to_string())));
        assert_eq!(shift[1], (10, Some("a10".to_string())));
        assert_eq!(shift[2], (11, None));

        // Layer outside the table geometry has no slots
        assert!(table.layer_snapshot(ModifierLayer::GroupSwitch).is_empty());
    }
}
