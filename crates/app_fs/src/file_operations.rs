//! File operations module
//! Provides the collision-safe move and trash operations used to file images

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::Xxh3;

/// File operation errors
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trash error: {0}")]
    #[cfg(feature = "trash-support")]
    Trash(#[from] trash::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Destination already exists: {0}")]
    Collision(PathBuf),

    #[error("Copy of {image} could not be verified: {reason}")]
    PartialMove { image: PathBuf, reason: String },

    #[error("No trash destination configured")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, MoveError>;

/// Where trashed images go
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashTarget {
    /// Trashing is disabled
    #[default]
    None,
    /// Holding directory, created on first use
    Directory(PathBuf),
    /// Platform recycle bin
    System,
}

/// How a cross-volume copy is checked before the source is removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Byte length must match
    #[default]
    Size,
    /// Byte length and xxh3 digest must match
    Checksum,
}

/// File operations the dispatch engine performs on the current image
pub trait FileMover: Send + Sync {
    /// Move an image into an album directory, returning its new path
    fn move_to(&self, image: &Path, album_dir: &Path) -> Result<PathBuf>;

    /// Leave an image where it is
    fn skip(&self, image: &Path) {
        tracing::debug!("Skipped: {}", image.display());
    }

    /// Move an image to the trash. Returns the new path when it is known.
    fn trash(&self, image: &Path) -> Result<Option<PathBuf>>;
}

/// Default implementation of file operations
#[derive(Debug, Clone, Default)]
pub struct DefaultFileMover {
    trash: TrashTarget,
    verify: VerifyMode,
}

impl DefaultFileMover {
    pub fn new(trash: TrashTarget, verify: VerifyMode) -> Self {
        Self { trash, verify }
    }

    /// Move `image` into `target_dir` without ever replacing an existing file
    fn move_into(&self, image: &Path, target_dir: &Path) -> Result<PathBuf> {
        let metadata = match fs::metadata(image) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MoveError::NotFound(image.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(MoveError::InvalidOperation(format!(
                "Not a regular file: {}",
                image.display()
            )));
        }

        if !target_dir.is_dir() {
            return Err(MoveError::NotFound(target_dir.to_path_buf()));
        }

        let file_name = image
            .file_name()
            .ok_or_else(|| MoveError::InvalidOperation("Invalid file name".to_string()))?;
        let target = target_dir.join(file_name);

        // symlink_metadata also catches dangling links at the destination
        if fs::symlink_metadata(&target).is_ok() {
            return Err(MoveError::Collision(target));
        }

        self.place(image, &target, |from, to| fs::hard_link(from, to))?;
        release_source(image, &target, |path| fs::remove_file(path))?;

        tracing::info!("Moved: {} -> {}", image.display(), target.display());
        Ok(target)
    }

    /// Make `target` a second name for `image`. `link` fails atomically if
    /// `target` exists, so a file appearing after the collision check is never
    /// replaced. Across volumes the image is copied and verified instead.
    fn place<L>(&self, image: &Path, target: &Path, link: L) -> Result<()>
    where
        L: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        match link(image, target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(MoveError::Collision(target.to_path_buf()))
            }
            Err(e) if is_cross_device(&e) || e.kind() == io::ErrorKind::Unsupported => {
                tracing::info!(
                    "Cross-filesystem move, using copy+verify+delete: {} -> {}",
                    image.display(),
                    target.display()
                );
                copy_verified(image, target, self.verify)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Remove the original once `target` holds the image. If that fails the
/// new name is removed again so the image exists in exactly one place.
fn release_source<R>(image: &Path, target: &Path, remove: R) -> Result<()>
where
    R: FnOnce(&Path) -> io::Result<()>,
{
    if let Err(e) = remove(image) {
        tracing::warn!("Could not remove {}, rolling back: {}", image.display(), e);
        let _ = fs::remove_file(target);
        return Err(e.into());
    }
    Ok(())
}

impl FileMover for DefaultFileMover {
    fn move_to(&self, image: &Path, album_dir: &Path) -> Result<PathBuf> {
        self.move_into(image, album_dir)
    }

    fn trash(&self, image: &Path) -> Result<Option<PathBuf>> {
        match &self.trash {
            TrashTarget::None => Err(MoveError::NotConfigured),
            TrashTarget::Directory(dir) => {
                if !dir.exists() {
                    fs::create_dir_all(dir)?;
                    tracing::info!("Created trash directory: {}", dir.display());
                }
                self.move_into(image, dir).map(Some)
            }
            TrashTarget::System => trash_system(image).map(|()| None),
        }
    }
}

#[cfg(feature = "trash-support")]
fn trash_system(image: &Path) -> Result<()> {
    if !image.exists() {
        return Err(MoveError::NotFound(image.to_path_buf()));
    }

    trash::delete(image)?;
    tracing::info!("Moved to system trash: {}", image.display());
    Ok(())
}

#[cfg(not(feature = "trash-support"))]
fn trash_system(_image: &Path) -> Result<()> {
    Err(MoveError::InvalidOperation(
        "System trash feature not enabled".to_string(),
    ))
}

/// Unix: EXDEV = 18, Windows: ERROR_NOT_SAME_DEVICE = 0x11 (17)
fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        Some(18) => cfg!(unix),
        Some(17) => cfg!(windows),
        _ => false,
    }
}

/// Copy `image` to a fresh `target` and verify it. On any failure the
/// partial copy is removed and `image` is left untouched.
fn copy_verified(image: &Path, target: &Path, verify: VerifyMode) -> Result<()> {
    copy_checked(image, target, |image, target| verify_copy(image, target, verify))
}

fn copy_checked<C>(image: &Path, target: &Path, check: C) -> Result<()>
where
    C: FnOnce(&Path, &Path) -> Result<()>,
{
    let mut reader = File::open(image)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => MoveError::Collision(target.to_path_buf()),
            _ => MoveError::Io(e),
        })?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all());
    drop(writer);

    if let Err(e) = copied {
        let _ = fs::remove_file(target);
        return Err(e.into());
    }

    if let Err(e) = check(image, target) {
        let _ = fs::remove_file(target);
        return Err(e);
    }

    Ok(())
}

fn verify_copy(image: &Path, target: &Path, verify: VerifyMode) -> Result<()> {
    let expected = fs::metadata(image)?.len();
    let actual = fs::metadata(target)?.len();

    if expected != actual {
        return Err(MoveError::PartialMove {
            image: image.to_path_buf(),
            reason: format!("expected {} bytes, found {}", expected, actual),
        });
    }

    if verify == VerifyMode::Checksum && checksum(image)? != checksum(target)? {
        return Err(MoveError::PartialMove {
            image: image.to_path_buf(),
            reason: "checksum mismatch".to_string(),
        });
    }

    Ok(())
}

/// xxh3-64 digest of a file's contents
pub fn checksum(path: &Path) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let mut hasher = Xxh3::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.digest())
}
