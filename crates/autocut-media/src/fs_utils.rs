//! File moves and removals for run-scoped files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MediaResult;

/// `EXDEV` on Linux and macOS.
const CROSS_DEVICE: i32 = 18;

/// Move `src` to `dst`, creating `dst`'s parent.
///
/// Across filesystems the file is copied into a uniquely named `.partial`
/// sibling of `dst` first, so `dst` never holds a truncated file and two
/// moves onto the same name never share a scratch file.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Err(e) if e.raw_os_error() == Some(CROSS_DEVICE) => {
            debug!("{} is on another device, copying", dst.display());
            let partial = partial_path(dst);
            fs::copy(src, &partial).await?;
            if let Err(e) = fs::rename(&partial, dst).await {
                let _ = fs::remove_file(&partial).await;
                return Err(e.into());
            }
            if let Err(e) = fs::remove_file(src).await {
                warn!("Left {} behind after copy: {}", src.display(), e);
            }
            Ok(())
        }
        result => Ok(result?),
    }
}

fn partial_path(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst.with_file_name(format!(".{}.{}.partial", name, Uuid::new_v4().simple()))
}

/// Remove `path`, trying once more after `retry_delay`.
///
/// Returns whether the file is gone; a file that never existed counts.
pub async fn remove_with_retry(path: impl AsRef<Path>, retry_delay: Duration) -> bool {
    let path = path.as_ref();

    for attempt in 0..2 {
        if attempt > 0 {
            tokio::time::sleep(retry_delay).await;
        }
        match fs::remove_file(path).await {
            Ok(()) => return true,
            Err(e) if e.kind() == ErrorKind::NotFound => return true,
            Err(e) if attempt == 0 => debug!("Removing {} failed: {}", path.display(), e),
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_creates_parent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("render.mp4");
        let dst = dir.path().join("out").join("final.mp4");
        fs::write(&src, b"frames").await.unwrap();

        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"frames");
    }

    #[test]
    fn test_partial_paths_are_unique_siblings() {
        let dst = Path::new("/out/final.mp4");
        let first = partial_path(dst);
        let second = partial_path(dst);

        assert_ne!(first, second);
        assert_eq!(first.parent(), dst.parent());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".final.mp4."));
        assert!(name.ends_with(".partial"));
    }

    #[tokio::test]
    async fn test_move_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let result = move_file(dir.path().join("nope.mp4"), dir.path().join("x.mp4")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.mp4");
        fs::write(&path, b"x").await.unwrap();

        assert!(remove_with_retry(&path, Duration::from_millis(1)).await);
        assert!(!path.exists());
        assert!(remove_with_retry(&path, Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn test_remove_gives_up_after_retry() {
        // remove_file refuses directories
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("busy");
        fs::create_dir(&path).await.unwrap();

        let started = std::time::Instant::now();
        assert!(!remove_with_retry(&path, Duration::from_millis(20)).await);
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(path.exists());
    }
}
