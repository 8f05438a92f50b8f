// Local-disk ArtifactStore

use async_trait::async_trait;
use futures::future::BoxFuture;
use snapback_core::port::{base_name, ArtifactError, ArtifactStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// EXDEV: rename across filesystems
const CROSS_DEVICE_LINK: i32 = 18;

/// Artifact store over the local filesystem; paths are plain OS paths
#[derive(Debug, Default, Clone)]
pub struct LocalArtifactStore;

impl LocalArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn mkdirs(&self, path: &str) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| ArtifactError::io("mkdirs", path, e))
    }

    async fn copy_dir(&self, src: &str, dst: &str) -> Result<(), ArtifactError> {
        let meta = match tokio::fs::metadata(src).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound(src.to_string()))
            }
            Err(e) => return Err(ArtifactError::io("copy_dir", src, e)),
        };
        if !meta.is_dir() {
            return Err(ArtifactError::io("copy_dir", src, "not a directory"));
        }

        copy_dir_recursive(Path::new(src), Path::new(dst)).await?;
        debug!(src = %src, dst = %dst, "Directory copied");
        Ok(())
    }

    async fn move_to(&self, src: &str, dst_dir: &str) -> Result<(), ArtifactError> {
        if !self.exists(src).await {
            return Err(ArtifactError::NotFound(src.to_string()));
        }
        self.mkdirs(dst_dir).await?;

        let target = Path::new(dst_dir).join(base_name(src));
        if self.exists(&target.to_string_lossy()).await {
            return Err(ArtifactError::io(
                "move_to",
                target.to_string_lossy(),
                "target already exists",
            ));
        }

        match tokio::fs::rename(src, &target).await {
            Ok(()) => Ok(()),
            Err(e) if e.raw_os_error() == Some(CROSS_DEVICE_LINK) => {
                warn!(src = %src, dst = %target.display(), "Cross-device move, falling back to copy + delete");
                copy_dir_recursive(Path::new(src), &target).await?;
                self.delete(src).await
            }
            Err(e) => Err(ArtifactError::io("move_to", src, e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), ArtifactError> {
        let meta = match tokio::fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(ArtifactError::io("delete", path, e)),
        };

        let removed = if meta.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        };
        match removed {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArtifactError::io("delete", path, e)),
        }
    }
}

/// Recursively copy the contents of `src` into `dst`.
///
/// Links are followed so the copy holds real content. A dangling link fails,
/// as does a directory link leading back into a directory being copied.
fn copy_dir_recursive<'a>(src: &'a Path, dst: &'a Path) -> BoxFuture<'a, Result<(), ArtifactError>> {
    Box::pin(async move { copy_tree(src, dst, &mut Vec::new()).await })
}

/// `visiting` holds the canonical paths of the directories above `src`
fn copy_tree<'a>(
    src: &'a Path,
    dst: &'a Path,
    visiting: &'a mut Vec<PathBuf>,
) -> BoxFuture<'a, Result<(), ArtifactError>> {
    Box::pin(async move {
        let io = |op: &'static str, path: &Path, e: std::io::Error| {
            ArtifactError::io(op, path.to_string_lossy(), e)
        };

        let canonical = tokio::fs::canonicalize(src)
            .await
            .map_err(|e| io("copy_dir", src, e))?;
        if visiting.contains(&canonical) {
            return Err(ArtifactError::io(
                "copy_dir",
                src.to_string_lossy(),
                format!("link loops back to {}", canonical.display()),
            ));
        }
        visiting.push(canonical);

        tokio::fs::create_dir_all(dst)
            .await
            .map_err(|e| io("mkdirs", dst, e))?;

        let mut entries = tokio::fs::read_dir(src)
            .await
            .map_err(|e| io("copy_dir", src, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io("copy_dir", src, e))?
        {
            let src_path: PathBuf = entry.path();
            let dst_path = dst.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io("copy_dir", &src_path, e))?;

            let is_dir = if file_type.is_symlink() {
                tokio::fs::metadata(&src_path)
                    .await
                    .map_err(|e| io("copy_dir", &src_path, e))?
                    .is_dir()
            } else {
                file_type.is_dir()
            };

            if is_dir {
                copy_tree(&src_path, &dst_path, visiting).await?;
            } else {
                tokio::fs::copy(&src_path, &dst_path)
                    .await
                    .map_err(|e| io("copy_dir", &src_path, e))?;
            }
        }

        visiting.pop();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_copy_dir_copies_nested_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("app");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("conf.yaml"), "a: 1").unwrap();
        fs::write(src.join("lib/job.jar"), "jar").unwrap();
        let dst = tmp.path().join("backups/job-1/s1");

        let store = LocalArtifactStore::new();
        store.copy_dir(&path_str(&src), &path_str(&dst)).await.unwrap();

        assert_eq!(fs::read_to_string(dst.join("conf.yaml")).unwrap(), "a: 1");
        assert_eq!(fs::read_to_string(dst.join("lib/job.jar")).unwrap(), "jar");
        // Source untouched
        assert!(src.join("lib/job.jar").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_dir_follows_links() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let shared = tmp.path().join("shared/lib");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("udf.jar"), "udf").unwrap();
        fs::write(tmp.path().join("shared/app.yaml"), "a: 1").unwrap();

        let src = tmp.path().join("app");
        fs::create_dir_all(&src).unwrap();
        symlink(&shared, src.join("lib")).unwrap();
        symlink(tmp.path().join("shared/app.yaml"), src.join("app.yaml")).unwrap();
        let dst = tmp.path().join("backups/job-1/s1");

        let store = LocalArtifactStore::new();
        tokio_test::assert_ok!(store.copy_dir(&path_str(&src), &path_str(&dst)).await);

        let copied_lib = fs::symlink_metadata(dst.join("lib")).unwrap();
        assert!(copied_lib.is_dir(), "directory link must be copied as a directory");
        assert_eq!(fs::read_to_string(dst.join("lib/udf.jar")).unwrap(), "udf");
        assert!(fs::symlink_metadata(dst.join("app.yaml")).unwrap().is_file());
        assert_eq!(fs::read_to_string(dst.join("app.yaml")).unwrap(), "a: 1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_dir_rejects_dangling_and_looping_links() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new();

        let dangling = tmp.path().join("dangling");
        fs::create_dir_all(&dangling).unwrap();
        symlink(tmp.path().join("missing"), dangling.join("gone")).unwrap();
        let err = store
            .copy_dir(&path_str(&dangling), &path_str(&tmp.path().join("out-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { op: "copy_dir", .. }));

        let looping = tmp.path().join("looping");
        fs::create_dir_all(looping.join("conf")).unwrap();
        symlink(&looping, looping.join("conf/self")).unwrap();
        let err = store
            .copy_dir(&path_str(&looping), &path_str(&tmp.path().join("out-2")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("loops back"), "{}", err);
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new();
        let missing = path_str(&tmp.path().join("nope"));

        let err = store
            .copy_dir(&missing, &path_str(&tmp.path().join("dst")))
            .await
            .unwrap_err();
        assert_eq!(err, ArtifactError::NotFound(missing));
    }

    #[tokio::test]
    async fn test_move_keeps_base_name() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = tmp.path().join("backups/job-1/s1");
        fs::create_dir_all(&snapshot).unwrap();
        fs::write(snapshot.join("app.jar"), "v1").unwrap();
        let workspace = tmp.path().join("workspace");

        let store = LocalArtifactStore::new();
        store
            .move_to(&path_str(&snapshot), &path_str(&workspace))
            .await
            .unwrap();

        assert!(!snapshot.exists());
        assert_eq!(fs::read_to_string(workspace.join("s1/app.jar")).unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_move_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = tmp.path().join("backups/s1");
        fs::create_dir_all(&snapshot).unwrap();
        let workspace = tmp.path().join("workspace");
        fs::create_dir_all(workspace.join("s1")).unwrap();

        let store = LocalArtifactStore::new();
        let err = store
            .move_to(&path_str(&snapshot), &path_str(&workspace))
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { op: "move_to", .. }));
        assert!(snapshot.exists());
    }

    #[tokio::test]
    async fn test_delete_directory_file_and_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("apps/job-1");
        fs::create_dir_all(dir.join("lib")).unwrap();
        fs::write(dir.join("lib/job.jar"), "jar").unwrap();
        let file = tmp.path().join("single.txt");
        fs::write(&file, "x").unwrap();

        let store = LocalArtifactStore::new();
        tokio_test::assert_ok!(store.delete(&path_str(&dir)).await);
        tokio_test::assert_ok!(store.delete(&path_str(&file)).await);
        tokio_test::assert_ok!(store.delete(&path_str(&tmp.path().join("never"))).await);

        assert!(!dir.exists());
        assert!(!file.exists());
        assert!(!store.exists(&path_str(&dir)).await);
    }

    #[tokio::test]
    async fn test_mkdirs_then_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = path_str(&tmp.path().join("a/b/c"));

        let store = LocalArtifactStore::new();
        assert!(!store.exists(&nested).await);
        store.mkdirs(&nested).await.unwrap();
        assert!(store.exists(&nested).await);
    }
}
