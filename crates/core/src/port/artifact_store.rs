// Artifact Store Port
// Hierarchical artifact filesystem (local disk, HDFS, ...) keyed by opaque paths.
// No operation is atomic across process crashes; copies may complete partially.

use async_trait::async_trait;
use thiserror::Error;

/// Artifact store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("{op} failed for {path}: {message}")]
    Io {
        op: &'static str,
        path: String,
        message: String,
    },
}

impl ArtifactError {
    pub fn io(op: &'static str, path: impl Into<String>, message: impl ToString) -> Self {
        ArtifactError::Io {
            op,
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Artifact store trait
///
/// Implementations:
/// - LocalArtifactStore (infra-fs): local disk
/// - mocks::InMemoryArtifactStore: tests
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Check whether a file or directory exists at `path`
    async fn exists(&self, path: &str) -> bool;

    /// Create `path` and any missing parents
    async fn mkdirs(&self, path: &str) -> Result<(), ArtifactError>;

    /// Recursively copy the contents of directory `src` into `dst`, creating `dst`
    ///
    /// # Errors
    /// - ArtifactError::NotFound if `src` does not exist
    async fn copy_dir(&self, src: &str, dst: &str) -> Result<(), ArtifactError>;

    /// Move `src` into directory `dst_dir`, keeping its name
    /// (`dst_dir` is created when missing)
    async fn move_to(&self, src: &str, dst_dir: &str) -> Result<(), ArtifactError>;

    /// Recursively delete `path`; a missing path is not an error
    async fn delete(&self, path: &str) -> Result<(), ArtifactError>;
}

/// Last path segment
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Node {
        Dir,
        File(Vec<u8>),
    }

    /// In-memory artifact store with failure injection and an operation log
    #[derive(Default)]
    pub struct InMemoryArtifactStore {
        nodes: Arc<Mutex<BTreeMap<String, Node>>>,
        failures: Arc<Mutex<Vec<(String, String)>>>,
        ops: Arc<Mutex<Vec<String>>>,
        copy_delay: Arc<Mutex<Option<Duration>>>,
    }

    impl InMemoryArtifactStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Write a file, creating parent directories
        pub fn write_file(&self, path: &str, contents: &[u8]) {
            let mut nodes = self.nodes.lock().unwrap();
            insert_parents(&mut nodes, path);
            nodes.insert(path.to_string(), Node::File(contents.to_vec()));
        }

        pub fn read_file(&self, path: &str) -> Option<Vec<u8>> {
            match self.nodes.lock().unwrap().get(path) {
                Some(Node::File(bytes)) => Some(bytes.clone()),
                _ => None,
            }
        }

        /// Files below `root` as (relative path, contents), sorted
        pub fn tree(&self, root: &str) -> Vec<(String, Vec<u8>)> {
            let prefix = format!("{}/", root.trim_end_matches('/'));
            self.nodes
                .lock()
                .unwrap()
                .iter()
                .filter_map(|(path, node)| match node {
                    Node::File(bytes) if path.starts_with(&prefix) => {
                        Some((path[prefix.len()..].to_string(), bytes.clone()))
                    }
                    _ => None,
                })
                .collect()
        }

        /// Make `op` ("mkdirs", "copy_dir", "move_to", "delete") fail for paths under `prefix`.
        /// copy_dir matches on its destination, move_to on its source.
        pub fn fail_on(&self, op: &str, prefix: &str) {
            self.failures
                .lock()
                .unwrap()
                .push((op.to_string(), prefix.to_string()));
        }

        pub fn clear_failures(&self) {
            self.failures.lock().unwrap().clear();
        }

        /// Slow down every copy (used to widen race windows)
        pub fn set_copy_delay(&self, delay: Duration) {
            *self.copy_delay.lock().unwrap() = Some(delay);
        }

        /// Operation log as "op:path" entries, in call order
        pub fn ops(&self) -> Vec<String> {
            self.ops.lock().unwrap().clone()
        }

        fn record(&self, op: &str, path: &str) {
            self.ops.lock().unwrap().push(format!("{}:{}", op, path));
        }

        fn check(&self, op: &'static str, path: &str) -> Result<(), ArtifactError> {
            let failures = self.failures.lock().unwrap();
            if failures
                .iter()
                .any(|(o, prefix)| o == op && path.starts_with(prefix.as_str()))
            {
                return Err(ArtifactError::io(op, path, "injected failure"));
            }
            Ok(())
        }
    }

    fn insert_parents(nodes: &mut BTreeMap<String, Node>, path: &str) {
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            current.push('/');
            current.push_str(segment);
            nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    fn under(path: &str, root: &str) -> bool {
        path == root || path.starts_with(&format!("{}/", root))
    }

    #[async_trait]
    impl ArtifactStore for InMemoryArtifactStore {
        async fn exists(&self, path: &str) -> bool {
            self.nodes.lock().unwrap().contains_key(path)
        }

        async fn mkdirs(&self, path: &str) -> Result<(), ArtifactError> {
            self.record("mkdirs", path);
            self.check("mkdirs", path)?;
            let mut nodes = self.nodes.lock().unwrap();
            insert_parents(&mut nodes, path);
            nodes.entry(path.to_string()).or_insert(Node::Dir);
            Ok(())
        }

        async fn copy_dir(&self, src: &str, dst: &str) -> Result<(), ArtifactError> {
            self.record("copy_dir", &format!("{}->{}", src, dst));
            self.check("copy_dir", dst)?;
            let delay = *self.copy_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut nodes = self.nodes.lock().unwrap();
            if !nodes.contains_key(src) {
                return Err(ArtifactError::NotFound(src.to_string()));
            }
            let copied: Vec<(String, Node)> = nodes
                .iter()
                .filter(|(path, _)| under(path, src))
                .map(|(path, node)| (format!("{}{}", dst, &path[src.len()..]), node.clone()))
                .collect();
            insert_parents(&mut nodes, dst);
            for (path, node) in copied {
                nodes.insert(path, node);
            }
            Ok(())
        }

        async fn move_to(&self, src: &str, dst_dir: &str) -> Result<(), ArtifactError> {
            self.record("move_to", &format!("{}->{}", src, dst_dir));
            self.check("move_to", src)?;
            let target = format!("{}/{}", dst_dir.trim_end_matches('/'), base_name(src));

            let mut nodes = self.nodes.lock().unwrap();
            if !nodes.contains_key(src) {
                return Err(ArtifactError::NotFound(src.to_string()));
            }
            let moved: Vec<(String, Node)> = nodes
                .iter()
                .filter(|(path, _)| under(path, src))
                .map(|(path, node)| (path.clone(), node.clone()))
                .collect();
            insert_parents(&mut nodes, &target);
            for (path, node) in moved {
                nodes.remove(&path);
                nodes.insert(format!("{}{}", target, &path[src.len()..]), node);
            }
            Ok(())
        }

        async fn delete(&self, path: &str) -> Result<(), ArtifactError> {
            self.record("delete", path);
            self.check("delete", path)?;
            self.nodes
                .lock()
                .unwrap()
                .retain(|existing, _| !under(existing, path));
            Ok(())
        }
    }

}
