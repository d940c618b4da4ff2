//! Snapshot readers: file content as of a named revision

use super::run_git;
use crate::error::{LookupError, LookupResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Messages git prints when a path is absent from the requested tree
const MISSING_PATH_MARKERS: [&str; 2] = ["does not exist in", "exists on disk, but not in"];

/// Immutable file content addressed by (revision, path)
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Raw bytes of `path` at `revision`, `None` if the path is absent there
    async fn read(&self, revision: &str, path: &str) -> LookupResult<Vec<u8>>;

    /// Snapshot decoded as text; invalid UTF-8 sequences are replaced
    async fn read_text(&self, revision: &str, path: &str) -> LookupResult<String> {
        Ok(self
            .read(revision, path)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// One 1-based line of a snapshot, `None` when the file or line is absent
    async fn read_line(&self, revision: &str, path: &str, line: usize) -> LookupResult<String> {
        let Some(text) = self.read_text(revision, path).await? else {
            return Ok(None);
        };
        Ok(line
            .checked_sub(1)
            .and_then(|index| text.lines().nth(index))
            .map(str::to_string))
    }
}

/// Reads snapshots by running `git show <revision>:<path>`
#[derive(Debug, Clone)]
pub struct GitCliSnapshots {
    root: PathBuf,
    timeout: Duration,
}

impl GitCliSnapshots {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SnapshotSource for GitCliSnapshots {
    async fn read(&self, revision: &str, path: &str) -> LookupResult<Vec<u8>> {
        if !self.root.is_dir() {
            return Err(LookupError::external(
                "git show",
                "no repository",
                format!("{:?} is not a directory", self.root),
            ));
        }

        let object = format!("{}:{}", revision, path);
        let output = run_git(&self.root, &["show", &object], self.timeout).await?;

        if output.status.success() {
            // `git show` lists trees instead of failing on them
            if output.stdout.starts_with(format!("tree {}\n\n", object).as_bytes()) {
                debug!("{} is a directory at {}", path, revision);
                return Ok(None);
            }
            return Ok(Some(output.stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if MISSING_PATH_MARKERS.iter().any(|m| stderr.contains(m)) {
            debug!("{} not present at {}", path, revision);
            return Ok(None);
        }

        warn!("git show {} failed: {}", object, stderr.trim());
        Err(LookupError::external("git show", output.status, stderr.trim()))
    }
}

/// Reads snapshots through libgit2 without spawning processes
#[derive(Debug, Clone)]
pub struct GitObjectSnapshots {
    root: PathBuf,
}

impl GitObjectSnapshots {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_blocking(root: &Path, revision: &str, path: &str) -> LookupResult<Vec<u8>> {
        let libgit2_error = |e: git2::Error| {
            LookupError::external("libgit2", format!("{:?}", e.code()), e.message())
        };

        let repo = git2::Repository::open(root).map_err(libgit2_error)?;
        let commit = repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(libgit2_error)?;
        let tree = commit.tree().map_err(libgit2_error)?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(_) => return Ok(None),
        };

        let object = entry.to_object(&repo).map_err(libgit2_error)?;
        Ok(object.as_blob().map(|blob| blob.content().to_vec()))
    }
}

#[async_trait]
impl SnapshotSource for GitObjectSnapshots {
    async fn read(&self, revision: &str, path: &str) -> LookupResult<Vec<u8>> {
        let root = self.root.clone();
        let revision = revision.to_string();
        let path = path.to_string();

        tokio::task::spawn_blocking(move || Self::read_blocking(&root, &revision, &path))
            .await
            .map_err(|e| LookupError::external("libgit2", "task aborted", e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct InMemory(HashMap<String, &'static str>);

    #[async_trait]
    impl SnapshotSource for InMemory {
        async fn read(&self, _revision: &str, path: &str) -> LookupResult<Vec<u8>> {
            Ok(self.0.get(path).map(|s| s.as_bytes().to_vec()))
        }
    }

    #[tokio::test]
    async fn test_read_line_bounds() {
        let source = InMemory(HashMap::from([("a.c".to_string(), "one\ntwo\r\nthree\n")]));

        assert_eq!(source.read_line("v6.14", "a.c", 2).await.unwrap().as_deref(), Some("two"));
        assert_eq!(source.read_line("v6.14", "a.c", 3).await.unwrap().as_deref(), Some("three"));
        assert_eq!(source.read_line("v6.14", "a.c", 0).await.unwrap(), None);
        assert_eq!(source.read_line("v6.14", "a.c", 4).await.unwrap(), None);
        assert_eq!(source.read_line("v6.14", "b.c", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_git_show_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let source = GitCliSnapshots::new(dir.path(), Duration::from_nanos(1));
        let err = source.read("v6.14", "Makefile").await.unwrap_err();
        assert!(matches!(err, LookupError::Timeout { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let source = GitCliSnapshots::new("/nonexistent/kernel-lens", Duration::from_secs(5));
        let err = source.read("v6.14", "Makefile").await.unwrap_err();
        assert!(matches!(err, LookupError::ExternalService { .. }));
    }
}
