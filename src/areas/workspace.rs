use crate::artifacts::diff::change_record::EntryType;
use anyhow::Context;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// The checked out files of a repository
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    /// Resolve a user supplied path constraint to an absolute, normalized path
    ///
    /// Absolute paths are kept. Paths starting with `./` or `../` are taken
    /// relative to `cwd`, any other relative path (a bare `.` included)
    /// relative to the root. A path reaching the root through a symlinked
    /// ancestor is rewritten onto the canonical root.
    pub fn resolve_constraint(&self, cwd: &Path, constraint: &Path) -> anyhow::Result<PathBuf> {
        let text = constraint.to_string_lossy();
        let base = if text.starts_with("./") || text.starts_with("../") {
            cwd
        } else {
            &self.path
        };

        let absolute = constraint
            .absolutize_from(base)
            .with_context(|| format!("unable to resolve path {}", constraint.display()))?
            .into_owned();

        Ok(self.anchor(absolute))
    }

    fn anchor(&self, path: PathBuf) -> PathBuf {
        if path.starts_with(&self.path) {
            return path;
        }

        // a symlink in last position is only followed when it names the root
        let canonical = path
            .ancestors()
            .filter(|ancestor| {
                *ancestor != path
                    || !ancestor.is_symlink()
                    || ancestor
                        .canonicalize()
                        .is_ok_and(|target| target == *self.path)
            })
            .find_map(|ancestor| {
                let canonical = ancestor.canonicalize().ok()?;
                let rest = path.strip_prefix(ancestor).ok()?;
                Some(if rest.as_os_str().is_empty() {
                    canonical
                } else {
                    canonical.join(rest)
                })
            });

        match canonical {
            Some(canonical) => {
                trace!(from = %path.display(), to = %canonical.display(), "canonicalized constraint");
                canonical
            }
            None => path,
        }
    }

    /// Filesystem object kind of a root-relative path, `None` when it cannot
    /// be inspected
    pub async fn entry_type(&self, path: &str) -> Option<EntryType> {
        let full_path = self.path.join(path);

        match tokio::fs::symlink_metadata(&full_path).await {
            Ok(metadata) => Some(EntryType::from_metadata(&metadata)),
            Err(err) => {
                warn!(path = %full_path.display(), error = %err, "skipping untracked path");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn workspace(root: &str) -> Workspace {
        Workspace::new(PathBuf::from(root).into_boxed_path())
    }

    #[test]
    fn dots_inside_a_constraint_are_folded() -> TestResult {
        let workspace = workspace("/repo");

        assert_eq!(
            workspace.resolve_constraint(
                Path::new("/repo"),
                Path::new("/repo/./deep/../deep/down/.")
            )?,
            PathBuf::from("/repo/deep/down")
        );
        assert_eq!(
            workspace.resolve_constraint(Path::new("/repo"), Path::new("deep/../new"))?,
            PathBuf::from("/repo/new")
        );

        Ok(())
    }

    #[test]
    fn bare_relative_constraint_is_relative_to_root() -> TestResult {
        let workspace = workspace("/repo");

        assert_eq!(
            workspace.resolve_constraint(Path::new("/repo/deep"), Path::new("new"))?,
            PathBuf::from("/repo/new")
        );

        Ok(())
    }

    #[test]
    fn dotted_constraint_is_relative_to_cwd() -> TestResult {
        let workspace = workspace("/repo");

        assert_eq!(
            workspace.resolve_constraint(Path::new("/repo/deep"), Path::new("./down"))?,
            PathBuf::from("/repo/deep/down")
        );
        assert_eq!(
            workspace.resolve_constraint(Path::new("/repo/deep"), Path::new("../new"))?,
            PathBuf::from("/repo/new")
        );

        Ok(())
    }

    #[test]
    fn bare_dot_is_the_root() -> TestResult {
        let workspace = workspace("/repo");

        assert_eq!(
            workspace.resolve_constraint(Path::new("/repo/deep"), Path::new("."))?,
            PathBuf::from("/repo")
        );

        Ok(())
    }

    #[test]
    fn absolute_constraint_is_kept() -> TestResult {
        let workspace = workspace("/repo");

        assert_eq!(
            workspace.resolve_constraint(Path::new("/elsewhere"), Path::new("/repo/deep/"))?,
            PathBuf::from("/repo/deep")
        );

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn constraint_through_a_symlinked_root_is_canonicalized() -> TestResult {
        let dir = TempDir::new()?;
        dir.child("real").child("deep").create_dir_all()?;
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias"))?;
        let root = dir.path().join("real").canonicalize()?;
        let workspace = Workspace::new(root.clone().into_boxed_path());

        assert_eq!(
            workspace.resolve_constraint(&root, &dir.path().join("alias").join("deep"))?,
            root.join("deep")
        );
        assert_eq!(
            workspace.resolve_constraint(&root, &dir.path().join("alias").join("missing"))?,
            root.join("missing")
        );
        assert_eq!(
            workspace.resolve_constraint(&root, &dir.path().join("alias"))?,
            root
        );

        Ok(())
    }

    #[tokio::test]
    async fn entry_type_inspects_the_filesystem() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        dir.child("file").write_str("content")?;
        dir.child("dir").create_dir_all()?;
        let workspace = Workspace::new(dir.path().to_path_buf().into_boxed_path());

        assert_eq!(workspace.entry_type("file").await, Some(EntryType::File));
        assert_eq!(workspace.entry_type("dir").await, Some(EntryType::Directory));
        assert_eq!(workspace.entry_type("missing").await, None);

        Ok(())
    }
}
