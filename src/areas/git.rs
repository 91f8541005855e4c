//! Git plumbing driver
//!
//! Produces the raw comparison feed by running `git` subprocesses. Only
//! plumbing commands with NUL separated output are used, so paths never need
//! unquoting:
//!
//! - `rev-parse --verify` resolves revisions to trees
//! - `diff-tree` compares two trees
//! - `diff-index` compares a tree with the working tree
//! - `ls-files` / `ls-tree` list untracked and tracked paths

use crate::areas::workspace::Workspace;
use crate::artifacts::diff::change_record::EntryType;
use crate::artifacts::diff::classifier::ComparisonFeed;
use crate::artifacts::diff::diff_target::DiffTarget;
use crate::artifacts::diff::error::DiffError;
use crate::artifacts::diff::raw_change::{
    RawChange, TrackedEntry, parse_index_listing, parse_path_listing, parse_raw_diff,
    parse_tree_listing,
};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::revision::Revision;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_GIT_BINARY: &str = "git";
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 60;

/// How git is invoked
#[derive(Debug, Clone)]
pub struct GitConfig {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl GitConfig {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_GIT_BINARY,
            Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS),
        )
    }
}

/// Which listings a comparison needs besides the raw diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedRequest {
    pub untracked: bool,
    pub tracked: bool,
}

#[derive(Debug)]
pub struct GitPlumbing {
    config: GitConfig,
    root: Box<Path>,
}

impl GitPlumbing {
    pub fn new(config: GitConfig, root: Box<Path>) -> Self {
        GitPlumbing { config, root }
    }

    /// Top-level directory of the repository containing `path`
    pub async fn toplevel(config: &GitConfig, path: &Path) -> anyhow::Result<PathBuf> {
        let output = Self::run_in(config, path, &["rev-parse", "--show-toplevel"]).await?;
        if !output.status.success() {
            anyhow::bail!(
                "not a git repository: {} ({})",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let toplevel = String::from_utf8(output.stdout)
            .context("git printed a non UTF-8 top-level directory")?;
        let toplevel = PathBuf::from(toplevel.trim_end_matches(['\n', '\r']));

        toplevel
            .canonicalize()
            .with_context(|| format!("unable to canonicalize {}", toplevel.display()))
    }

    /// Resolve a revision to the id of its tree
    ///
    /// Fails with [`DiffError::InvalidReference`] carrying `revision` when the
    /// syntax is invalid or git cannot resolve it.
    pub async fn resolve(&self, revision: &str) -> anyhow::Result<ObjectId> {
        let parsed = Revision::try_parse(revision)?;
        if parsed.is_empty_tree() {
            return Ok(ObjectId::empty_tree());
        }

        let spec = format!("{}^{{tree}}", parsed.to_git_spec());
        let output = self
            .run(&["rev-parse", "--verify", "--quiet", &spec])
            .await?;
        if !output.status.success() {
            return Err(DiffError::invalid_reference(revision).into());
        }

        let oid = String::from_utf8(output.stdout).context("git printed a non UTF-8 object id")?;
        ObjectId::try_parse(oid.trim().to_string())
    }

    /// Resolve the "to" side; no revision means the working tree
    pub async fn resolve_target(&self, revision: Option<&str>) -> anyhow::Result<DiffTarget> {
        match revision {
            Some(revision) => Ok(DiffTarget::Tree(self.resolve(revision).await?)),
            None => Ok(DiffTarget::Worktree),
        }
    }

    pub async fn diff_trees(
        &self,
        from: &ObjectId,
        to: &ObjectId,
    ) -> anyhow::Result<Vec<RawChange>> {
        let output = self
            .run_checked(&[
                "diff-tree",
                "-r",
                "-z",
                "--raw",
                "--no-renames",
                "--full-index",
                from.as_ref(),
                to.as_ref(),
            ])
            .await?;

        parse_raw_diff(&output)
    }

    pub async fn diff_worktree(&self, from: &ObjectId) -> anyhow::Result<Vec<RawChange>> {
        let output = self
            .run_checked(&[
                "diff-index",
                "-z",
                "--raw",
                "--no-renames",
                "--full-index",
                from.as_ref(),
            ])
            .await?;

        parse_raw_diff(&output)
    }

    /// Untracked, not ignored paths as raw records
    ///
    /// git lists a nested repository once, with a trailing `/`.
    pub async fn untracked(&self, workspace: &Workspace) -> anyhow::Result<Vec<RawChange>> {
        let output = self
            .run_checked(&["ls-files", "-z", "--others", "--exclude-standard"])
            .await?;

        let mut changes = Vec::new();
        for path in parse_path_listing(&output)? {
            if path.ends_with('/') {
                changes.push(RawChange::untracked(path, EntryType::Dataset));
                continue;
            }

            if let Some(entry_type) = workspace.entry_type(&path).await {
                changes.push(RawChange::untracked(path, entry_type));
            }
        }

        Ok(changes)
    }

    /// Every path recorded on the `target` side
    pub async fn tracked(&self, target: &DiffTarget) -> anyhow::Result<Vec<TrackedEntry>> {
        match target {
            DiffTarget::Worktree => {
                let output = self.run_checked(&["ls-files", "-s", "-z"]).await?;
                parse_index_listing(&output)
            }
            DiffTarget::Tree(oid) => {
                let output = self
                    .run_checked(&["ls-tree", "-r", "-z", "--full-tree", oid.as_ref()])
                    .await?;
                parse_tree_listing(&output)
            }
        }
    }

    /// Collect everything needed to classify the changes from `from` to `to`
    pub async fn compare(
        &self,
        from: &ObjectId,
        to: &DiffTarget,
        workspace: &Workspace,
        request: FeedRequest,
    ) -> anyhow::Result<ComparisonFeed> {
        match to {
            DiffTarget::Tree(to_tree) => {
                let (changes, tracked) =
                    tokio::try_join!(self.diff_trees(from, to_tree), self.tracked_if(request, to))?;

                Ok(ComparisonFeed { changes, tracked })
            }
            DiffTarget::Worktree => {
                self.refresh_index().await;

                let (mut changes, untracked, tracked) = tokio::try_join!(
                    self.diff_worktree(from),
                    self.untracked_if(request, workspace),
                    self.tracked_if(request, to)
                )?;
                changes.extend(untracked);

                Ok(ComparisonFeed { changes, tracked })
            }
        }
    }

    async fn tracked_if(
        &self,
        request: FeedRequest,
        target: &DiffTarget,
    ) -> anyhow::Result<Vec<TrackedEntry>> {
        if request.tracked {
            self.tracked(target).await
        } else {
            Ok(Vec::new())
        }
    }

    async fn untracked_if(
        &self,
        request: FeedRequest,
        workspace: &Workspace,
    ) -> anyhow::Result<Vec<RawChange>> {
        if request.untracked {
            self.untracked(workspace).await
        } else {
            Ok(Vec::new())
        }
    }

    /// Refresh cached stat info so touched but unchanged files do not show up
    /// as modified
    async fn refresh_index(&self) {
        match self.run(&["update-index", "-q", "--refresh"]).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "unable to refresh the index"
            ),
            Err(err) => warn!(error = %err, "unable to refresh the index"),
        }
    }

    async fn run_checked(&self, args: &[&str]) -> anyhow::Result<Vec<u8>> {
        let output = self.run(args).await?;
        if !output.status.success() {
            anyhow::bail!(
                "git {} failed with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output.stdout)
    }

    async fn run(&self, args: &[&str]) -> anyhow::Result<Output> {
        Self::run_in(&self.config, &self.root, args).await
    }

    async fn run_in(config: &GitConfig, dir: &Path, args: &[&str]) -> anyhow::Result<Output> {
        let started = Instant::now();

        let mut command = tokio::process::Command::new(&config.binary);
        command
            .current_dir(dir)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(config.timeout, command.output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "git {} timed out after {}s",
                    args.join(" "),
                    config.timeout.as_secs()
                )
            })?
            .with_context(|| format!("failed to run {}", config.binary.display()))?;

        debug!(
            args = ?args,
            status = %output.status,
            elapsed = ?started.elapsed(),
            "git invocation"
        );

        Ok(output)
    }
}
