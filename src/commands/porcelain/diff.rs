use crate::areas::git::FeedRequest;
use crate::areas::repository::Repository;
use crate::artifacts::diff::change_record::{
    ChangeRecord, ChangeSet, ChangeState, EntryType, StateFilter,
};
use crate::artifacts::diff::classifier::{ChangeClassifier, UntrackedMode};
use crate::artifacts::diff::error::DiffError;
use crate::artifacts::diff::path_filter::PathFilter;
use crate::artifacts::diff::raw_change::TrackedEntry;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_FROM: &str = "HEAD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `<state>: <path> (<type>)` per change
    #[default]
    Tailored,
    /// One JSON object per change
    Json,
}

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub from: String,
    /// No revision compares against the working tree
    pub to: Option<String>,
    pub paths: Vec<PathBuf>,
    pub untracked: UntrackedMode,
    pub report_clean: bool,
    pub state_filter: StateFilter,
    pub output_format: OutputFormat,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            from: DEFAULT_FROM.to_string(),
            to: None,
            paths: Vec::new(),
            untracked: UntrackedMode::default(),
            report_clean: false,
            state_filter: StateFilter::default(),
            output_format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Number of rendered changes
    Reported(usize),
    /// The comparison could not be made, with the reason
    Impossible(String),
}

#[derive(Serialize)]
struct DiffResult<'r> {
    action: &'static str,
    status: &'static str,
    path: &'r Path,
    state: ChangeState,
    #[serde(rename = "type")]
    entry_type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    gitshasum: Option<&'r str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_gitshasum: Option<&'r str>,
    parentds: &'r Path,
    refds: &'r Path,
}

#[derive(Serialize)]
struct ImpossibleResult<'r> {
    action: &'static str,
    status: &'static str,
    path: &'r Path,
    message: &'r str,
}

impl Repository {
    /// Compare two revisions, or a revision and the working tree, and render
    /// the changes
    ///
    /// Paths in `options.paths` are resolved against `cwd`. An unresolvable
    /// revision is not an error: it is reported as [`DiffOutcome::Impossible`].
    pub async fn diff(&self, options: &DiffOptions, cwd: &Path) -> anyhow::Result<DiffOutcome> {
        match self.diff_changes(options, cwd).await {
            Ok(changes) => {
                self.render(&changes, options.output_format)?;
                Ok(DiffOutcome::Reported(changes.len()))
            }
            Err(err) => match err.downcast_ref::<DiffError>() {
                Some(invalid @ DiffError::InvalidReference { .. }) => {
                    let message = invalid.to_string();
                    if options.output_format == OutputFormat::Json {
                        self.render_impossible(&message)?;
                    }
                    Ok(DiffOutcome::Impossible(message))
                }
                _ => Err(err),
            },
        }
    }

    /// Classified changes without rendering them
    pub async fn diff_changes(
        &self,
        options: &DiffOptions,
        cwd: &Path,
    ) -> anyhow::Result<ChangeSet> {
        let from = self.git().resolve(&options.from).await?;
        let to = self.git().resolve_target(options.to.as_deref()).await?;
        info!(from = %from.to_short_oid(), to = %to, "comparing");

        let constraints = options
            .paths
            .iter()
            .map(|path| self.workspace().resolve_constraint(cwd, path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let filter = PathFilter::new(constraints);

        let request = FeedRequest {
            untracked: to.is_worktree() && options.untracked != UntrackedMode::No,
            tracked: options.report_clean
                || (to.is_worktree() && options.untracked == UntrackedMode::Normal),
        };
        let feed = self
            .git()
            .compare(&from, &to, self.workspace(), request)
            .await?;

        let mut changes =
            ChangeClassifier::new(self.path(), options.untracked, &filter).classify(&feed)?;
        if options.report_clean {
            self.add_clean_records(&mut changes, &feed.tracked, &filter);
        }
        changes.retain(|_, record| record.state.matches_filter(options.state_filter));

        info!(count = changes.len(), "classified changes");
        Ok(changes)
    }

    fn add_clean_records(
        &self,
        changes: &mut ChangeSet,
        tracked: &[TrackedEntry],
        filter: &PathFilter,
    ) {
        for entry in tracked {
            let path = self.path().join(&entry.path);
            if changes.contains_key(&path) || !filter.matches(&path) {
                continue;
            }

            let record = ChangeRecord::new(path.clone(), ChangeState::Clean, entry.entry_type)
                .with_content_id(entry.oid.clone());
            changes.insert(path, record);
        }
    }

    fn render(&self, changes: &ChangeSet, format: OutputFormat) -> anyhow::Result<()> {
        for record in changes.values() {
            match format {
                OutputFormat::Tailored => self.render_tailored(record)?,
                OutputFormat::Json => self.render_json(record)?,
            }
        }

        self.writer().flush()?;
        Ok(())
    }

    fn render_tailored(&self, record: &ChangeRecord) -> anyhow::Result<()> {
        let relative = record
            .path
            .strip_prefix(self.path())
            .unwrap_or(record.path.as_path());
        let state = match record.state {
            ChangeState::Added => record.state.as_str().green(),
            ChangeState::Modified => record.state.as_str().yellow(),
            ChangeState::Deleted => record.state.as_str().red(),
            ChangeState::Untracked => record.state.as_str().cyan(),
            ChangeState::Clean => record.state.as_str().normal(),
        };

        writeln!(
            self.writer(),
            "{}: {} ({})",
            state,
            relative.display(),
            record.entry_type
        )?;

        Ok(())
    }

    fn render_json(&self, record: &ChangeRecord) -> anyhow::Result<()> {
        let result = DiffResult {
            action: "diff",
            status: "ok",
            path: &record.path,
            state: record.state,
            entry_type: record.entry_type,
            gitshasum: record.content_id.as_ref().map(AsRef::as_ref),
            prev_gitshasum: record.prev_content_id.as_ref().map(AsRef::as_ref),
            parentds: self.path(),
            refds: self.path(),
        };

        let line = serde_json::to_string(&result)?;
        writeln!(self.writer(), "{line}")?;

        Ok(())
    }

    fn render_impossible(&self, message: &str) -> anyhow::Result<()> {
        let result = ImpossibleResult {
            action: "diff",
            status: "impossible",
            path: self.path(),
            message,
        };

        let line = serde_json::to_string(&result)?;
        writeln!(self.writer(), "{line}")?;
        self.writer().flush()?;

        Ok(())
    }
}
