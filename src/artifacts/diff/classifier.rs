use crate::artifacts::diff::change_record::{ChangeRecord, ChangeSet, ChangeState};
use crate::artifacts::diff::error::DiffError;
use crate::artifacts::diff::path_filter::PathFilter;
use crate::artifacts::diff::raw_change::{RawChange, StatusCode, TrackedEntry};
use crate::artifacts::diff::untracked_tree::{CollapsedEntry, UntrackedTree};
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use std::collections::BTreeSet;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// How untracked content is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UntrackedMode {
    /// Report every untracked file individually
    All,
    /// Report a fully untracked directory as a single entry
    #[default]
    Normal,
    /// Leave untracked content out
    No,
}

/// Everything the classifier needs from one comparison
///
/// `changes` covers the whole repository, never pre-filtered by path.
/// `tracked` lists the paths recorded on the "to" side; it is only consulted
/// when untracked content is collapsed.
#[derive(Debug, Clone, Default)]
pub struct ComparisonFeed {
    pub changes: Vec<RawChange>,
    pub tracked: Vec<TrackedEntry>,
}

/// Turns raw comparison records into a path-keyed, filtered change set
#[derive(Debug, new)]
pub struct ChangeClassifier<'c> {
    root: &'c Path,
    untracked_mode: UntrackedMode,
    filter: &'c PathFilter,
}

impl<'c> ChangeClassifier<'c> {
    pub fn classify(&self, feed: &ComparisonFeed) -> Result<ChangeSet, DiffError> {
        let mut change_set = ChangeSet::new();
        let (untracked, mut changes): (Vec<&RawChange>, Vec<&RawChange>) = feed
            .changes
            .iter()
            .partition(|change| change.status == StatusCode::Untracked);
        // the strongest record of a path comes first, whatever the feed order
        changes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| Self::strength(b).cmp(&Self::strength(a)))
        });

        for change in changes {
            let record = ChangeRecord::new(
                self.absolute(&change.path),
                change.status.state(),
                change.entry_type,
            )
            .with_content_id(change.to_id.clone())
            .with_prev_content_id(change.from_id.clone());

            if !self.filter.matches(&record.path) {
                trace!(path = %record.path.display(), "outside of path constraints");
                continue;
            }

            match change_set.entry(record.path.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(existing) => {
                    debug!(
                        path = %existing.key().display(),
                        "repeated raw record, keeping the strongest one"
                    );
                }
            }
        }

        let untracked = match self.untracked_mode {
            UntrackedMode::No => Vec::new(),
            UntrackedMode::All => untracked
                .into_iter()
                .map(|change| CollapsedEntry {
                    path: change.path.trim_end_matches('/').to_string(),
                    entry_type: change.entry_type,
                })
                .collect(),
            UntrackedMode::Normal => {
                let collapsed = self.collapse_untracked(&untracked, &feed.tracked);
                Self::check_disjoint(&collapsed)?;
                collapsed
            }
        };

        for entry in untracked {
            let record = ChangeRecord::new(
                self.absolute(&entry.path),
                ChangeState::Untracked,
                entry.entry_type,
            );
            self.insert_untracked(&mut change_set, record)?;
        }

        Ok(change_set)
    }

    fn strength(change: &RawChange) -> (u8, &Option<ObjectId>, &Option<ObjectId>) {
        (change.status.precedence(), &change.to_id, &change.from_id)
    }

    fn collapse_untracked(
        &self,
        untracked: &[&RawChange],
        tracked: &[TrackedEntry],
    ) -> Vec<CollapsedEntry> {
        if untracked.is_empty() {
            return Vec::new();
        }

        let mut tree = UntrackedTree::new();
        for change in untracked {
            tree.insert_untracked(&change.path, change.entry_type);
        }
        for entry in tracked {
            tree.mark_tracked(&entry.path);
        }

        tree.collapse(|dir| self.filter.constrains_below(&self.absolute_path(dir)))
    }

    fn insert_untracked(
        &self,
        change_set: &mut ChangeSet,
        record: ChangeRecord,
    ) -> Result<(), DiffError> {
        if !self.filter.matches(&record.path) {
            trace!(path = %record.path.display(), "outside of path constraints");
            return Ok(());
        }

        match change_set.entry(record.path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            // removed from the index but still on disk
            Entry::Occupied(mut slot) if slot.get().state == ChangeState::Deleted => {
                debug!(path = %slot.key().display(), "deleted path is present as untracked");
                slot.insert(record);
            }
            Entry::Occupied(slot) => {
                return Err(DiffError::InvariantViolation(format!(
                    "{} reported as both {} and untracked",
                    slot.key().display(),
                    slot.get().state
                )));
            }
        }

        Ok(())
    }

    /// No collapsed entry may repeat or contain another one
    fn check_disjoint(entries: &[CollapsedEntry]) -> Result<(), DiffError> {
        let mut paths = BTreeSet::new();
        for entry in entries {
            if !paths.insert(PathBuf::from(&entry.path)) {
                return Err(DiffError::InvariantViolation(format!(
                    "{} reported twice",
                    entry.path
                )));
            }
        }

        // component-wise ordering puts descendants right after their ancestor
        let paths = paths.into_iter().collect::<Vec<_>>();
        if let Some(pair) = paths.windows(2).find(|pair| pair[1].starts_with(&pair[0])) {
            return Err(DiffError::InvariantViolation(format!(
                "{} reported inside collapsed {}",
                pair[1].display(),
                pair[0].display()
            )));
        }

        Ok(())
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.absolute_path(Path::new(path.trim_end_matches('/')))
    }

    fn absolute_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}
