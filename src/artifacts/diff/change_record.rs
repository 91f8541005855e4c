use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

bitflags! {
    /// Subset of states a caller wants to see, in `--diff-filter` letters
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct StateFilter: u32 {
        const ADDED = 0b00001;
        const MODIFIED = 0b00010;
        const DELETED = 0b00100;
        const UNTRACKED = 0b01000;
        const CLEAN = 0b10000;
    }
}

impl StateFilter {
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'M' => filter |= Self::MODIFIED,
                'D' => filter |= Self::DELETED,
                'U' => filter |= Self::UNTRACKED,
                'C' => filter |= Self::CLEAN,
                _ => return None,
            }
        }

        Some(filter)
    }
}

impl Default for StateFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Added,
    Modified,
    Deleted,
    Untracked,
    Clean,
}

impl ChangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeState::Added => "added",
            ChangeState::Modified => "modified",
            ChangeState::Deleted => "deleted",
            ChangeState::Untracked => "untracked",
            ChangeState::Clean => "clean",
        }
    }

    pub fn matches_filter(&self, filter: StateFilter) -> bool {
        match self {
            ChangeState::Added => filter.contains(StateFilter::ADDED),
            ChangeState::Modified => filter.contains(StateFilter::MODIFIED),
            ChangeState::Deleted => filter.contains(StateFilter::DELETED),
            ChangeState::Untracked => filter.contains(StateFilter::UNTRACKED),
            ChangeState::Clean => filter.contains(StateFilter::CLEAN),
        }
    }
}

impl std::fmt::Display for ChangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filesystem object kind on the reported side of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    /// A nested repository (gitlink, mode 160000)
    Dataset,
}

impl EntryType {
    /// Map a git file mode to an entry type, `None` for the absent mode `000000`
    pub fn try_from_mode(mode: &str) -> anyhow::Result<Option<Self>> {
        match mode {
            "000000" => Ok(None),
            "100644" | "100755" | "100664" => Ok(Some(EntryType::File)),
            "120000" => Ok(Some(EntryType::Symlink)),
            "160000" => Ok(Some(EntryType::Dataset)),
            "040000" | "40000" => Ok(Some(EntryType::Directory)),
            _ => anyhow::bail!("unknown file mode: {mode}"),
        }
    }

    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            EntryType::Symlink
        } else if file_type.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "directory",
            EntryType::Symlink => "symlink",
            EntryType::Dataset => "dataset",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reported change, keyed by its absolute path in a [`ChangeSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: PathBuf,
    pub state: ChangeState,
    pub entry_type: EntryType,
    /// Id of the object on the "to" side, when the comparison produced one
    pub content_id: Option<ObjectId>,
    /// Id of the object on the "from" side, when the comparison produced one
    pub prev_content_id: Option<ObjectId>,
}

impl ChangeRecord {
    pub fn new(path: PathBuf, state: ChangeState, entry_type: EntryType) -> Self {
        Self {
            path,
            state,
            entry_type,
            content_id: None,
            prev_content_id: None,
        }
    }

    pub fn with_content_id(mut self, content_id: Option<ObjectId>) -> Self {
        self.content_id = content_id;
        self
    }

    pub fn with_prev_content_id(mut self, prev_content_id: Option<ObjectId>) -> Self {
        self.prev_content_id = prev_content_id;
        self
    }
}

pub type ChangeSet = BTreeMap<PathBuf, ChangeRecord>;
