use crate::artifacts::objects::object_id::ObjectId;

/// The "to" side of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// A resolved tree
    Tree(ObjectId),
    /// Whatever is currently checked out, including untracked content
    Worktree,
}

impl DiffTarget {
    pub fn is_worktree(&self) -> bool {
        matches!(self, DiffTarget::Worktree)
    }
}

impl std::fmt::Display for DiffTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffTarget::Tree(oid) => write!(f, "{}", oid.to_short_oid()),
            DiffTarget::Worktree => write!(f, "worktree"),
        }
    }
}
