//! Collapsing of untracked content into directory-level entries
//!
//! Untracked paths are inserted into a trie of path components. Tracked paths
//! only mark the deepest trie node they share with the untracked content, so
//! the trie stays as small as the untracked set. A post-order pass then
//! computes for every directory node whether its subtree holds nothing but
//! untracked content, and a top-down walk reports the top-most such
//! directories in place of their contents.

use crate::artifacts::diff::change_record::EntryType;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<String, Node>,
    /// Type of the untracked entry ending at this node
    leaf: Option<EntryType>,
    /// A tracked path passes through or ends at this node
    holds_tracked: bool,
    fully_untracked: bool,
}

impl Node {
    fn aggregate(&mut self) -> bool {
        // every child must be visited, no short-circuit
        let children_untracked = self
            .children
            .values_mut()
            .fold(true, |all, child| child.aggregate() && all);

        self.fully_untracked = !self.holds_tracked
            && (self.leaf.is_some() || (!self.children.is_empty() && children_untracked));
        self.fully_untracked
    }
}

/// An untracked entry to report, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedEntry {
    pub path: String,
    pub entry_type: EntryType,
}

#[derive(Debug, Default)]
pub struct UntrackedTree {
    root: Node,
}

impl UntrackedTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_untracked(&mut self, path: &str, entry_type: EntryType) {
        let mut node = &mut self.root;
        for part in Self::components(path) {
            node = node.children.entry(part.to_string()).or_default();
        }
        node.leaf = Some(entry_type);
    }

    /// Record that `path` is tracked
    ///
    /// Must be called after every untracked path has been inserted.
    pub fn mark_tracked(&mut self, path: &str) {
        let mut node = &mut self.root;
        for part in Self::components(path) {
            match node.children.get_mut(part) {
                Some(child) => node = child,
                None => break,
            }
        }
        node.holds_tracked = true;
    }

    /// Collapse fully untracked directories
    ///
    /// `keep_open` is asked about every fully untracked directory (by its
    /// root-relative path) before it is reported as a whole; returning `true`
    /// reports its contents instead. The root itself is never collapsed.
    pub fn collapse(mut self, keep_open: impl Fn(&Path) -> bool) -> Vec<CollapsedEntry> {
        self.root.aggregate();

        let mut entries = Vec::new();
        let mut prefix = Vec::new();
        for (name, child) in &self.root.children {
            Self::walk(name, child, &mut prefix, &keep_open, &mut entries);
        }

        entries
    }

    fn walk<'n>(
        name: &'n str,
        node: &'n Node,
        prefix: &mut Vec<&'n str>,
        keep_open: &impl Fn(&Path) -> bool,
        entries: &mut Vec<CollapsedEntry>,
    ) {
        prefix.push(name);
        let path = prefix.join("/");

        if let Some(entry_type) = node.leaf {
            entries.push(CollapsedEntry {
                path,
                entry_type,
            });
        } else if node.fully_untracked && !keep_open(Path::new(&path)) {
            entries.push(CollapsedEntry {
                path,
                entry_type: EntryType::Directory,
            });
        } else {
            for (child_name, child) in &node.children {
                Self::walk(child_name, child, prefix, keep_open, entries);
            }
        }

        prefix.pop();
    }

    fn components(path: &str) -> impl Iterator<Item = &str> {
        path.split('/').filter(|part| !part.is_empty())
    }
}
