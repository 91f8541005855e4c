use std::collections::HashMap;
use std::ffi::OsString;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Path constraints of a diff, matched component-wise so `deep` never
/// matches `deeper`
///
/// Entries are absolute, normalized paths. A path matches when it equals an
/// entry or lies underneath one.
#[derive(Debug, Clone)]
pub struct PathFilter {
    path_trie: Trie<OsString>,
}

impl PathFilter {
    /// A filter without constraints, matching every path
    pub fn empty() -> Self {
        Self {
            path_trie: Trie::with_matching(true),
        }
    }

    /// Build a filter from absolute paths; no paths means no constraint
    pub fn new(paths: Vec<PathBuf>) -> Self {
        if paths.is_empty() {
            return Self::empty();
        }

        let mut trie = Trie::new();
        for path in paths {
            let components = Self::components(&path);
            trie.insert(&components);
        }

        Self { path_trie: trie }
    }

    /// Whether `path` is an entry or lies beneath one
    pub fn matches(&self, path: &Path) -> bool {
        self.path_trie.contains_prefix_of(&Self::components(path))
    }

    /// Whether some entry lies strictly beneath `dir` while `dir` itself is
    /// not covered by any entry
    ///
    /// Such a directory must not be reported as a whole: only part of it was
    /// asked for.
    pub fn constrains_below(&self, dir: &Path) -> bool {
        match self.path_trie.descend(&Self::components(dir)) {
            Descent::Covered | Descent::Outside => false,
            Descent::Inside(node) => !node.children.is_empty(),
        }
    }

    fn components(path: &Path) -> Vec<OsString> {
        path.components()
            .map(|comp| comp.as_os_str().to_os_string())
            .collect()
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trie<T: Hash + Eq + Clone> {
    is_matching: bool,
    children: HashMap<T, Trie<T>>,
}

/// Outcome of walking a path down a trie
enum Descent<'t, T: Hash + Eq + Clone> {
    /// A matching node was passed on the way
    Covered,
    /// The path ended on a non-matching inner node
    Inside(&'t Trie<T>),
    /// The path left the trie
    Outside,
}

impl<T: Hash + Eq + Clone> Trie<T> {
    pub fn new() -> Self {
        Trie {
            is_matching: false,
            children: HashMap::new(),
        }
    }

    pub fn with_matching(is_matching: bool) -> Self {
        Trie {
            is_matching,
            children: HashMap::new(),
        }
    }

    pub fn insert(&mut self, path: &[T]) {
        let mut node = self;
        for part in path {
            node = node.children.entry(part.clone()).or_insert_with(Trie::new);
        }
        node.is_matching = true;
    }

    /// Whether an inserted path is a prefix of (or equal to) `path`
    pub fn contains_prefix_of(&self, path: &[T]) -> bool {
        matches!(self.descend(path), Descent::Covered)
    }

    fn descend(&self, path: &[T]) -> Descent<'_, T> {
        let mut node = self;
        for part in path {
            if node.is_matching {
                return Descent::Covered;
            }
            match node.children.get(part) {
                Some(child) => node = child,
                None => return Descent::Outside,
            }
        }

        if node.is_matching {
            Descent::Covered
        } else {
            Descent::Inside(node)
        }
    }
}

impl<T: Hash + Eq + Clone> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Trie Tests ==========

    #[test]
    fn trie_insert_single_path() {
        let mut trie = Trie::new();
        let path = vec!["src", "main", "rs"];
        trie.insert(&path);

        assert!(trie.contains_prefix_of(&path));
        assert!(!trie.contains_prefix_of(&["src", "main"]));
    }

    #[test]
    fn trie_prefix_match_is_component_bounded() {
        let mut trie = Trie::new();
        trie.insert(&["repo", "deep"]);

        assert!(trie.contains_prefix_of(&["repo", "deep"]));
        assert!(trie.contains_prefix_of(&["repo", "deep", "down"]));
        assert!(!trie.contains_prefix_of(&["repo", "deeper"]));
        assert!(!trie.contains_prefix_of(&["repo"]));
    }

    #[test]
    fn trie_empty_path() {
        let mut trie = Trie::new();
        let empty_path: Vec<&str> = vec![];
        trie.insert(&empty_path);

        // Empty path should mark the root as matching
        assert!(trie.is_matching);
        assert!(trie.contains_prefix_of(&["anything"]));
    }

    // ========== PathFilter Tests ==========

    #[test]
    fn empty_filter_matches_everything() {
        let filter = PathFilter::empty();

        assert!(filter.matches(Path::new("/repo/anything")));
        assert!(!filter.constrains_below(Path::new("/repo/deep")));
    }

    #[test]
    fn no_paths_means_no_constraint() {
        let filter = PathFilter::new(vec![]);

        assert!(filter.matches(Path::new("/")));
        assert!(filter.matches(Path::new("/repo/anything")));
    }

    #[test]
    fn matches_exact_file_and_directory_contents() {
        let filter = PathFilter::new(vec![
            PathBuf::from("/repo/new"),
            PathBuf::from("/repo/deep"),
        ]);

        assert!(filter.matches(Path::new("/repo/new")));
        assert!(filter.matches(Path::new("/repo/deep")));
        assert!(filter.matches(Path::new("/repo/deep/down")));
        assert!(!filter.matches(Path::new("/repo/deeper")));
        assert!(!filter.matches(Path::new("/repo/newer")));
        assert!(!filter.matches(Path::new("/repo")));
    }

    #[test]
    fn root_entry_matches_everything_below_root() {
        let filter = PathFilter::new(vec![PathBuf::from("/repo")]);

        assert!(filter.matches(Path::new("/repo/a/b/c")));
        assert!(!filter.matches(Path::new("/elsewhere/a")));
    }

    #[test]
    fn constrains_below_only_when_an_entry_is_deeper() {
        let filter = PathFilter::new(vec![PathBuf::from("/repo/deep/down")]);

        assert!(filter.constrains_below(Path::new("/repo/deep")));
        assert!(filter.constrains_below(Path::new("/repo")));
        assert!(!filter.constrains_below(Path::new("/repo/deep/down")));
        assert!(!filter.constrains_below(Path::new("/repo/deep/down/further")));
        assert!(!filter.constrains_below(Path::new("/repo/other")));
    }
}
