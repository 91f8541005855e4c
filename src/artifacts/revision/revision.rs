use crate::artifacts::diff::error::DiffError;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::{
    ANCESTOR_REGEX, EMPTY_TREE_ALIAS, INVALID_REVISION_REGEX, PARENT_REGEX, REF_ALIASES,
};
use anyhow::Context;

/// A revision a comparison side is resolved from
///
/// Supports:
/// - Ref names and ids: `main`, `feature/x`, `HEAD`, `abc1234`
/// - Aliases: `@` (for `HEAD`), `EMPTY_TREE` and `PRE_INIT_COMMIT` (the tree
///   before the first commit)
/// - Parent notation: `<revision>^`
/// - Ancestor notation: `<revision>~<n>`
/// - Anything else git understands (`HEAD~`, `HEAD^2`, `HEAD@{1}`,
///   `v1^{commit}`) is passed through untouched as a [`Revision::Ref`]
///
/// Parsing only guards against tokens git would take for an option. Whether
/// a revision exists is up to git, except for the empty tree which is known
/// without asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Ref(String),
    Parent(Box<Revision>),
    Ancestor(Box<Revision>, usize),
    EmptyTree,
}

impl Revision {
    /// Parse a revision, failing with [`DiffError::InvalidReference`] on bad
    /// syntax
    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        Self::parse_inner(revision)?.ok_or_else(|| DiffError::invalid_reference(revision).into())
    }

    fn parse_inner(revision: &str) -> anyhow::Result<Option<Revision>> {
        let parent_re = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        let ancestor_re = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;

        if let Some(caps) = parent_re.captures(revision) {
            let base = Self::parse_inner(&caps[1])?;
            return Ok(base.map(|base| Revision::Parent(Box::new(base))));
        }

        if let Some(caps) = ancestor_re.captures(revision) {
            let Ok(generations) = caps[2].parse::<usize>() else {
                return Ok(None);
            };
            let base = Self::parse_inner(&caps[1])?;
            return Ok(base.map(|base| Revision::Ancestor(Box::new(base), generations)));
        }

        let resolved = *REF_ALIASES.get(revision).unwrap_or(&revision);
        if resolved == EMPTY_TREE_ALIAS || resolved == ObjectId::empty_tree().as_ref() {
            return Ok(Some(Revision::EmptyTree));
        }

        let invalid_re = regex::Regex::new(INVALID_REVISION_REGEX)
            .with_context(|| format!("invalid revision regex: {INVALID_REVISION_REGEX}"))?;
        if resolved.is_empty() || invalid_re.is_match(resolved) {
            return Ok(None);
        }

        Ok(Some(Revision::Ref(resolved.to_string())))
    }

    /// The empty tree has no ancestry, so only the bare alias resolves locally
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, Revision::EmptyTree)
    }

    /// Render the revision in the syntax `git rev-parse` accepts
    pub fn to_git_spec(&self) -> String {
        match self {
            Revision::Ref(name) => name.clone(),
            Revision::Parent(base) => format!("{}^", base.to_git_spec()),
            Revision::Ancestor(base, generations) => {
                format!("{}~{generations}", base.to_git_spec())
            }
            Revision::EmptyTree => ObjectId::empty_tree().to_string(),
        }
    }
}
