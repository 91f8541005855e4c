//! Raw records produced by the tree-comparison primitive
//!
//! `git diff-tree -r -z --raw` and `git diff-index -z --raw` print one record
//! per changed path:
//!
//! ```text
//! :<from mode> <to mode> <from id> <to id> <status>\0<path>\0
//! ```
//!
//! Untracked paths come from a separate listing and are folded into the same
//! record type with the synthetic [`StatusCode::Untracked`].

use crate::artifacts::diff::change_record::{ChangeState, EntryType};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Added,
    Modified,
    Deleted,
    TypeChanged,
    Unmerged,
    Untracked,
}

impl StatusCode {
    pub fn try_parse(code: &str) -> anyhow::Result<Self> {
        match code {
            "A" => Ok(StatusCode::Added),
            "M" => Ok(StatusCode::Modified),
            "D" => Ok(StatusCode::Deleted),
            "T" => Ok(StatusCode::TypeChanged),
            "U" => Ok(StatusCode::Unmerged),
            "?" => Ok(StatusCode::Untracked),
            _ => anyhow::bail!("unsupported diff status: {code}"),
        }
    }

    /// Rank among records repeated for one path; an unmerged path outranks
    /// the per-stage records git prints next to it
    pub fn precedence(&self) -> u8 {
        match self {
            StatusCode::Unmerged => 3,
            StatusCode::TypeChanged => 2,
            StatusCode::Modified => 1,
            StatusCode::Added | StatusCode::Deleted | StatusCode::Untracked => 0,
        }
    }

    pub fn state(&self) -> ChangeState {
        match self {
            StatusCode::Added => ChangeState::Added,
            StatusCode::Modified | StatusCode::TypeChanged | StatusCode::Unmerged => {
                ChangeState::Modified
            }
            StatusCode::Deleted => ChangeState::Deleted,
            StatusCode::Untracked => ChangeState::Untracked,
        }
    }
}

/// One changed path, relative to the repository root with `/` separators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    pub path: String,
    pub entry_type: EntryType,
    pub from_id: Option<ObjectId>,
    pub to_id: Option<ObjectId>,
    pub status: StatusCode,
}

impl RawChange {
    pub fn untracked(path: String, entry_type: EntryType) -> Self {
        Self {
            path,
            entry_type,
            from_id: None,
            to_id: None,
            status: StatusCode::Untracked,
        }
    }
}

/// A path recorded on the "to" side of a comparison, changed or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub path: String,
    pub entry_type: EntryType,
    pub oid: Option<ObjectId>,
}

fn nul_separated(output: &[u8]) -> impl Iterator<Item = &[u8]> {
    output.split(|b| *b == 0).filter(|field| !field.is_empty())
}

fn to_utf8(field: &[u8]) -> anyhow::Result<&str> {
    std::str::from_utf8(field).context("git output is not valid UTF-8")
}

/// Parse `--raw -z` output of `git diff-tree` / `git diff-index`
pub fn parse_raw_diff(output: &[u8]) -> anyhow::Result<Vec<RawChange>> {
    let mut changes = Vec::new();
    let mut fields = nul_separated(output);

    while let Some(header) = fields.next() {
        let header = to_utf8(header)?;
        let header = header
            .strip_prefix(':')
            .with_context(|| format!("malformed raw diff header: {header}"))?;

        let parts = header.split_ascii_whitespace().collect::<Vec<_>>();
        let [from_mode, to_mode, from_id, to_id, status] = parts[..] else {
            anyhow::bail!("malformed raw diff header: {header}");
        };

        let path = fields
            .next()
            .with_context(|| format!("raw diff record without a path: {header}"))?;
        let path = to_utf8(path)?.to_string();

        let entry_type = match EntryType::try_from_mode(to_mode)? {
            Some(entry_type) => entry_type,
            None => EntryType::try_from_mode(from_mode)?.unwrap_or(EntryType::File),
        };

        changes.push(RawChange {
            path,
            entry_type,
            from_id: ObjectId::try_parse_optional(from_id)?,
            to_id: ObjectId::try_parse_optional(to_id)?,
            status: StatusCode::try_parse(status)?,
        });
    }

    Ok(changes)
}

/// Parse a plain `-z` path listing such as `git ls-files -z --others`
pub fn parse_path_listing(output: &[u8]) -> anyhow::Result<Vec<String>> {
    nul_separated(output)
        .map(|path| Ok(to_utf8(path)?.to_string()))
        .collect()
}

/// Parse `git ls-files -s -z` output, one entry per path even for conflicts
pub fn parse_index_listing(output: &[u8]) -> anyhow::Result<Vec<TrackedEntry>> {
    let mut entries = Vec::<TrackedEntry>::new();

    for record in nul_separated(output) {
        let record = to_utf8(record)?;
        let (meta, path) = record
            .split_once('\t')
            .with_context(|| format!("malformed index entry: {record}"))?;

        let parts = meta.split_ascii_whitespace().collect::<Vec<_>>();
        let [mode, oid, _stage] = parts[..] else {
            anyhow::bail!("malformed index entry: {record}");
        };

        // stages 1-3 of a conflicted path are listed back to back
        if entries.last().is_some_and(|last| last.path == path) {
            continue;
        }

        entries.push(TrackedEntry {
            path: path.to_string(),
            entry_type: EntryType::try_from_mode(mode)?.unwrap_or(EntryType::File),
            oid: ObjectId::try_parse_optional(oid)?,
        });
    }

    Ok(entries)
}

/// Parse `git ls-tree -r -z --full-tree` output
pub fn parse_tree_listing(output: &[u8]) -> anyhow::Result<Vec<TrackedEntry>> {
    nul_separated(output)
        .map(|record| {
            let record = to_utf8(record)?;
            let (meta, path) = record
                .split_once('\t')
                .with_context(|| format!("malformed tree entry: {record}"))?;

            let parts = meta.split_ascii_whitespace().collect::<Vec<_>>();
            let [mode, object_type, oid] = parts[..] else {
                anyhow::bail!("malformed tree entry: {record}");
            };
            let entry_type = match ObjectType::try_from(object_type)? {
                ObjectType::Commit => EntryType::Dataset,
                ObjectType::Tree => EntryType::Directory,
                ObjectType::Blob => EntryType::try_from_mode(mode)?.unwrap_or(EntryType::File),
            };

            Ok(TrackedEntry {
                path: path.to_string(),
                entry_type,
                oid: ObjectId::try_parse_optional(oid)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHA_A: &str = "7b4d68d70fcae134d5348f5e118f5e9c9d3f05f6";
    const NULL: &str = "0000000000000000000000000000000000000000";

    fn oid(id: &str) -> Option<ObjectId> {
        ObjectId::try_parse_optional(id).unwrap()
    }

    #[test]
    fn parses_added_file_between_commits() {
        let output = format!(":000000 100644 {NULL} {SHA_A} A\0new\0");

        let changes = parse_raw_diff(output.as_bytes()).unwrap();

        assert_eq!(
            changes,
            vec![RawChange {
                path: "new".to_string(),
                entry_type: EntryType::File,
                from_id: None,
                to_id: oid(SHA_A),
                status: StatusCode::Added,
            }]
        );
    }

    #[test]
    fn deleted_entry_takes_type_from_the_from_side() {
        let output = format!(":120000 000000 {SHA_A} {NULL} D\0link\0");

        let changes = parse_raw_diff(output.as_bytes()).unwrap();

        assert_eq!(changes[0].entry_type, EntryType::Symlink);
        assert_eq!(changes[0].from_id, oid(SHA_A));
        assert_eq!(changes[0].to_id, None);
        assert_eq!(changes[0].status.state(), ChangeState::Deleted);
    }

    #[test]
    fn worktree_modification_has_no_to_id() {
        let output = format!(":100644 100644 {SHA_A} {NULL} M\0dir/with space\0");

        let changes = parse_raw_diff(output.as_bytes()).unwrap();

        assert_eq!(changes[0].path, "dir/with space");
        assert_eq!(changes[0].to_id, None);
        assert_eq!(changes[0].status, StatusCode::Modified);
    }

    #[test]
    fn parses_several_records() {
        let output = format!(
            ":000000 100644 {NULL} {SHA_A} A\0a\0:100644 100755 {SHA_A} {SHA_A} M\0b\0:000000 000000 {NULL} {NULL} U\0c\0"
        );

        let changes = parse_raw_diff(output.as_bytes()).unwrap();

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[2].entry_type, EntryType::File);
        assert_eq!(changes[2].status.state(), ChangeState::Modified);
    }

    #[test]
    fn empty_output_means_no_changes() {
        assert!(parse_raw_diff(b"").unwrap().is_empty());
    }

    #[test]
    fn rejects_rename_records() {
        let output = format!(":100644 100644 {SHA_A} {SHA_A} R100\0old\0new\0");
        assert!(parse_raw_diff(output.as_bytes()).is_err());
    }

    #[test]
    fn rejects_header_without_path() {
        let output = format!(":000000 100644 {NULL} {SHA_A} A\0");
        assert!(parse_raw_diff(output.as_bytes()).is_err());
    }

    #[test]
    fn path_listing_keeps_nested_repository_marker() {
        let paths = parse_path_listing(b"deep/down\0sub/\0with space\0").unwrap();

        assert_eq!(paths, vec!["deep/down", "sub/", "with space"]);
    }

    #[test]
    fn index_listing_collapses_conflict_stages() {
        let output = format!(
            "100644 {SHA_A} 1\tconflicted\0100644 {SHA_A} 2\tconflicted\0100644 {SHA_A} 3\tconflicted\0120000 {SHA_A} 0\tlink\0"
        );

        let entries = parse_index_listing(output.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "conflicted");
        assert_eq!(entries[1].entry_type, EntryType::Symlink);
    }

    #[test]
    fn tree_listing_types_submodules_as_datasets() {
        let output = format!("100644 blob {SHA_A}\tdeep/down\0160000 commit {SHA_A}\tsub\0");

        let entries = parse_tree_listing(output.as_bytes()).unwrap();

        assert_eq!(
            entries,
            vec![
                TrackedEntry {
                    path: "deep/down".to_string(),
                    entry_type: EntryType::File,
                    oid: oid(SHA_A),
                },
                TrackedEntry {
                    path: "sub".to_string(),
                    entry_type: EntryType::Dataset,
                    oid: oid(SHA_A),
                },
            ]
        );
    }
}
