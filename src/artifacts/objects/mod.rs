//! Git object identity
//!
//! Git stores all content as objects identified by SHA-1 hashes. The diff
//! layer never reads objects itself, it only carries their ids around:
//!
//! - `object_id`: ids, the null id and the empty tree sentinel
//! - `object_type`: object kinds as printed by `git ls-tree`

pub mod object_id;
pub mod object_type;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
