//! Data structures and algorithms independent of how git is driven
//!
//! - `core`: Shared output utilities (pager wrapper)
//! - `diff`: Change classification, path filtering and untracked collapse
//! - `objects`: Object ids and types
//! - `revision`: Revision syntax and aliases

pub mod core;
pub mod diff;
pub mod objects;
pub mod revision;
