//! Porcelain commands (user-facing operations)
//!
//! - `diff`: Report changes between revisions or against the working tree

pub mod diff;
