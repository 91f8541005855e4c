//! Change classification between two trees or a tree and the working tree
//!
//! - `raw_change`: records of the tree-comparison primitive and their parser
//! - `change_record`: the reported change model, state and type enums
//! - `path_filter`: component-bounded path constraints
//! - `untracked_tree`: collapse of fully untracked directories
//! - `classifier`: turns raw records into a filtered, path-keyed change set
//! - `diff_target`: the "to" side of a comparison
//! - `error`: typed failures callers match on

pub mod change_record;
pub mod classifier;
pub mod diff_target;
pub mod error;
pub mod path_filter;
pub mod raw_change;
pub mod untracked_tree;
