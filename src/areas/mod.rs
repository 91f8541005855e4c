//! Repository access
//!
//! - `git`: git plumbing driver producing raw comparison feeds
//! - `repository`: ties the root, plumbing, workspace and output together
//! - `workspace`: working directory paths and filesystem object kinds

pub mod git;
pub mod repository;
pub mod workspace;
