//! Command implementations
//!
//! Commands are methods on [`Repository`](crate::areas::repository::Repository)
//! that compose the plumbing driver and the classification artifacts into a
//! user-facing operation.

pub mod porcelain;
