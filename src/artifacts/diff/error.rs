use thiserror::Error;

/// Failures a diff caller is expected to tell apart
#[derive(Debug, Error)]
pub enum DiffError {
    /// A revision could not be resolved to a tree
    #[error("invalid reference '{reference}'")]
    InvalidReference { reference: String },
    /// Collapsing untracked content produced duplicate or nested keys
    #[error("untracked collapse produced overlapping entries: {0}")]
    InvariantViolation(String),
}

impl DiffError {
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        DiffError::InvalidReference {
            reference: reference.into(),
        }
    }
}
