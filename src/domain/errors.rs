/// Outcome of a single verification step.
///
/// `Policy` is a user-facing reason the commit cannot be published and is
/// collected into the commit's report. `Internal` is a tooling or environment
/// failure and aborts the whole run.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("{0}")]
    Policy(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl VerifyError {
    pub fn policy(text: impl Into<String>) -> Self {
        VerifyError::Policy(text.into())
    }
}

/// Failures of the module archive builders.
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("malformed module path {path:?}: {reason}")]
    InvalidModulePath { path: String, reason: String },
    #[error("file path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("case-insensitive file name collision: {first:?} and {second:?}")]
    CaseCollision { first: String, second: String },
    #[error("file {path:?} is {size} bytes, larger than the {limit} byte limit")]
    FileTooLarge { path: String, size: u64, limit: u64 },
    #[error("module archive would exceed the {limit} byte limit")]
    ArchiveTooLarge { limit: u64 },
    #[error("writing module archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ArchiveError {
    /// True when the failure stems from the tree's content rather than from
    /// reading it or encoding the archive.
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            ArchiveError::InvalidModulePath { .. }
                | ArchiveError::InvalidPath { .. }
                | ArchiveError::CaseCollision { .. }
                | ArchiveError::FileTooLarge { .. }
                | ArchiveError::ArchiveTooLarge { .. }
        )
    }
}
