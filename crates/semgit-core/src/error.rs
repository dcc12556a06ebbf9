/// Errors that can occur across the semgit pipeline.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
/// Hook entry points log-and-discard any error so a failing pipeline can
/// never block the host commit.
///
/// # Examples
///
/// ```
/// use semgit_core::SemgitError;
///
/// let err = SemgitError::Git("object not found".into());
/// assert!(err.to_string().contains("object not found"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SemgitError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Git object store or diff failure.
    #[error("git error: {0}")]
    Git(String),

    /// HEAD does not resolve to a commit (empty repository).
    #[error("no HEAD commit (repository has no history)")]
    NoHeadCommit,

    /// Metadata store read or append failure.
    #[error("metadata store error: {0}")]
    Store(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
