use thiserror::Error;

/// Errors that abort a grading run before any result can be produced.
///
/// Everything else that can go wrong during grading (compiler failures,
/// missing tools, hanging test programs, report generator outages) is
/// recorded inside the `GradeRecord` instead of being raised.
#[derive(Debug, Error)]
pub enum GraderError {
    #[error("failed to create grading workspace: {0}")]
    CreateWorkspace(#[source] std::io::Error),

    #[error("failed to write submission source into workspace: {0}")]
    WriteSource(#[source] std::io::Error),
}
