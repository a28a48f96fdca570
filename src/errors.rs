use thiserror::Error;

/// Single error type the pipeline surfaces to callers. Whatever stage fails,
/// the caller sees one `BuildError` carrying the stage name and the original
/// cause.
#[derive(Debug, Error)]
#[error("error building the threat model with the given plan: {stage}: {message}")]
pub struct BuildError {
    /// Name of the pipeline stage that failed.
    pub stage: &'static str,
    /// Message of the underlying cause.
    pub message: String,
    /// The stage's original error, chain intact.
    pub cause: anyhow::Error,
}

impl BuildError {
    pub fn in_stage(stage: &'static str, cause: anyhow::Error) -> Self {
        Self {
            stage,
            message: cause.to_string(),
            cause,
        }
    }
}
