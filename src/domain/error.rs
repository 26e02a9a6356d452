use thiserror::Error;

/// Rules on job content and persisted job state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("content must not be empty")]
    EmptyContent,
    #[error("content must contain at least one word separated by `{delimiter}`")]
    NoWords { delimiter: char },
    #[error("unknown job status `{0}`")]
    UnknownStatus(String),
}
