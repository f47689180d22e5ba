//! Shared error types for the services crate.

use thiserror::Error;

use client::remote::ApiError;
use client::session_ref::StoreError;
use exam_core::model::{ConfigError, QuestionError};

/// Errors emitted by `CollectorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollectorError {
    #[error(transparent)]
    Invalid(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors emitted by the session runner workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    #[error("no test session found")]
    NoSession,

    #[error("this test has already been submitted")]
    AlreadySubmitted,

    #[error("runner is not displaying a question")]
    Inactive,

    #[error("question index {index} out of range (total {total})")]
    OutOfRange { index: usize, total: usize },

    #[error("question {index} is not cached")]
    NotCached { index: usize },

    #[error("not every question has been answered")]
    NotReady,

    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
