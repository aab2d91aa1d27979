//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{QuestionId, ResultError, SessionStateError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no areas selected")]
    NoAreaSelected,

    #[error("no questions matched the selected filters")]
    NoQuestionsFound,

    #[error("no active quiz session")]
    NoActiveSession,

    #[error("question index {index} out of range (total {total})")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),

    #[error("question {0} is not part of this quiz")]
    QuestionNotInSession(QuestionId),

    #[error("question already answered in this quiz")]
    AlreadyAnswered,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Result(#[from] ResultError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SessionStateError> for QuizError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::Empty => QuizError::NoQuestionsFound,
            SessionStateError::OutOfRange { index, total } => {
                QuizError::IndexOutOfRange { index, total }
            }
            SessionStateError::AlreadyAnswered(_) => QuizError::AlreadyAnswered,
            SessionStateError::NotInSession(id) => QuizError::QuestionNotInSession(id),
        }
    }
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EssayService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EssayError {
    #[error("topic and essay text are both required")]
    MissingInput,

    #[error("grading service request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("grading service returned a malformed reply: {0}")]
    MalformedReply(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
