//! Error types for each step of a session.
//!
//! Every error here is recoverable: none of them leaves the session in a
//! state that `clear()` or a retry cannot get out of.

use thiserror::Error;

/// Failure talking to the analysis backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, decode).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status. Holds the user-facing
    /// `detail` or a generic fallback.
    #[error("{0}")]
    Server(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("none of the selected files is a PDF, DOC, DOCX, or TXT file")]
    NoValidFiles,

    #[error("upload failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Server(String),
}

impl From<ClientError> for UploadError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Transport(msg) => Self::Transport(msg),
            ClientError::Server(detail) => Self::Server(detail),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("analysis failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Server(String),
}

impl From<ClientError> for AnalysisError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Transport(msg) => Self::Transport(msg),
            ClientError::Server(detail) => Self::Server(detail),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AskError {
    #[error("question failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Server(String),
}

impl From<ClientError> for AskError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Transport(msg) => Self::Transport(msg),
            ClientError::Server(detail) => Self::Server(detail),
        }
    }
}

/// Why a session controller call did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no files were provided")]
    NoFiles,

    #[error("question is empty")]
    EmptyQuery,

    #[error("cannot {action} while the session is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("a question is already awaiting an answer")]
    QuestionInFlight,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// The session was cleared while the request was in flight; its result
    /// was discarded.
    #[error("session was cleared before the request completed")]
    Superseded,
}
