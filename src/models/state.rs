use serde::{Deserialize, Serialize};

use super::{Document, Message};

/// The one state a session is in.
///
/// Only the session controller writes this value. The flags a UI would
/// otherwise juggle (uploading, analyzing, sending) are folded into a single
/// variant so that combinations like "sending while analyzing" cannot exist.
///
/// Transitions:
/// - `Idle`/`Ready`/`Failed` → `Uploading` on submit
/// - `Uploading` → `Analyzing` on success, `Idle` on failure
/// - `Analyzing` → `Ready` on summary, `Failed` on error
/// - `Failed` → `Analyzing` on retry
/// - `Ready` → `AwaitingAnswer` on ask, back to `Ready` on answer or error
/// - anything → `Idle` on clear
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Uploading,
    Analyzing,
    Ready,
    AwaitingAnswer,
    Failed(String),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::Ready => "ready",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed ({})", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A point-in-time copy of everything a presentation layer renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub generation: u64,
    pub documents: Vec<Document>,
    pub messages: Vec<Message>,
    /// Most recent upload or analysis error, cleared when a new attempt starts.
    pub last_error: Option<String>,
}
