//! Session controller for a document question-answering assistant.
//!
//! A user uploads documents, the backend summarizes them, and the user asks
//! questions answered against the uploaded corpus. [`SessionController`] owns
//! that flow as a single state machine; presentation layers only talk to it.

pub mod analysis;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod session;
pub mod upload;

pub use client::{Backend, HttpBackend, UploadReceipt};
pub use config::SessionConfig;
pub use error::{AnalysisError, AskError, ClientError, SessionError, UploadError};
pub use session::{SessionController, SubmitOutcome};
