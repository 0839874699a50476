//! Domain models for a document Q&A session.
//!
//! # Core Concepts
//!
//! - [`Document`]: a file accepted into the session, identified by its filename.
//! - [`DocumentSet`]: the append-only corpus the backend has analyzed.
//! - [`Message`]: an immutable entry in the conversation log.
//! - [`SessionState`]: the single state the session controller is in.

mod document;
mod message;
mod state;

pub use document::*;
pub use message::*;
pub use state::*;
