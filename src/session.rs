//! Session controller: the one state machine a presentation layer talks to.
//!
//! Composes the upload coordinator, analysis trigger and conversation engine.
//! State lives behind a lock that is never held across a network call, so
//! `clear()` can run while an upload, analysis or question is outstanding.
//! Every request is tagged with the generation it was issued under; when it
//! settles after a `clear()` its result is dropped instead of applied.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::analysis::{AnalysisTrigger, Summary};
use crate::client::Backend;
use crate::config::SessionConfig;
use crate::conversation::{render_transcript, send_query, ConversationEngine, Query};
use crate::error::SessionError;
use crate::models::{Document, DocumentSet, FileRef, Message, SessionSnapshot, SessionState};
use crate::upload::{UploadBatch, UploadCoordinator};

/// Result of a successful `submit_files`.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Documents added to the set by this upload.
    pub documents: Vec<Document>,
    /// Files skipped because of their type.
    pub rejected: Vec<Document>,
    pub summary: Summary,
}

struct Inner {
    state: SessionState,
    generation: u64,
    documents: DocumentSet,
    conversation: ConversationEngine,
    last_error: Option<String>,
}

pub struct SessionController<B: ?Sized> {
    backend: Arc<B>,
    inner: Arc<Mutex<Inner>>,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl<B: ?Sized> Clone for SessionController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            inner: Arc::clone(&self.inner),
            state_tx: Arc::clone(&self.state_tx),
        }
    }
}

impl<B: Backend> SessionController<B> {
    pub fn new(backend: B, config: &SessionConfig) -> Self {
        Self::with_backend(Arc::new(backend), config)
    }
}

impl<B: Backend + ?Sized> SessionController<B> {
    /// Start an `Idle` session with no documents and an empty log.
    pub fn with_backend(backend: Arc<B>, config: &SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            backend,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle,
                generation: 0,
                documents: DocumentSet::new(),
                conversation: ConversationEngine::new(config),
                last_error: None,
            })),
            state_tx: Arc::new(state_tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("session lock poisoned")
    }

    fn transition(&self, inner: &mut Inner, next: SessionState) {
        tracing::debug!(
            from = inner.state.as_str(),
            to = next.as_str(),
            generation = inner.generation,
            "Session transition"
        );
        inner.state = next.clone();
        self.state_tx.send_replace(next);
    }

    /// False (and logged) when `clear()` ran after the request was issued.
    fn is_current(inner: &Inner, generation: u64, operation: &str) -> bool {
        if inner.generation == generation {
            return true;
        }
        tracing::debug!(
            operation,
            stale = generation,
            current = inner.generation,
            "Discarding result from a cleared session"
        );
        false
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn documents(&self) -> Vec<Document> {
        self.lock().documents.as_slice().to_vec()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().conversation.messages().to_vec()
    }

    /// Most recent upload or analysis error. Question failures show up in
    /// the log instead.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            state: inner.state.clone(),
            generation: inner.generation,
            documents: inner.documents.as_slice().to_vec(),
            messages: inner.conversation.messages().to_vec(),
            last_error: inner.last_error.clone(),
        }
    }

    pub fn transcript(&self) -> String {
        render_transcript(self.lock().conversation.messages())
    }

    /// Watch state transitions as they happen.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    // ============================================================
    // Operations
    // ============================================================

    /// Upload files and, once the backend has them, analyze the corpus.
    ///
    /// Allowed from `Idle`, `Ready` and `Failed`. New documents are appended
    /// to the existing set. A selection with no supported files is rejected
    /// before anything is sent and leaves the state unchanged.
    pub async fn submit_files(&self, files: Vec<FileRef>) -> Result<SubmitOutcome, SessionError> {
        if files.is_empty() {
            return Err(SessionError::NoFiles);
        }

        let (batch, generation) = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Idle | SessionState::Ready | SessionState::Failed(_) => {}
                ref other => {
                    return Err(SessionError::InvalidState {
                        action: "submit files",
                        state: other.as_str(),
                    })
                }
            }
            let batch = match UploadBatch::prepare(files) {
                Ok(batch) => batch,
                Err(e) => {
                    inner.last_error = Some(e.to_string());
                    return Err(e.into());
                }
            };
            inner.last_error = None;
            self.transition(&mut inner, SessionState::Uploading);
            (batch, inner.generation)
        };

        let uploaded = UploadCoordinator::new(Arc::clone(&self.backend))
            .send(batch)
            .await;

        let accepted = {
            let mut inner = self.lock();
            if !Self::is_current(&inner, generation, "upload") {
                return Err(SessionError::Superseded);
            }
            match uploaded {
                Ok(accepted) => {
                    inner.documents.extend(accepted.documents.iter().cloned());
                    self.transition(&mut inner, SessionState::Analyzing);
                    accepted
                }
                Err(e) => {
                    inner.last_error = Some(e.to_string());
                    self.transition(&mut inner, SessionState::Idle);
                    return Err(e.into());
                }
            }
        };

        let summary = self.run_analysis(generation).await?;
        Ok(SubmitOutcome {
            documents: accepted.documents,
            rejected: accepted.rejected,
            summary,
        })
    }

    /// Request the summary again after a failed analysis.
    pub async fn retry_analysis(&self) -> Result<Summary, SessionError> {
        let generation = {
            let mut inner = self.lock();
            if !matches!(inner.state, SessionState::Failed(_)) {
                return Err(SessionError::InvalidState {
                    action: "retry analysis",
                    state: inner.state.as_str(),
                });
            }
            inner.last_error = None;
            self.transition(&mut inner, SessionState::Analyzing);
            inner.generation
        };

        self.run_analysis(generation).await
    }

    async fn run_analysis(&self, generation: u64) -> Result<Summary, SessionError> {
        let result = AnalysisTrigger::new(Arc::clone(&self.backend))
            .analyze()
            .await;

        let mut inner = self.lock();
        if !Self::is_current(&inner, generation, "analysis") {
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(summary) => {
                inner.conversation.push_summary(summary.clone());
                self.transition(&mut inner, SessionState::Ready);
                Ok(summary)
            }
            Err(e) => {
                let reason = e.to_string();
                inner.last_error = Some(reason.clone());
                self.transition(&mut inner, SessionState::Failed(reason));
                Err(e.into())
            }
        }
    }

    /// Ask a question about the uploaded documents.
    ///
    /// The user's message is logged before the request goes out. A backend
    /// failure is not an `Err`: it completes the turn with an error-flagged
    /// Assistant message, which is returned. Only one question may be in
    /// flight; a second call while waiting is rejected.
    pub async fn ask(&self, query: &str) -> Result<Message, SessionError> {
        let (query, generation) = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Ready => {}
                SessionState::AwaitingAnswer => return Err(SessionError::QuestionInFlight),
                ref other => {
                    return Err(SessionError::InvalidState {
                        action: "ask a question",
                        state: other.as_str(),
                    })
                }
            }
            let query = Query::parse(query).ok_or(SessionError::EmptyQuery)?;
            inner.conversation.begin_turn(&query);
            self.transition(&mut inner, SessionState::AwaitingAnswer);
            (query, inner.generation)
        };

        let result = send_query(&*self.backend, &query).await;

        let mut inner = self.lock();
        if !Self::is_current(&inner, generation, "ask") {
            return Err(SessionError::Superseded);
        }
        let message = inner.conversation.finish_turn(&result);
        self.transition(&mut inner, SessionState::Ready);
        Ok(message)
    }

    /// Reset to `Idle`, dropping documents, messages and the last error.
    ///
    /// Any request still in flight keeps running, but its result will be
    /// discarded.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.documents.clear();
        inner.conversation.clear();
        inner.last_error = None;
        tracing::info!(generation = inner.generation, "Session cleared");
        self.transition(&mut inner, SessionState::Idle);
    }
}
