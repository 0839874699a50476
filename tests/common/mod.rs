//! Scripted in-memory backend shared by the integration specs.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use docqa_session::models::FileRef;
use docqa_session::{Backend, ClientError, SessionConfig, UploadReceipt};

/// A response that is either ready now or released later by the test.
enum Scripted<T> {
    Now(Result<T, ClientError>),
    Held(oneshot::Receiver<Result<T, ClientError>>),
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T, ClientError> {
        match self {
            Self::Now(result) => result,
            Self::Held(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::Transport("gate dropped".into()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload(Vec<String>),
    Summary,
    Ask(String),
}

/// Backend whose responses are queued up front. Unscripted calls succeed
/// with a default response.
#[derive(Default)]
pub struct ScriptedBackend {
    uploads: Mutex<VecDeque<Scripted<UploadReceipt>>>,
    summaries: Mutex<VecDeque<Scripted<String>>>,
    answers: Mutex<VecDeque<Scripted<String>>>,
    calls: Mutex<Vec<Call>>,
}

pub const DEFAULT_SUMMARY: &str = "A short summary.";

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_upload(&self, result: Result<UploadReceipt, ClientError>) {
        self.uploads.lock().unwrap().push_back(Scripted::Now(result));
    }

    pub fn push_summary(&self, result: Result<&str, ClientError>) {
        self.summaries
            .lock()
            .unwrap()
            .push_back(Scripted::Now(result.map(str::to_string)));
    }

    pub fn push_answer(&self, result: Result<&str, ClientError>) {
        self.answers
            .lock()
            .unwrap()
            .push_back(Scripted::Now(result.map(str::to_string)));
    }

    pub fn hold_upload(&self) -> oneshot::Sender<Result<UploadReceipt, ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.uploads.lock().unwrap().push_back(Scripted::Held(rx));
        tx
    }

    pub fn hold_summary(&self) -> oneshot::Sender<Result<String, ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.summaries.lock().unwrap().push_back(Scripted::Held(rx));
        tx
    }

    pub fn hold_answer(&self) -> oneshot::Sender<Result<String, ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.answers.lock().unwrap().push_back(Scripted::Held(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| f(c)).count()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn upload(&self, files: &[FileRef]) -> Result<UploadReceipt, ClientError> {
        let names = files.iter().map(|f| f.name.clone()).collect();
        self.calls.lock().unwrap().push(Call::Upload(names));
        let next = self.uploads.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Ok(UploadReceipt::default()),
        }
    }

    async fn summary(&self) -> Result<String, ClientError> {
        self.calls.lock().unwrap().push(Call::Summary);
        let next = self.summaries.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Ok(DEFAULT_SUMMARY.to_string()),
        }
    }

    async fn ask(&self, query: &str) -> Result<String, ClientError> {
        self.calls.lock().unwrap().push(Call::Ask(query.to_string()));
        let next = self.answers.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Ok(format!("Answer to: {}", query)),
        }
    }
}

pub fn pdf(name: &str) -> FileRef {
    FileRef::new(name, Some("application/pdf"), b"%PDF-1.7".to_vec())
}

pub fn txt(name: &str) -> FileRef {
    FileRef::new(name, None, b"plain text".to_vec())
}

pub fn png(name: &str) -> FileRef {
    FileRef::new(name, Some("image/png"), vec![0x89, 0x50, 0x4e, 0x47])
}

pub fn config() -> SessionConfig {
    SessionConfig::default()
}
