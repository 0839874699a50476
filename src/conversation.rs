//! Conversation engine: the ordered message log and question/answer turns.
//!
//! A turn is always recorded in the same order: the user's message is
//! appended before the request is issued, and the answer (or an error turn)
//! after it completes. A failed question never removes the user's message.

use crate::analysis::Summary;
use crate::client::Backend;
use crate::config::SessionConfig;
use crate::error::AskError;
use crate::models::{Message, Role};

/// A question with surrounding whitespace removed. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Returns `None` for empty or whitespace-only text.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Answer text exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer(pub String);

impl Answer {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct ConversationEngine {
    log: Vec<Message>,
    network_error: String,
}

impl ConversationEngine {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            log: Vec::new(),
            network_error: config.network_error_message.clone(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Drop the whole log. Individual messages are never removed.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Record a summary as an Assistant message, verbatim.
    pub fn push_summary(&mut self, summary: Summary) -> Message {
        self.push(Message::assistant(summary.into_inner()))
    }

    /// Append the user's side of a turn. Call before issuing the request.
    pub fn begin_turn(&mut self, query: &Query) -> Message {
        self.push(Message::user(query.as_str()))
    }

    /// Append the assistant's side of a turn once the request settles.
    pub fn finish_turn(&mut self, result: &Result<Answer, AskError>) -> Message {
        let message = match result {
            Ok(answer) => Message::assistant(answer.as_str()),
            Err(AskError::Server(detail)) => Message::assistant_error(detail.as_str()),
            Err(AskError::Transport(_)) => Message::assistant_error(self.network_error.as_str()),
        };
        self.push(message)
    }

    /// Run a whole turn against `backend`.
    ///
    /// The log gains the user's message and then either the answer or an
    /// error turn; the result is returned as well.
    pub async fn ask<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        query: &Query,
    ) -> Result<Answer, AskError> {
        self.begin_turn(query);
        let result = send_query(backend, query).await;
        self.finish_turn(&result);
        result
    }

    /// Render the log as plain text, one message per paragraph.
    pub fn transcript(&self) -> String {
        render_transcript(&self.log)
    }

    fn push(&mut self, message: Message) -> Message {
        self.log.push(message.clone());
        message
    }
}

/// Issue one question. The query is sent as-is; the client encodes it.
pub(crate) async fn send_query<B: Backend + ?Sized>(
    backend: &B,
    query: &Query,
) -> Result<Answer, AskError> {
    tracing::info!(chars = query.as_str().len(), "Sending question");
    match backend.ask(query.as_str()).await {
        Ok(answer) => Ok(Answer(answer)),
        Err(e) => {
            tracing::warn!("Question failed: {}", e);
            Err(e.into())
        }
    }
}

pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        let speaker = match (message.role, message.is_error) {
            (Role::User, _) => "You",
            (Role::Assistant, false) => "Assistant",
            (Role::Assistant, true) => "Assistant (error)",
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!(
            "[{}] {}: {}\n",
            message.created_at.format("%Y-%m-%d %H:%M:%S"),
            speaker,
            message.text
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::UploadReceipt;
    use crate::error::ClientError;
    use crate::models::FileRef;
    use async_trait::async_trait;

    fn engine() -> ConversationEngine {
        ConversationEngine::new(&SessionConfig::default())
    }

    /// Answers every question with the same result.
    struct FixedAnswer(Result<String, ClientError>);

    #[async_trait]
    impl Backend for FixedAnswer {
        async fn upload(&self, _files: &[FileRef]) -> Result<UploadReceipt, ClientError> {
            Ok(UploadReceipt::default())
        }

        async fn summary(&self) -> Result<String, ClientError> {
            Ok(String::new())
        }

        async fn ask(&self, _query: &str) -> Result<String, ClientError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(Query::parse("  why?\n").unwrap().as_str(), "why?");
        assert!(Query::parse("").is_none());
        assert!(Query::parse(" \t\n").is_none());
    }

    #[test]
    fn test_query_keeps_inner_text_raw() {
        let q = Query::parse("a & b = <c>?").unwrap();
        assert_eq!(q.as_str(), "a & b = <c>?");
    }

    #[test]
    fn test_turn_order() {
        let mut engine = engine();
        engine.push_summary(Summary("Q3 revenue rose 10%.".into()));
        let q = Query::parse("What drove growth?").unwrap();
        engine.begin_turn(&q);
        engine.finish_turn(&Ok(Answer("Pricing changes.".into())));

        let log: Vec<_> = engine
            .messages()
            .iter()
            .map(|m| (m.role, m.text.as_str(), m.is_error))
            .collect();
        assert_eq!(
            log,
            vec![
                (Role::Assistant, "Q3 revenue rose 10%.", false),
                (Role::User, "What drove growth?", false),
                (Role::Assistant, "Pricing changes.", false),
            ]
        );
    }

    #[test]
    fn test_failed_turn_keeps_user_message() {
        let mut engine = engine();
        let q = Query::parse("x").unwrap();
        engine.begin_turn(&q);
        let msg = engine.finish_turn(&Err(AskError::Transport("connection refused".into())));

        assert_eq!(engine.len(), 2);
        assert_eq!(engine.messages()[0].role, Role::User);
        assert!(msg.is_error);
        assert_eq!(msg.text, SessionConfig::default().network_error_message);
    }

    #[test]
    fn test_server_detail_is_shown_verbatim() {
        let mut engine = engine();
        engine.begin_turn(&Query::parse("x").unwrap());
        let msg = engine.finish_turn(&Err(AskError::Server("Index not built".into())));
        assert!(msg.is_error);
        assert_eq!(msg.text, "Index not built");
    }

    #[tokio::test]
    async fn test_ask_records_a_full_turn() {
        let mut engine = engine();
        let backend = FixedAnswer(Ok("Pricing changes.".into()));
        let q = Query::parse("What drove growth?").unwrap();

        let result = engine.ask(&backend, &q).await;

        assert_eq!(result, Ok(Answer("Pricing changes.".into())));
        let log: Vec<_> = engine
            .messages()
            .iter()
            .map(|m| (m.role, m.text.as_str(), m.is_error))
            .collect();
        assert_eq!(
            log,
            vec![
                (Role::User, "What drove growth?", false),
                (Role::Assistant, "Pricing changes.", false),
            ]
        );
    }

    #[tokio::test]
    async fn test_ask_failure_returns_error_and_logs_it() {
        let mut engine = engine();
        let backend = FixedAnswer(Err(ClientError::Server("Index not built".into())));
        let q = Query::parse("x").unwrap();

        let result = engine.ask(&backend, &q).await;

        assert_eq!(result, Err(AskError::Server("Index not built".into())));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.messages()[0].role, Role::User);
        let last = &engine.messages()[1];
        assert_eq!(last.role, Role::Assistant);
        assert!(last.is_error);
        assert_eq!(last.text, "Index not built");
    }

    #[test]
    fn test_transcript_marks_errors() {
        let mut engine = engine();
        engine.begin_turn(&Query::parse("hello").unwrap());
        engine.finish_turn(&Err(AskError::Server("down".into())));

        let text = engine.transcript();
        assert!(text.contains("You: hello"));
        assert!(text.contains("Assistant (error): down"));

        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.transcript(), "");
    }
}
