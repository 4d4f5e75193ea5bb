//! Per-session conversation memory
//!
//! Keeps the last few exchanges of each session so follow-up questions can
//! be answered in context.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Conversation history collaborator of the orchestrator
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Formatted prior exchanges, `None` when there are none
    async fn history(&self, session_id: &str) -> Option<String>;

    /// Record one user question and the assistant's answer
    async fn add_exchange(&self, session_id: &str, user: &str, assistant: &str);

    /// Start an empty session and return its id
    fn create_session(&self) -> String;

    /// Forget every message of a session. Unknown ids are ignored.
    fn clear_session(&self, session_id: &str);
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn history(&self, session_id: &str) -> Option<String> {
        (**self).history(session_id).await
    }

    async fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        (**self).add_exchange(session_id, user, assistant).await;
    }

    fn create_session(&self) -> String {
        (**self).create_session()
    }

    fn clear_session(&self, session_id: &str) {
        (**self).clear_session(session_id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
struct SessionMessage {
    speaker: Speaker,
    content: String,
}

/// In-memory sessions bounded to `max_history` exchanges each
#[derive(Debug)]
pub struct SessionManager {
    max_history: usize,
    sessions: Mutex<HashMap<String, Vec<SessionMessage>>>,
    counter: AtomicU64,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    fn push(&self, session_id: &str, speaker: Speaker, content: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let messages = sessions.entry(session_id.to_string()).or_default();
        messages.push(SessionMessage {
            speaker,
            content: content.to_string(),
        });

        let limit = self.max_history * 2;
        if messages.len() > limit {
            let excess = messages.len() - limit;
            messages.drain(..excess);
        }
    }

    fn render(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let messages = sessions.get(session_id)?;
        if messages.is_empty() {
            return None;
        }

        let mut out = String::new();
        for (i, message) in messages.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let who = match message.speaker {
                Speaker::User => "User",
                Speaker::Assistant => "Assistant",
            };
            let _ = write!(out, "{who}: {}", message.content);
        }
        Some(out)
    }
}

#[async_trait]
impl SessionStore for SessionManager {
    async fn history(&self, session_id: &str) -> Option<String> {
        self.render(session_id)
    }

    async fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        self.push(session_id, Speaker::User, user);
        self.push(session_id, Speaker::Assistant, assistant);
    }

    fn create_session(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("session_{n}");
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Vec::new());
        id
    }

    fn clear_session(&self, session_id: &str) {
        if let Some(messages) = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(session_id)
        {
            messages.clear();
        }
    }
}
