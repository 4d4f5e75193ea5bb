//! Query orchestration
//!
//! Wires the store, the retrieval tools, session memory and the
//! conversation controller into one entry point.

use crate::config::Config;
use crate::error::RagError;
use crate::generator::{system_prompt, AiGenerator, GenerateRequest, GeneratorSettings};
use crate::llm::LlmService;
use crate::session::{SessionManager, SessionStore};
use crate::store::{Catalog, MemoryStore, VectorStore};
use crate::tools::{
    CourseOutlineTool, CourseSearchTool, Source, SourceRecord, Tool, ToolRegistry,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Catalog summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Course assistant: answers questions with citations
pub struct RagSystem {
    store: Arc<dyn VectorStore>,
    generator: AiGenerator,
    tools: ToolRegistry,
    sessions: Arc<dyn SessionStore>,
    max_tool_rounds: u32,
    /// One query at a time owns the tools' source logs
    query_lock: Mutex<()>,
}

impl RagSystem {
    pub fn new(config: &Config, llm: Arc<dyn LlmService>, store: Arc<dyn VectorStore>) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CourseSearchTool::new(store.clone())));
        tools.register(Arc::new(CourseOutlineTool::new(store.clone())));

        let generator = AiGenerator::new(
            llm,
            GeneratorSettings {
                system_prompt: system_prompt(config.max_tool_rounds.max(1)),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
        );

        Self {
            store,
            generator,
            tools,
            sessions: Arc::new(SessionManager::new(config.max_history)),
            max_tool_rounds: config.max_tool_rounds,
            query_lock: Mutex::new(()),
        }
    }

    /// Replace the default in-memory session store
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Make an extra tool available to the model
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        self.tools.register(tool);
    }

    /// Answer `text`, optionally in the context of a session.
    ///
    /// Returns the answer and the sources the tools consulted for it. The
    /// exchange is remembered only when the query succeeds.
    pub async fn query(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<(String, Vec<SourceRecord>), RagError> {
        let _guard = self.query_lock.lock().await;
        self.tools.reset_sources();

        let prompt = format!("Answer this question about course materials: {text}");
        let history = match session_id {
            Some(id) => self.sessions.history(id).await,
            None => None,
        };

        tracing::debug!(
            session = session_id.unwrap_or("-"),
            has_history = history.is_some(),
            "Answering query"
        );

        let answer = self
            .generator
            .generate(
                GenerateRequest::new(&prompt)
                    .history(history.as_deref())
                    .tools_from(&self.tools)
                    .max_rounds(self.max_tool_rounds),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Query failed"))?;

        let sources: Vec<SourceRecord> = self
            .tools
            .last_sources()
            .into_iter()
            .map(Source::into_record)
            .collect();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, text, &answer).await;
        }

        tracing::info!(sources = sources.len(), "Query answered");
        Ok((answer, sources))
    }

    pub async fn course_analytics(&self) -> CourseAnalytics {
        let course_titles = self.store.course_titles().await;
        CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        }
    }

    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear_session(session_id);
    }
}

/// Read a JSON catalog from disk into a [`MemoryStore`]
pub async fn load_store(path: &Path, max_results: usize) -> Result<MemoryStore, RagError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let catalog = Catalog::from_json(&raw)?;
    let store = MemoryStore::from_catalog(catalog, max_results)
        .map_err(|e| RagError::Catalog(format!("{}: {e}", path.display())))?;

    tracing::info!(
        path = %path.display(),
        courses = store.course_count(),
        chunks = store.chunk_count(),
        "Loaded course catalog"
    );
    Ok(store)
}
