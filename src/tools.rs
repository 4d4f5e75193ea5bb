//! Tools the assistant can call, and the registry that dispatches them
//!
//! Retrieval tools record the sources behind their last answers so the
//! caller can cite them next to the final response.

mod course_outline;
mod course_search;

pub use course_outline::CourseOutlineTool;
pub use course_search::CourseSearchTool;

use crate::llm::{InputSchema, ToolDefinition};
use async_trait::async_trait;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// A genuine failure inside a found tool. Fatal to the current query.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },
    #[error("tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

/// Deserialize tool arguments, naming the tool on failure
pub(crate) fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Optional integer argument that models sometimes send as a string.
/// Out-of-range values such as negatives are kept so the tool can answer softly.
pub(crate) fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got '{text}'"))),
    }
}

/// Citation shown to the user next to an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub title: String,
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
    pub link: Option<String>,
}

impl SourceRecord {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_title: None,
            lesson_number: None,
            link: None,
        }
    }
}

/// What a tool recorded: a structured citation or a bare label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Record(SourceRecord),
    Label(String),
}

impl Source {
    /// Structured form; bare labels become title-only records
    pub fn into_record(self) -> SourceRecord {
        match self {
            Source::Record(record) => record,
            Source::Label(label) => SourceRecord::titled(label),
        }
    }
}

/// Per-tool source list, mutated only by that tool's run and reset
#[derive(Debug, Default)]
pub struct SourceLog {
    entries: Mutex<Vec<Source>>,
}

impl SourceLog {
    pub fn extend(&self, sources: impl IntoIterator<Item = Source>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(sources);
    }

    pub fn snapshot(&self) -> Vec<Source> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Trait for tools that can be executed by the assistant
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    fn input_schema(&self) -> InputSchema;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }

    /// Execute the tool. Conditions the model can react to are `Ok` text;
    /// `Err` aborts the query.
    async fn run(&self, input: Value) -> Result<String, ToolError>;

    /// Sources recorded since the last reset
    fn last_sources(&self) -> Vec<Source> {
        Vec::new()
    }

    fn reset_sources(&self) {}
}

/// Dispatches tool calls by name on behalf of the conversation controller
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError>;

    /// Get tool definitions for LLM
    fn definitions(&self) -> Vec<ToolDefinition>;
}

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError> {
        (**self).execute(name, input).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        (**self).definitions()
    }
}

/// Named tools available to one query at a time
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its name, returning any tool it replaced
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            tracing::warn!(tool = %tool.name(), "Replacing registered tool");
            return Some(std::mem::replace(slot, tool));
        }
        self.tools.push(tool);
        None
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Sources from every tool currently holding any
    pub fn last_sources(&self) -> Vec<Source> {
        self.tools.iter().flat_map(|t| t.last_sources()).collect()
    }

    pub fn reset_sources(&self) {
        for tool in &self.tools {
            tool.reset_sources();
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError> {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.run(input).await,
            None => {
                // The model can recover from a bad name, so answer in text
                tracing::warn!(tool = %name, "Model requested unknown tool");
                Ok(format!("Tool '{name}' not found"))
            }
        }
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}
