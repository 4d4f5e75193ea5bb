//! Mock implementations for testing
//!
//! These mocks enable controller and tool tests without real I/O.

use crate::llm::{
    ContentBlock, InputSchema, LlmError, LlmRequest, LlmResponse, LlmService, StopReason,
    ToolDefinition, Usage,
};
use crate::store::{CourseRecord, SearchQuery, SearchResults, StoreError, VectorStore};
use crate::tools::{ToolError, ToolExecutor};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Response builders
// ============================================================================

pub fn text_response(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        usage: Usage::default(),
    }
}

/// A tool-use turn with one block per `(id, name, input)`
pub fn tool_use_response(calls: &[(&str, &str, Value)]) -> LlmResponse {
    LlmResponse {
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone()))
            .collect(),
        stop_reason: StopReason::ToolUse,
        usage: Usage::default(),
    }
}

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Tool Executor
// ============================================================================

/// Mock tool executor with predefined outputs
#[derive(Default)]
pub struct MockToolExecutor {
    outputs: HashMap<String, Result<String, String>>,
    definitions: Vec<ToolDefinition>,
    /// Record of tool executions
    pub executions: Mutex<Vec<(String, Value)>>,
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool with a predefined output
    pub fn with_tool(mut self, name: &str, output: &str) -> Self {
        self.define(name);
        self.outputs.insert(name.to_string(), Ok(output.to_string()));
        self
    }

    /// Add a tool whose execution fails
    pub fn with_failing_tool(mut self, name: &str, message: &str) -> Self {
        self.define(name);
        self.outputs.insert(name.to_string(), Err(message.to_string()));
        self
    }

    fn define(&mut self, name: &str) {
        self.definitions.push(ToolDefinition {
            name: name.to_string(),
            description: format!("Mock {name}"),
            input_schema: InputSchema::new(),
        });
    }

    /// Get recorded executions
    pub fn recorded_executions(&self) -> Vec<(String, Value)> {
        self.executions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError> {
        self.executions
            .lock()
            .unwrap()
            .push((name.to_string(), input));
        match self.outputs.get(name) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(ToolError::Execution {
                tool: name.to_string(),
                message: message.clone(),
            }),
            None => Ok(format!("Tool '{name}' not found")),
        }
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }
}

// ============================================================================
// Stub Vector Store
// ============================================================================

/// Vector store returning canned answers and recording searches
#[derive(Default)]
pub struct StubStore {
    results: SearchResults,
    resolution: Option<String>,
    lesson_links: HashMap<(String, u32), String>,
    records: HashMap<String, CourseRecord>,
    record_error: Option<String>,
    searches: Mutex<Vec<SearchQuery>>,
}

impl StubStore {
    /// Results returned for every search
    pub fn with_results(mut self, results: SearchResults) -> Self {
        self.results = results;
        self
    }

    /// Every fuzzy name resolves to `title`
    pub fn resolving_to(mut self, title: &str) -> Self {
        self.resolution = Some(title.to_string());
        self
    }

    pub fn with_lesson_link(mut self, course: &str, lesson: u32, link: &str) -> Self {
        self.lesson_links
            .insert((course.to_string(), lesson), link.to_string());
        self
    }

    pub fn with_record(mut self, record: CourseRecord) -> Self {
        self.records.insert(record.title.clone(), record);
        self
    }

    /// Make every metadata read fail with `message`
    pub fn failing_records(mut self, message: &str) -> Self {
        self.record_error = Some(message.to_string());
        self
    }

    pub fn recorded_searches(&self) -> Vec<SearchQuery> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for StubStore {
    async fn search(&self, query: &SearchQuery) -> SearchResults {
        self.searches.lock().unwrap().push(query.clone());
        self.results.clone()
    }

    async fn resolve_course_name(&self, _fuzzy: &str) -> Option<String> {
        self.resolution.clone()
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        self.lesson_links
            .get(&(course_title.to_string(), lesson_number))
            .cloned()
    }

    async fn course_link(&self, course_title: &str) -> Option<String> {
        self.records.get(course_title)?.course_link.clone()
    }

    async fn course_record(&self, course_title: &str) -> Result<Option<CourseRecord>, StoreError> {
        if let Some(message) = &self.record_error {
            return Err(StoreError::Backend(message.clone()));
        }
        Ok(self.records.get(course_title).cloned())
    }

    async fn course_titles(&self) -> Vec<String> {
        let mut titles: Vec<_> = self.records.keys().cloned().collect();
        titles.sort();
        titles
    }
}
