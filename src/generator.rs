//! Conversation controller
//!
//! Runs one user query against the model, executing requested tools for a
//! bounded number of rounds. Once the round budget is spent the model gets
//! one last call with tools withheld, so every query ends in text.

mod prompt;
mod round;

#[cfg(test)]
mod proptests;

pub use prompt::system_prompt;
pub use round::{next_step, NextCall, Step};

use crate::llm::{
    LlmError, LlmMessage, LlmRequest, LlmResponse, LlmService, ToolCall, ToolChoice,
    ToolDefinition, ToolResult,
};
use crate::tools::{ToolError, ToolExecutor};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_MAX_ROUNDS: u32 = 2;

/// Errors that abort a query
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("tool '{name}' failed in round {round}: {source}")]
    Tool {
        name: String,
        round: u32,
        #[source]
        source: ToolError,
    },
}

/// Fixed per-generator model parameters
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            system_prompt: system_prompt(DEFAULT_MAX_ROUNDS),
            max_tokens: 800,
            temperature: 0.0,
        }
    }
}

/// One query for [`AiGenerator::generate`]
pub struct GenerateRequest<'a> {
    query: &'a str,
    history: Option<&'a str>,
    tools: Vec<ToolDefinition>,
    executor: Option<&'a dyn ToolExecutor>,
    max_rounds: u32,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            history: None,
            tools: Vec::new(),
            executor: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Prior exchanges, already formatted. Empty history counts as none.
    pub fn history(mut self, history: Option<&'a str>) -> Self {
        self.history = history.filter(|h| !h.is_empty());
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn executor(mut self, executor: &'a dyn ToolExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Offer every tool the executor knows and let it run them
    pub fn tools_from(self, executor: &'a dyn ToolExecutor) -> Self {
        let tools = executor.definitions();
        self.tools(tools).executor(executor)
    }

    /// Tool round budget; zero is treated as one
    pub fn max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }
}

/// Loop state for a single query
struct RoundState {
    /// Tool rounds completed so far
    round: u32,
    max_rounds: u32,
    transcript: Vec<LlmMessage>,
}

/// Drives the model through tool rounds to a final text answer
pub struct AiGenerator {
    llm: Arc<dyn LlmService>,
    settings: GeneratorSettings,
}

impl AiGenerator {
    pub fn new(llm: Arc<dyn LlmService>, settings: GeneratorSettings) -> Self {
        Self { llm, settings }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    fn system_content(&self, history: Option<&str>) -> String {
        match history {
            Some(history) => format!(
                "{}\n\nPrevious conversation:\n{history}",
                self.settings.system_prompt
            ),
            None => self.settings.system_prompt.clone(),
        }
    }

    /// Answer one query, running tools as the model requests them.
    ///
    /// Makes at most `max_rounds + 1` model calls. The first model or tool
    /// failure aborts the query.
    pub async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, GenerateError> {
        let GenerateRequest {
            query,
            history,
            tools,
            executor,
            max_rounds,
        } = request;

        let system = self.system_content(history);
        let mut state = RoundState {
            round: 0,
            max_rounds,
            transcript: vec![LlmMessage::user_text(query)],
        };

        let mut tools_offered = !tools.is_empty();
        let mut response = self
            .call(&system, &state.transcript, tools_offered.then_some(&tools[..]))
            .await?;

        loop {
            let step = next_step(
                state.round,
                state.max_rounds,
                tools_offered,
                response.requests_tool_use(),
            );
            let (Step::ExecuteTools { round, next_call }, Some(runner)) = (step, executor) else {
                return Ok(response.text());
            };

            let calls = response.tool_calls();
            tracing::debug!(round, calls = calls.len(), "Executing tool round");
            state.transcript.push(LlmMessage::assistant(response.content));

            let results = execute_round(runner, &calls, round).await?;
            // A tool-use turn without tool_use blocks contributes no result message
            if !results.is_empty() {
                state.transcript.push(LlmMessage::tool_results(results));
            }
            state.round = round;

            tools_offered = next_call == NextCall::WithTools;
            if !tools_offered {
                tracing::info!(
                    rounds = state.round,
                    max_rounds = state.max_rounds,
                    "Tool round budget spent, requesting final answer without tools"
                );
            }

            response = self
                .call(&system, &state.transcript, tools_offered.then_some(&tools[..]))
                .await?;
        }
    }

    async fn call(
        &self,
        system: &str,
        transcript: &[LlmMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse, LlmError> {
        let tools = tools.filter(|t| !t.is_empty());
        let request = LlmRequest {
            system: system.to_string(),
            messages: transcript.to_vec(),
            tools: tools.map(<[ToolDefinition]>::to_vec).unwrap_or_default(),
            tool_choice: tools.map(|_| ToolChoice::Auto),
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        };
        self.llm.complete(&request).await
    }
}

/// Run one round's calls in emission order; the first failure aborts
async fn execute_round(
    executor: &dyn ToolExecutor,
    calls: &[ToolCall],
    round: u32,
) -> Result<Vec<ToolResult>, GenerateError> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        tracing::debug!(tool = %call.name, id = %call.id, round, "Executing tool");
        let content = executor
            .execute(&call.name, call.input.clone())
            .await
            .map_err(|source| GenerateError::Tool {
                name: call.name.clone(),
                round,
                source,
            })?;
        results.push(ToolResult {
            tool_use_id: call.id.clone(),
            content,
        });
    }
    Ok(results)
}
