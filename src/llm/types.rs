//! Common types for LLM interactions

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// LLM request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// How the model may pick tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
}

/// Message in conversation
#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl LlmMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
        }
    }

    /// A user turn carrying one `tool_result` block per executed call
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: MessageRole::User,
            content: results
                .into_iter()
                .map(|r| ContentBlock::tool_result(r.tool_use_id, r.content))
                .collect(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }
}

/// A tool invocation requested by the model, consumed once by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Output of one tool call, tagged with the call it answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
}

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One named tool parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

/// Structured input schema, rendered to JSON Schema for the vendor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    pub properties: BTreeMap<String, ParamSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.param(name, kind, description, true)
    }

    pub fn optional(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.param(name, kind, description, false)
    }

    fn param(mut self, name: &str, kind: ParamType, description: &str, required: bool) -> Self {
        self.properties.insert(
            name.to_string(),
            ParamSpec {
                kind,
                description: description.to_string(),
                required,
            },
        );
        self
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    json!({
                        "type": spec.kind.as_str(),
                        "description": spec.description,
                    }),
                )
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
        })
    }
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other(String),
}

impl StopReason {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            Some("end_turn") | None => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            Some(other) => StopReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => f.write_str("end_turn"),
            StopReason::ToolUse => f.write_str("tool_use"),
            StopReason::MaxTokens => f.write_str("max_tokens"),
            StopReason::StopSequence => f.write_str("stop_sequence"),
            StopReason::Other(raw) => f.write_str(raw),
        }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl LlmResponse {
    /// Whether the model stopped in order to call tools
    pub fn requests_tool_use(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }

    /// Tool use requests in the order the model emitted them
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                ContentBlock::Text { .. } | ContentBlock::ToolResult { .. } => None,
            })
            .collect()
    }

    /// Get text content from the response
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_renders_required_list() {
        let schema = InputSchema::new()
            .required("query", ParamType::String, "What to search for")
            .optional("lesson_number", ParamType::Integer, "Lesson filter");

        let rendered = schema.to_json();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["query"]));
        assert_eq!(rendered["properties"]["lesson_number"]["type"], "integer");
        assert_eq!(
            rendered["properties"]["query"]["description"],
            "What to search for"
        );
    }

    #[test]
    fn test_tool_calls_keep_emission_order() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::text("Let me look."),
                ContentBlock::tool_use("b", "second", json!({})),
                ContentBlock::tool_use("a", "first", json!({"x": 1})),
            ],
            stop_reason: StopReason::ToolUse,
            usage: Usage::default(),
        };

        let ids: Vec<_> = response.tool_calls().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(response.text(), "Let me look.");
        assert!(response.requests_tool_use());
    }

    #[test]
    fn test_text_skips_tool_blocks() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::text("Part one. "),
                ContentBlock::tool_use("t1", "search_course_content", json!({})),
                ContentBlock::tool_result("t0", "ignored"),
                ContentBlock::text("Part two."),
            ],
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        };
        assert_eq!(response.text(), "Part one. Part two.");
    }

    #[test]
    fn test_stop_reason_parsing() {
        assert_eq!(StopReason::from_api(Some("tool_use")), StopReason::ToolUse);
        assert_eq!(StopReason::from_api(None), StopReason::EndTurn);
        assert_eq!(
            StopReason::from_api(Some("refusal")),
            StopReason::Other("refusal".to_string())
        );
    }

    #[test]
    fn test_tool_results_message_keeps_ids() {
        let msg = LlmMessage::tool_results(vec![
            ToolResult {
                tool_use_id: "t1".into(),
                content: "one".into(),
            },
            ToolResult {
                tool_use_id: "t2".into(),
                content: "two".into(),
            },
        ]);
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(
            msg.content,
            vec![
                ContentBlock::tool_result("t1", "one"),
                ContentBlock::tool_result("t2", "two"),
            ]
        );
    }
}
