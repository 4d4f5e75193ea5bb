//! Content search over course material

use super::{lenient_int, parse_input, Source, SourceLog, SourceRecord, Tool, ToolError};
use crate::llm::{InputSchema, ParamType};
use crate::store::{SearchQuery, SearchResults, VectorStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct CourseSearchInput {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    lesson_number: Option<i64>,
}

/// Searches chunk content, optionally filtered by course and lesson.
///
/// `lesson_number` may arrive as an integer or a numeric string. A lesson
/// number no lesson can have yields the soft "no content" reply; arguments
/// that are not numbers at all are fatal input errors.
pub struct CourseSearchTool {
    store: Arc<dyn VectorStore>,
    sources: SourceLog,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            sources: SourceLog::default(),
        }
    }

    async fn format_results(&self, results: &SearchResults) -> String {
        let mut formatted = Vec::with_capacity(results.documents.len());
        let mut sources = Vec::with_capacity(results.documents.len());

        for (document, meta) in results.hits() {
            let label = match meta.lesson_number {
                Some(n) => format!("{} - Lesson {n}", meta.course_title),
                None => meta.course_title.clone(),
            };

            let link = match meta.lesson_number {
                Some(n) => self.store.lesson_link(&meta.course_title, n).await,
                None => None,
            };

            formatted.push(format!("[{label}]\n{document}"));
            sources.push(Source::Record(SourceRecord {
                title: label,
                course_title: Some(meta.course_title.clone()),
                lesson_number: meta.lesson_number,
                link,
            }));
        }

        self.sources.extend(sources);
        formatted.join("\n\n")
    }
}

fn no_results_message(input: &CourseSearchInput) -> String {
    let mut filter_info = String::new();
    if let Some(course) = &input.course_name {
        filter_info.push_str(&format!(" in course '{course}'"));
    }
    if let Some(lesson) = input.lesson_number {
        filter_info.push_str(&format!(" in lesson {lesson}"));
    }
    format!("No relevant content found{filter_info}.")
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn description(&self) -> String {
        "Search course materials with smart course name matching and lesson filtering".to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(
                "query",
                ParamType::String,
                "What to search for in the course content",
            )
            .optional(
                "course_name",
                ParamType::String,
                "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
            )
            .optional(
                "lesson_number",
                ParamType::Integer,
                "Specific lesson number to search within (e.g. 1, 2, 3)",
            )
    }

    async fn run(&self, input: Value) -> Result<String, ToolError> {
        let input: CourseSearchInput = parse_input(TOOL_NAME, input)?;

        let lesson_number = match input.lesson_number.map(u32::try_from).transpose() {
            Ok(n) => n,
            Err(_) => return Ok(no_results_message(&input)),
        };

        let results = self
            .store
            .search(&SearchQuery {
                query: input.query.clone(),
                course_name: input.course_name.clone(),
                lesson_number,
            })
            .await;

        // Store errors go back to the model verbatim so it can rephrase
        if let Some(error) = results.error {
            tracing::debug!(error = %error, "Course search reported an error");
            return Ok(error);
        }

        if results.is_empty() {
            return Ok(no_results_message(&input));
        }

        tracing::debug!(hits = results.documents.len(), "Course search returned hits");
        Ok(self.format_results(&results).await)
    }

    fn last_sources(&self) -> Vec<Source> {
        self.sources.snapshot()
    }

    fn reset_sources(&self) {
        self.sources.clear();
    }
}
