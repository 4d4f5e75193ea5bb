//! Course outline lookup

use super::{parse_input, Source, SourceLog, SourceRecord, Tool, ToolError};
use crate::llm::{InputSchema, ParamType};
use crate::store::{StoreError, VectorStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

const TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct CourseOutlineInput {
    course_name: String,
}

/// Returns title, link, instructor and lesson list for one course
pub struct CourseOutlineTool {
    store: Arc<dyn VectorStore>,
    sources: SourceLog,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            sources: SourceLog::default(),
        }
    }

    async fn outline(&self, course_title: &str) -> Result<String, StoreError> {
        let record = self
            .store
            .course_record(course_title)
            .await?
            .ok_or_else(|| {
                StoreError::Backend(format!("no metadata stored for '{course_title}'"))
            })?;

        let mut lessons = record.lessons()?;
        lessons.sort_by_key(|l| l.lesson_number);

        let mut out = format!("Course: {}\n", record.title);
        if let Some(link) = &record.course_link {
            let _ = writeln!(out, "Course Link: {link}");
        }
        if let Some(instructor) = &record.instructor {
            let _ = writeln!(out, "Instructor: {instructor}");
        }
        let _ = writeln!(out, "Total Lessons: {}", lessons.len());
        out.push_str("\nLessons:");
        for lesson in &lessons {
            let _ = write!(
                out,
                "\nLesson {}: {}",
                lesson.lesson_number, lesson.lesson_title
            );
        }

        self.sources.extend([Source::Record(SourceRecord {
            title: record.title.clone(),
            course_title: Some(record.title.clone()),
            lesson_number: None,
            link: record.course_link.clone(),
        })]);

        Ok(out)
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn description(&self) -> String {
        "Get the complete outline of a course: title, course link, instructor and every lesson \
         with its number and title"
            .to_string()
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new().required(
            "course_name",
            ParamType::String,
            "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
        )
    }

    async fn run(&self, input: Value) -> Result<String, ToolError> {
        let input: CourseOutlineInput = parse_input(TOOL_NAME, input)?;

        let Some(title) = self.store.resolve_course_name(&input.course_name).await else {
            return Ok(format!("No course found matching '{}'", input.course_name));
        };

        // Faces the model directly, so store trouble becomes text
        match self.outline(&title).await {
            Ok(outline) => Ok(outline),
            Err(e) => {
                tracing::warn!(course = %title, error = %e, "Course outline lookup failed");
                Ok(format!("Error retrieving course outline: {e}"))
            }
        }
    }

    fn last_sources(&self) -> Vec<Source> {
        self.sources.snapshot()
    }

    fn reset_sources(&self) {
        self.sources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CourseRecord;
    use crate::testing::StubStore;
    use serde_json::json;

    fn python_record() -> CourseRecord {
        CourseRecord {
            title: "Introduction to Python".into(),
            course_link: Some("https://example.com/python-course".into()),
            instructor: Some("John Doe".into()),
            lessons_json: r#"[
                {"lesson_number": 2, "lesson_title": "Variables"},
                {"lesson_number": 1, "lesson_title": "Getting Started"},
                {"lesson_number": 3, "lesson_title": "Functions"}
            ]"#
            .into(),
        }
    }

    #[test]
    fn test_definition_requires_course_name() {
        let tool = CourseOutlineTool::new(Arc::new(StubStore::default()));
        let def = tool.definition();
        assert_eq!(def.name, "get_course_outline");
        assert_eq!(def.input_schema.required_names(), vec!["course_name"]);
    }

    #[tokio::test]
    async fn test_outline_for_known_course() {
        let store = StubStore::default()
            .resolving_to("Introduction to Python")
            .with_record(python_record());
        let tool = CourseOutlineTool::new(Arc::new(store));

        let result = tool.run(json!({"course_name": "Python"})).await.unwrap();

        assert_eq!(
            result,
            "Course: Introduction to Python\n\
             Course Link: https://example.com/python-course\n\
             Instructor: John Doe\n\
             Total Lessons: 3\n\
             \n\
             Lessons:\n\
             Lesson 1: Getting Started\n\
             Lesson 2: Variables\n\
             Lesson 3: Functions"
        );
        let sources = tool.last_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(
            sources[0].clone().into_record().link.as_deref(),
            Some("https://example.com/python-course")
        );
    }

    #[tokio::test]
    async fn test_unknown_course() {
        let tool = CourseOutlineTool::new(Arc::new(StubStore::default()));
        let result = tool
            .run(json!({"course_name": "Nonexistent Course"}))
            .await
            .unwrap();
        assert_eq!(result, "No course found matching 'Nonexistent Course'");
        assert!(tool.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_metadata_becomes_text() {
        let mut record = python_record();
        record.lessons_json = "{oops".into();
        let store = StubStore::default()
            .resolving_to("Introduction to Python")
            .with_record(record);
        let tool = CourseOutlineTool::new(Arc::new(store));

        let result = tool.run(json!({"course_name": "Python"})).await.unwrap();
        assert!(result.starts_with("Error retrieving course outline:"));
        assert!(result.contains("malformed course metadata"));
    }

    #[tokio::test]
    async fn test_store_failure_becomes_text() {
        let store = StubStore::default()
            .resolving_to("Test Course")
            .failing_records("Database error");
        let tool = CourseOutlineTool::new(Arc::new(store));

        let result = tool.run(json!({"course_name": "Test"})).await.unwrap();
        assert!(result.contains("Error retrieving course outline"));
        assert!(result.contains("Database error"));
    }

    #[tokio::test]
    async fn test_missing_link_and_instructor_are_omitted() {
        let record = CourseRecord {
            title: "Bare Course".into(),
            course_link: None,
            instructor: None,
            lessons_json: "[]".into(),
        };
        let store = StubStore::default().resolving_to("Bare Course").with_record(record);
        let tool = CourseOutlineTool::new(Arc::new(store));

        let result = tool.run(json!({"course_name": "bare"})).await.unwrap();
        assert_eq!(result, "Course: Bare Course\nTotal Lessons: 0\n\nLessons:");
    }
}
