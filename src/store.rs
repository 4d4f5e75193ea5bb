//! Course content store interface
//!
//! The retrieval tools only see the [`VectorStore`] trait. Embedding and
//! nearest-neighbour internals belong to whichever backend implements it;
//! [`MemoryStore`] is a small lexical stand-in for local use and tests.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Store failures that are not expressed as a [`SearchResults::error`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("malformed course metadata: {0}")]
    MalformedMetadata(String),
}

/// A lesson inside a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: u32,
    pub title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// A course as it is ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// A searchable slice of course text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<u32>,
    #[serde(default)]
    pub chunk_index: usize,
    pub content: String,
}

/// Pre-chunked courses, the on-disk input of [`MemoryStore`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub chunks: Vec<CourseChunk>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Lesson entry as kept in per-course catalog metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonEntry {
    pub lesson_number: u32,
    pub lesson_title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// Per-course metadata as stored in the catalog.
///
/// Lessons are kept serialized, the way a flat metadata store holds them,
/// so reading them back can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRecord {
    pub title: String,
    pub course_link: Option<String>,
    pub instructor: Option<String>,
    pub lessons_json: String,
}

impl CourseRecord {
    pub fn from_course(course: &Course) -> Result<Self, StoreError> {
        let lessons: Vec<LessonEntry> = course
            .lessons
            .iter()
            .map(|l| LessonEntry {
                lesson_number: l.lesson_number,
                lesson_title: l.title.clone(),
                lesson_link: l.lesson_link.clone(),
            })
            .collect();
        let lessons_json = serde_json::to_string(&lessons)
            .map_err(|e| StoreError::MalformedMetadata(e.to_string()))?;

        Ok(Self {
            title: course.title.clone(),
            course_link: course.course_link.clone(),
            instructor: course.instructor.clone(),
            lessons_json,
        })
    }

    pub fn lessons(&self) -> Result<Vec<LessonEntry>, StoreError> {
        serde_json::from_str(&self.lessons_json)
            .map_err(|e| StoreError::MalformedMetadata(format!("{}: {e}", self.title)))
    }
}

/// Metadata attached to every search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<u32>,
    #[serde(default)]
    pub chunk_index: usize,
}

/// A content search with optional filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Fuzzy course name, resolved by the store
    pub course_name: Option<String>,
    pub lesson_number: Option<u32>,
}

/// Parallel hit lists, or an error message in place of hits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents paired with their metadata, in rank order
    pub fn hits(&self) -> impl Iterator<Item = (&str, &ChunkMetadata)> {
        self.documents
            .iter()
            .map(String::as_str)
            .zip(self.metadata.iter())
    }
}

/// Course content store consumed by the retrieval tools
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Search chunk content. Failures come back in [`SearchResults::error`].
    async fn search(&self, query: &SearchQuery) -> SearchResults;

    /// Match a partial course name to one canonical title
    async fn resolve_course_name(&self, fuzzy: &str) -> Option<String>;

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String>;

    async fn course_link(&self, course_title: &str) -> Option<String>;

    /// Stored metadata for an exact course title
    async fn course_record(&self, course_title: &str) -> Result<Option<CourseRecord>, StoreError>;

    async fn course_titles(&self) -> Vec<String>;
}

#[async_trait]
impl<T: VectorStore + ?Sized> VectorStore for Arc<T> {
    async fn search(&self, query: &SearchQuery) -> SearchResults {
        (**self).search(query).await
    }

    async fn resolve_course_name(&self, fuzzy: &str) -> Option<String> {
        (**self).resolve_course_name(fuzzy).await
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        (**self).lesson_link(course_title, lesson_number).await
    }

    async fn course_link(&self, course_title: &str) -> Option<String> {
        (**self).course_link(course_title).await
    }

    async fn course_record(&self, course_title: &str) -> Result<Option<CourseRecord>, StoreError> {
        (**self).course_record(course_title).await
    }

    async fn course_titles(&self) -> Vec<String> {
        (**self).course_titles().await
    }
}
