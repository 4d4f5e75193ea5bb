//! In-memory lexical course store

use super::{
    Catalog, ChunkMetadata, Course, CourseChunk, CourseRecord, SearchQuery, SearchResults,
    StoreError, VectorStore,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};

/// Course store that ranks chunks by query-term overlap.
///
/// Stands in for an embedding-backed store: same interface, same
/// soft-failure behaviour, no vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    max_results: usize,
    courses: BTreeMap<String, CourseRecord>,
    chunks: Vec<CourseChunk>,
}

impl MemoryStore {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            ..Self::default()
        }
    }

    pub fn from_catalog(catalog: Catalog, max_results: usize) -> Result<Self, StoreError> {
        let mut store = Self::new(max_results);
        for course in &catalog.courses {
            store.add_course_metadata(course)?;
        }
        store.add_course_content(catalog.chunks);
        Ok(store)
    }

    pub fn add_course_metadata(&mut self, course: &Course) -> Result<(), StoreError> {
        let record = CourseRecord::from_course(course)?;
        self.courses.insert(record.title.clone(), record);
        Ok(())
    }

    pub fn add_course_content(&mut self, chunks: impl IntoIterator<Item = CourseChunk>) {
        self.chunks.extend(chunks);
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn resolve(&self, fuzzy: &str) -> Option<String> {
        let wanted = fuzzy.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        if let Some(title) = self.courses.keys().find(|t| t.to_lowercase() == wanted) {
            return Some(title.clone());
        }
        if let Some(title) = self.courses.keys().find(|t| {
            let lower = t.to_lowercase();
            lower.contains(&wanted) || wanted.contains(&lower)
        }) {
            return Some(title.clone());
        }

        let wanted_terms = terms(&wanted);
        self.courses
            .keys()
            .map(|title| (overlap(&wanted_terms, &terms(title)), title))
            .filter(|(score, _)| *score > 0)
            // max_by_key keeps the last maximum; reverse so the first title wins ties
            .rev()
            .max_by_key(|(score, _)| *score)
            .map(|(_, title)| title.clone())
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn search(&self, query: &SearchQuery) -> SearchResults {
        let course_title = match &query.course_name {
            Some(name) => match self.resolve(name) {
                Some(title) => Some(title),
                None => return SearchResults::empty(format!("No course found matching '{name}'")),
            },
            None => None,
        };

        let wanted = terms(&query.query);
        if wanted.is_empty() {
            return SearchResults::default();
        }

        let mut scored: Vec<(usize, &CourseChunk)> = self
            .chunks
            .iter()
            .filter(|c| course_title.as_ref().map_or(true, |t| &c.course_title == t))
            .filter(|c| query.lesson_number.map_or(true, |n| c.lesson_number == Some(n)))
            .map(|c| (overlap(&wanted, &terms(&c.content)), c))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.max_results);

        let total = wanted.len();
        let mut results = SearchResults::default();
        for (score, chunk) in scored {
            results.documents.push(chunk.content.clone());
            results.metadata.push(ChunkMetadata {
                course_title: chunk.course_title.clone(),
                lesson_number: chunk.lesson_number,
                chunk_index: chunk.chunk_index,
            });
            #[allow(clippy::cast_precision_loss)] // term counts are tiny
            results.distances.push(1.0 - score as f32 / total as f32);
        }
        results
    }

    async fn resolve_course_name(&self, fuzzy: &str) -> Option<String> {
        self.resolve(fuzzy)
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        let record = self.courses.get(course_title)?;
        let lessons = match record.lessons() {
            Ok(lessons) => lessons,
            Err(e) => {
                tracing::warn!(course = %course_title, error = %e, "Unreadable lesson metadata");
                return None;
            }
        };
        lessons
            .into_iter()
            .find(|l| l.lesson_number == lesson_number)
            .and_then(|l| l.lesson_link)
    }

    async fn course_link(&self, course_title: &str) -> Option<String> {
        self.courses.get(course_title)?.course_link.clone()
    }

    async fn course_record(&self, course_title: &str) -> Result<Option<CourseRecord>, StoreError> {
        Ok(self.courses.get(course_title).cloned())
    }

    async fn course_titles(&self) -> Vec<String> {
        self.courses.keys().cloned().collect()
    }
}
