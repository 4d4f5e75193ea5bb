//! Course materials assistant
//!
//! Answers questions about course content by letting an LLM call
//! retrieval tools over a course store for a bounded number of rounds,
//! then returns the answer together with the sources it drew on.

pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod rag;
pub mod session;
pub mod store;
pub mod tools;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::RagError;
pub use rag::{load_store, CourseAnalytics, RagSystem};
