//! Environment-driven settings

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Settings for the assistant, all with defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub model: String,
    pub gateway: Option<String>,
    /// Search hits returned per query
    pub max_results: usize,
    /// Exchanges remembered per session
    pub max_history: usize,
    pub max_tool_rounds: u32,
    pub max_tokens: u32,
    pub temperature: f32,
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            gateway: None,
            max_results: 5,
            max_history: 2,
            max_tool_rounds: 2,
            max_tokens: 800,
            temperature: 0.0,
            catalog_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            model: get("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            gateway: get("LLM_GATEWAY"),
            max_results: parse_or(get("MAX_RESULTS"), "MAX_RESULTS", defaults.max_results),
            max_history: parse_or(get("MAX_HISTORY"), "MAX_HISTORY", defaults.max_history),
            max_tool_rounds: parse_or(
                get("MAX_TOOL_ROUNDS"),
                "MAX_TOOL_ROUNDS",
                defaults.max_tool_rounds,
            ),
            max_tokens: parse_or(get("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", defaults.max_tokens),
            temperature: parse_or(
                get("LLM_TEMPERATURE"),
                "LLM_TEMPERATURE",
                defaults.temperature,
            ),
            catalog_path: get("COURSE_CATALOG").map(PathBuf::from),
        }
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    if let Ok(value) = raw.trim().parse() {
        value
    } else {
        tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
        default
    }
}
