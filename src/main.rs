//! course-rag - ask questions about a course catalog from the terminal
//!
//! Usage: `course-rag [CATALOG_PATH]` (or set `COURSE_CATALOG`). One
//! question per line; `/clear` forgets the conversation, `/courses` lists
//! the catalog.

use course_rag::llm::{AnthropicService, LlmService, LoggingService};
use course_rag::{load_store, Config, RagError, RagSystem};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_rag=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = Config::from_env();

    let catalog_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.catalog_path.clone())
        .ok_or_else(|| {
            RagError::Config("no catalog given; pass CATALOG_PATH or set COURSE_CATALOG".into())
        })?;
    let store = load_store(&catalog_path, config.max_results).await?;

    let llm = build_llm(&config)?;
    tracing::info!(model = %llm.model_id(), "LLM initialized");

    let rag = RagSystem::new(&config, llm, Arc::new(store));
    let session = rag.create_session();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        match question {
            "" => {}
            "/clear" => {
                rag.clear_session(&session);
                println!("Conversation cleared.");
            }
            "/courses" => {
                let analytics = rag.course_analytics().await;
                println!("{} courses:", analytics.total_courses);
                for title in &analytics.course_titles {
                    println!("  - {title}");
                }
            }
            _ => match rag.query(question, Some(&session)).await {
                Ok((answer, sources)) => {
                    println!("{answer}");
                    if !sources.is_empty() {
                        println!("\nSources:");
                        for source in &sources {
                            match &source.link {
                                Some(link) => println!("  - {} ({link})", source.title),
                                None => println!("  - {}", source.title),
                            }
                        }
                    }
                    println!();
                }
                // Keep the loop alive; the error is already logged
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }

    Ok(())
}

fn build_llm(config: &Config) -> Result<Arc<dyn LlmService>, RagError> {
    let api_key = match (&config.anthropic_api_key, &config.gateway) {
        (Some(key), _) => key.clone(),
        // The gateway injects credentials itself
        (None, Some(_)) => "implicit".to_string(),
        (None, None) => {
            return Err(RagError::Config(
                "set ANTHROPIC_API_KEY or LLM_GATEWAY".into(),
            ))
        }
    };

    let service = AnthropicService::new(api_key, config.model.clone(), config.gateway.as_deref())
        .map_err(|e| RagError::Config(e.to_string()))?;
    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}
