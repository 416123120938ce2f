//! Command handlers.
//!
//! Each CLI subcommand maps to one handler. Handlers are the composition
//! root: they build the concrete collaborators from configuration and
//! wire them into the agent or the ingestion services. Nothing below this
//! layer constructs a client on its own.

use crate::agent::{AgentOptions, CoachAgent};
use crate::config::MentorConfig;
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::ingest::{QaExtractor, TranscriptCleaner, index::load_qa_file};
use crate::llm::{LlmProvider, OpenAiClient};
use crate::retrieval::{PineconeConfig, PineconeIndex};
use crate::websearch::{TavilyClient, TavilyConfig};
use crate::{Error, Result};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Builds the chat-completion provider from configuration.
fn build_llm(config: &MentorConfig) -> Arc<dyn LlmProvider> {
    Arc::new(
        OpenAiClient::new()
            .with_endpoint(config.llm.endpoint.clone())
            .with_model(config.llm.model.clone())
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens),
    )
}

/// Builds the embedder from configuration.
fn build_embedder(config: &MentorConfig) -> Arc<dyn Embedder> {
    Arc::new(
        OpenAiEmbedder::new()
            .with_endpoint(config.llm.endpoint.clone())
            .with_model(config.embedding.model.clone(), config.embedding.dimensions),
    )
}

/// Builds the vector index adapter from configuration.
fn build_index(config: &MentorConfig, embedder: Arc<dyn Embedder>) -> PineconeIndex {
    PineconeIndex::new(
        PineconeConfig {
            index_name: config.index.name.clone(),
            host: config.index.host.clone(),
            cloud: config.index.cloud.clone(),
            region: config.index.region.clone(),
        },
        embedder,
    )
}

/// Builds the fully wired agent from configuration.
#[must_use]
pub fn build_agent(config: &MentorConfig) -> CoachAgent {
    let llm = build_llm(config);
    let retriever = Arc::new(build_index(config, build_embedder(config)));
    let search = Arc::new(TavilyClient::new(TavilyConfig {
        endpoint: config.search.endpoint.clone(),
        search_depth: config.search.search_depth.clone(),
        include_answer: config.search.include_answer.clone(),
    }));

    CoachAgent::new(
        llm,
        retriever,
        search,
        AgentOptions {
            top_k: config.index.top_k,
            max_web_results: config.search.max_results,
            greeting: config.session.greeting.clone(),
            max_turns: config.session.max_turns,
            rollback_on_failure: config.session.rollback_on_failure,
        },
    )
}

fn io_failed(err: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: "chat_repl".to_string(),
        cause: err.to_string(),
    }
}

/// Runs the interactive chat REPL.
///
/// `/reset` clears the session, `/quit` exits.
///
/// # Errors
///
/// Returns an error on terminal I/O failure.
pub fn chat(config: &MentorConfig) -> Result<()> {
    let agent = build_agent(config);
    let session_id = uuid::Uuid::new_v4().to_string();

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    writeln!(stdout, "coach> {}", config.session.greeting).map_err(|e| io_failed(&e))?;
    write!(stdout, "you> ").map_err(|e| io_failed(&e))?;
    stdout.flush().map_err(|e| io_failed(&e))?;

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| io_failed(&e))?;
        let line = line.trim();

        match line {
            "" => {}
            "/quit" | "/exit" => break,
            "/reset" => {
                agent.reset_session(&session_id);
                writeln!(stdout, "coach> {}", config.session.greeting)
                    .map_err(|e| io_failed(&e))?;
            }
            message => {
                let reply = agent.respond(&session_id, message);
                writeln!(stdout, "coach> {reply}").map_err(|e| io_failed(&e))?;
            }
        }
        write!(stdout, "you> ").map_err(|e| io_failed(&e))?;
        stdout.flush().map_err(|e| io_failed(&e))?;
    }

    Ok(())
}

/// Runs the HTTP chat API.
///
/// # Errors
///
/// Returns an error if the server fails to start or serve.
pub fn serve(config: &MentorConfig) -> Result<()> {
    let agent = Arc::new(build_agent(config));
    crate::server::serve(agent, &config.server)
}

/// Cleans raw transcripts into speaker-attributed files.
///
/// # Errors
///
/// Returns an error if the directories cannot be processed.
pub fn clean(config: &MentorConfig) -> Result<usize> {
    let cleaner = TranscriptCleaner::new(build_llm(config))
        .with_chunking(config.ingest.chunk_size, config.ingest.chunk_overlap);
    cleaner.clean_dir(&config.ingest.transcripts_dir, &config.ingest.cleaned_dir)
}

/// Extracts Q&A records from cleaned transcripts.
///
/// # Errors
///
/// Returns an error if the record file cannot be produced.
pub fn extract(config: &MentorConfig) -> Result<usize> {
    let extractor = QaExtractor::new(build_llm(config));
    extractor.extract_dir(&config.ingest.cleaned_dir, &config.ingest.records_file)
}

/// Loads the record file into the vector index.
///
/// # Errors
///
/// Returns an error if reading, index creation, or upsert fails.
pub fn index(config: &MentorConfig) -> Result<usize> {
    let index = build_index(config, build_embedder(config));
    load_qa_file(&index, &config.ingest.records_file)
}

/// Prints a configuration and credential summary.
///
/// # Errors
///
/// Returns an error on terminal I/O failure.
pub fn status(config: &MentorConfig) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    let credential = |name: &str| {
        if std::env::var(name).is_ok() {
            "set"
        } else {
            "missing"
        }
    };

    writeln!(
        stdout,
        "mentor {}\n\
         model:            {}\n\
         embedding model:  {} ({} dims)\n\
         index:            {} (top_k {})\n\
         web search:       {} (max {})\n\
         session bound:    {}\n\
         server:           {}:{}\n\
         OPENAI_API_KEY:   {}\n\
         PINECONE_API_KEY: {}\n\
         TAVILY_API_KEY:   {}",
        env!("CARGO_PKG_VERSION"),
        config.llm.model,
        config.embedding.model,
        config.embedding.dimensions,
        config.index.name,
        config.index.top_k,
        config.search.search_depth,
        config.search.max_results,
        if config.session.max_turns == 0 {
            "unbounded".to_string()
        } else {
            format!("{} turns", config.session.max_turns)
        },
        config.server.host,
        config.server.port,
        credential("OPENAI_API_KEY"),
        credential("PINECONE_API_KEY"),
        credential("TAVILY_API_KEY"),
    )
    .map_err(|e| io_failed(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_agent_from_default_config() {
        let config = MentorConfig::default();
        let agent = build_agent(&config);
        assert_eq!(agent.sessions().session_count(), 0);
    }
}
