//! Configuration management.
//!
//! Runtime configuration is assembled from defaults, an optional
//! `mentor.toml` (current directory, then the platform config directory),
//! and environment overrides, in that order. API keys never live in the
//! config file; clients read them from the environment and hold them as
//! [`secrecy::SecretString`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name searched for in the discovery paths.
const CONFIG_FILE_NAME: &str = "mentor.toml";

/// Main configuration for mentor.
#[derive(Debug, Clone, Default)]
pub struct MentorConfig {
    /// Chat-completion model settings.
    pub llm: LlmSettings,
    /// Embedding model settings.
    pub embedding: EmbeddingSettings,
    /// Vector index settings.
    pub index: IndexSettings,
    /// Web search settings.
    pub search: SearchSettings,
    /// Session memory settings.
    pub session: SessionSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Ingestion pipeline settings.
    pub ingest: IngestSettings,
}

/// Chat-completion model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Model name.
    pub model: String,
    /// API endpoint.
    pub endpoint: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            endpoint: crate::llm::OpenAiClient::DEFAULT_ENDPOINT.to_string(),
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    /// Embedding model name.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: crate::embedding::OpenAiEmbedder::DEFAULT_MODEL.to_string(),
            dimensions: crate::embedding::OpenAiEmbedder::DEFAULT_DIMENSIONS,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Index name.
    pub name: String,
    /// Data-plane host, when known up front.
    pub host: Option<String>,
    /// Serverless cloud provider.
    pub cloud: String,
    /// Serverless region.
    pub region: String,
    /// Retrieval depth per routed question.
    pub top_k: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "leadership-qa".to_string(),
            host: None,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            top_k: 3,
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// API endpoint.
    pub endpoint: String,
    /// Search depth: `"basic"` or `"advanced"`.
    pub search_depth: String,
    /// Answer synthesis mode: `"basic"` or `"advanced"`.
    pub include_answer: String,
    /// Result cap for the fallback search.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: crate::websearch::TavilyClient::DEFAULT_ENDPOINT.to_string(),
            search_depth: "advanced".to_string(),
            include_answer: "advanced".to_string(),
            max_results: 3,
        }
    }
}

/// Session memory settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Greeting seeded into every fresh session.
    pub greeting: String,
    /// Keep-last bound on session turns; `0` disables truncation.
    pub max_turns: usize,
    /// Whether a failed turn removes the recorded user turn.
    pub rollback_on_failure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            greeting: crate::agent::DEFAULT_GREETING.to_string(),
            max_turns: 0,
            rollback_on_failure: false,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Ingestion pipeline settings.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Directory of raw transcript files.
    pub transcripts_dir: PathBuf,
    /// Directory for cleaned transcript files.
    pub cleaned_dir: PathBuf,
    /// Canonical Q&A record file.
    pub records_file: PathBuf,
    /// Cleanup chunk size in characters.
    pub chunk_size: usize,
    /// Cleanup chunk overlap in characters.
    pub chunk_overlap: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            transcripts_dir: PathBuf::from("transcriptions"),
            cleaned_dir: PathBuf::from("cleaned_transcriptions"),
            records_file: PathBuf::from("qa_records.json"),
            chunk_size: crate::ingest::clean::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::ingest::clean::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl MentorConfig {
    /// Loads configuration from an explicit path or the discovery paths,
    /// then applies environment overrides.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is unreadable or any
    /// found file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => Some(ConfigFile::read(path)?),
            None => Self::discover()?,
        };

        let mut config = file.map_or_else(Self::default, ConfigFile::into_config);
        config.apply_env_overrides();
        Ok(config)
    }

    /// Searches the discovery paths for a config file.
    fn discover() -> Result<Option<ConfigFile>> {
        let cwd_path = PathBuf::from(CONFIG_FILE_NAME);
        if cwd_path.is_file() {
            return ConfigFile::read(&cwd_path).map(Some);
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "mentor") {
            let path = dirs.config_dir().join(CONFIG_FILE_NAME);
            if path.is_file() {
                return ConfigFile::read(&path).map(Some);
            }
        }

        Ok(None)
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("MENTOR_MODEL") {
            self.llm.model = model;
        }
        if let Ok(name) = std::env::var("MENTOR_INDEX_NAME") {
            self.index.name = name;
        }
        if let Ok(host) = std::env::var("MENTOR_INDEX_HOST") {
            self.index.host = Some(host);
        }
        if let Ok(port) = std::env::var("MENTOR_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// LLM section.
    pub llm: Option<LlmSection>,
    /// Embedding section.
    pub embedding: Option<EmbeddingSection>,
    /// Index section.
    pub index: Option<IndexSection>,
    /// Search section.
    pub search: Option<SearchSection>,
    /// Session section.
    pub session: Option<SessionSection>,
    /// Server section.
    pub server: Option<ServerSection>,
    /// Ingest section.
    pub ingest: Option<IngestSection>,
}

/// LLM section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct LlmSection {
    /// Model name.
    pub model: Option<String>,
    /// API endpoint.
    pub endpoint: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Completion token limit.
    pub max_tokens: Option<u32>,
}

/// Embedding section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct EmbeddingSection {
    /// Embedding model name.
    pub model: Option<String>,
    /// Embedding dimensions.
    pub dimensions: Option<usize>,
}

/// Index section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct IndexSection {
    /// Index name.
    pub name: Option<String>,
    /// Data-plane host.
    pub host: Option<String>,
    /// Serverless cloud provider.
    pub cloud: Option<String>,
    /// Serverless region.
    pub region: Option<String>,
    /// Retrieval depth.
    pub top_k: Option<usize>,
}

/// Search section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct SearchSection {
    /// API endpoint.
    pub endpoint: Option<String>,
    /// Search depth.
    pub search_depth: Option<String>,
    /// Answer synthesis mode.
    pub include_answer: Option<String>,
    /// Result cap.
    pub max_results: Option<usize>,
}

/// Session section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct SessionSection {
    /// Greeting text.
    pub greeting: Option<String>,
    /// Keep-last turn bound.
    pub max_turns: Option<usize>,
    /// Rollback policy.
    pub rollback_on_failure: Option<bool>,
}

/// Server section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    /// Bind address.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
}

/// Ingest section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct IngestSection {
    /// Raw transcript directory.
    pub transcripts_dir: Option<PathBuf>,
    /// Cleaned transcript directory.
    pub cleaned_dir: Option<PathBuf>,
    /// Record file path.
    pub records_file: Option<PathBuf>,
    /// Chunk size.
    pub chunk_size: Option<usize>,
    /// Chunk overlap.
    pub chunk_overlap: Option<usize>,
}

impl ConfigFile {
    /// Reads and parses a config file.
    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        toml::from_str(&raw).map_err(|e| Error::OperationFailed {
            operation: "parse_config".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
    }

    /// Merges the file over the defaults.
    fn into_config(self) -> MentorConfig {
        let mut config = MentorConfig::default();

        if let Some(llm) = self.llm {
            merge(&mut config.llm.model, llm.model);
            merge(&mut config.llm.endpoint, llm.endpoint);
            merge(&mut config.llm.temperature, llm.temperature);
            merge(&mut config.llm.max_tokens, llm.max_tokens);
        }
        if let Some(embedding) = self.embedding {
            merge(&mut config.embedding.model, embedding.model);
            merge(&mut config.embedding.dimensions, embedding.dimensions);
        }
        if let Some(index) = self.index {
            merge(&mut config.index.name, index.name);
            config.index.host = index.host.or(config.index.host);
            merge(&mut config.index.cloud, index.cloud);
            merge(&mut config.index.region, index.region);
            merge(&mut config.index.top_k, index.top_k);
        }
        if let Some(search) = self.search {
            merge(&mut config.search.endpoint, search.endpoint);
            merge(&mut config.search.search_depth, search.search_depth);
            merge(&mut config.search.include_answer, search.include_answer);
            merge(&mut config.search.max_results, search.max_results);
        }
        if let Some(session) = self.session {
            merge(&mut config.session.greeting, session.greeting);
            merge(&mut config.session.max_turns, session.max_turns);
            merge(
                &mut config.session.rollback_on_failure,
                session.rollback_on_failure,
            );
        }
        if let Some(server) = self.server {
            merge(&mut config.server.host, server.host);
            merge(&mut config.server.port, server.port);
        }
        if let Some(ingest) = self.ingest {
            merge(&mut config.ingest.transcripts_dir, ingest.transcripts_dir);
            merge(&mut config.ingest.cleaned_dir, ingest.cleaned_dir);
            merge(&mut config.ingest.records_file, ingest.records_file);
            merge(&mut config.ingest.chunk_size, ingest.chunk_size);
            merge(&mut config.ingest.chunk_overlap, ingest.chunk_overlap);
        }

        config
    }
}

/// Overwrites `target` when the file supplied a value.
fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
