//! Pinecone serverless index adapter.
//!
//! Thin REST client over the Pinecone data plane (`/query`,
//! `/vectors/upsert`) and control plane (index create/describe). The
//! data-plane host is resolved once through the control plane and cached
//! unless configured explicitly.

use super::QaRetriever;
use crate::embedding::Embedder;
use crate::llm::{LlmHttpConfig, build_http_client};
use crate::models::{QaRecord, RetrievedMatch};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Control-plane endpoint.
const CONTROL_PLANE: &str = "https://api.pinecone.io";

/// Upsert batch size accepted by the data plane.
const UPSERT_BATCH: usize = 100;

/// Pinecone connection settings.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// Index name.
    pub index_name: String,
    /// Data-plane host, when known up front (skips control-plane lookup).
    pub host: Option<String>,
    /// Serverless cloud provider for index creation.
    pub cloud: String,
    /// Serverless region for index creation.
    pub region: String,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            index_name: "leadership-qa".to_string(),
            host: None,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Pinecone index client.
///
/// Implements [`QaRetriever`] for the agent and exposes `ensure_index` /
/// `upsert` for the ingestion pipeline.
pub struct PineconeIndex {
    /// API key.
    api_key: Option<SecretString>,
    /// Connection settings.
    config: PineconeConfig,
    /// Embedder used for query and record vectors.
    embedder: Arc<dyn Embedder>,
    /// Cached data-plane host.
    host: RwLock<Option<String>>,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl PineconeIndex {
    /// Creates a new index client with the key from `PINECONE_API_KEY`.
    #[must_use]
    pub fn new(config: PineconeConfig, embedder: Arc<dyn Embedder>) -> Self {
        let api_key = std::env::var("PINECONE_API_KEY")
            .ok()
            .map(SecretString::from);
        let host = RwLock::new(config.host.clone());
        Self {
            api_key,
            config,
            embedder,
            host,
            client: build_http_client(LlmHttpConfig::from_env()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .ok_or_else(|| Error::MissingCredential("PINECONE_API_KEY".to_string()))
    }

    /// Ensures the serverless index exists, creating it when absent.
    ///
    /// The index is created with the embedder's dimension count and cosine
    /// metric, matching how the stored vectors are produced.
    ///
    /// # Errors
    ///
    /// Returns an error if the control-plane calls fail.
    pub fn ensure_index(&self) -> Result<()> {
        if self.describe_index()?.is_some() {
            return Ok(());
        }

        tracing::info!(
            index = %self.config.index_name,
            dimensions = self.embedder.dimensions(),
            "creating serverless index"
        );

        let request = CreateIndexRequest {
            name: self.config.index_name.clone(),
            dimension: self.embedder.dimensions(),
            metric: "cosine".to_string(),
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: self.config.cloud.clone(),
                    region: self.config.region.clone(),
                },
            },
        };

        let response = self
            .client
            .post(format!("{CONTROL_PLANE}/indexes"))
            .header("Api-Key", self.api_key()?.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| Error::OperationFailed {
                operation: "pinecone_create_index".to_string(),
                cause: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "pinecone_create_index".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let description: IndexDescription =
            response.json().map_err(|e| Error::OperationFailed {
                operation: "pinecone_create_index".to_string(),
                cause: e.to_string(),
            })?;
        self.cache_host(description.host);
        Ok(())
    }

    /// Upserts records in batches, returning the number written.
    ///
    /// Each record is embedded as `"{question} {answer}"` and stored under
    /// a fresh UUID with the full record as metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or any upsert batch fails.
    pub fn upsert(&self, records: &[QaRecord]) -> Result<usize> {
        let host = self.resolve_host()?;
        let mut written = 0;

        for batch in records.chunks(UPSERT_BATCH) {
            let texts: Vec<String> = batch.iter().map(QaRecord::embedding_text).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let embeddings = self.embedder.embed_batch(&refs)?;

            let vectors: Vec<UpsertVector<'_>> = batch
                .iter()
                .zip(embeddings)
                .map(|(record, values)| UpsertVector {
                    id: uuid::Uuid::new_v4().to_string(),
                    values,
                    metadata: record,
                })
                .collect();

            let response = self
                .client
                .post(format!("https://{host}/vectors/upsert"))
                .header("Api-Key", self.api_key()?.expose_secret())
                .header("Content-Type", "application/json")
                .json(&UpsertRequest { vectors })
                .send()
                .map_err(|e| Error::OperationFailed {
                    operation: "pinecone_upsert".to_string(),
                    cause: e.to_string(),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                return Err(Error::OperationFailed {
                    operation: "pinecone_upsert".to_string(),
                    cause: format!("API returned status: {status} - {body}"),
                });
            }

            written += batch.len();
            tracing::debug!(written, total = records.len(), "upsert batch complete");
        }

        Ok(written)
    }

    /// Looks up the index on the control plane; `None` when it does not exist.
    fn describe_index(&self) -> Result<Option<IndexDescription>> {
        let response = self
            .client
            .get(format!("{CONTROL_PLANE}/indexes/{}", self.config.index_name))
            .header("Api-Key", self.api_key()?.expose_secret())
            .send()
            .map_err(|e| Error::OperationFailed {
                operation: "pinecone_describe_index".to_string(),
                cause: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "pinecone_describe_index".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let description: IndexDescription =
            response.json().map_err(|e| Error::OperationFailed {
                operation: "pinecone_describe_index".to_string(),
                cause: e.to_string(),
            })?;
        Ok(Some(description))
    }

    /// Returns the data-plane host, resolving and caching it on first use.
    fn resolve_host(&self) -> Result<String> {
        if let Some(host) = self
            .host
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Ok(host);
        }

        let description = self.describe_index()?.ok_or_else(|| Error::OperationFailed {
            operation: "pinecone_resolve_host".to_string(),
            cause: format!("index '{}' does not exist", self.config.index_name),
        })?;
        self.cache_host(description.host.clone());
        Ok(description.host)
    }

    fn cache_host(&self, host: String) {
        let stripped = host
            .strip_prefix("https://")
            .unwrap_or(&host)
            .trim_end_matches('/')
            .to_string();
        *self.host.write().unwrap_or_else(PoisonError::into_inner) = Some(stripped);
    }
}

impl QaRetriever for PineconeIndex {
    fn query(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedMatch>> {
        if question.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }

        let vector = self.embedder.embed(question)?;
        let host = self.resolve_host()?;

        let response = self
            .client
            .post(format!("https://{host}/query"))
            .header("Api-Key", self.api_key()?.expose_secret())
            .header("Content-Type", "application/json")
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata: true,
            })
            .send()
            .map_err(|e| Error::OperationFailed {
                operation: "pinecone_query".to_string(),
                cause: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "pinecone_query".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: QueryResponse = response.json().map_err(|e| Error::OperationFailed {
            operation: "pinecone_query".to_string(),
            cause: e.to_string(),
        })?;

        // Index ranking order is preserved; it is never re-sorted here.
        Ok(response
            .matches
            .into_iter()
            .map(|m| RetrievedMatch {
                question: m.metadata.question,
                answer: m.metadata.answer,
                score: m.score,
            })
            .collect())
    }
}

/// Control-plane index creation request.
#[derive(Debug, Serialize)]
struct CreateIndexRequest {
    name: String,
    dimension: usize,
    metric: String,
    spec: IndexSpec,
}

/// Index spec wrapper.
#[derive(Debug, Serialize)]
struct IndexSpec {
    serverless: ServerlessSpec,
}

/// Serverless placement.
#[derive(Debug, Serialize)]
struct ServerlessSpec {
    cloud: String,
    region: String,
}

/// Control-plane index description.
#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

/// Data-plane query request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
}

/// Data-plane query response.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

/// One match in a query response.
#[derive(Debug, Deserialize)]
struct QueryMatch {
    score: f32,
    #[serde(default = "empty_metadata")]
    metadata: QaRecord,
}

fn empty_metadata() -> QaRecord {
    QaRecord {
        question: String::new(),
        answer: String::new(),
        source: String::new(),
        speaker: String::new(),
        time: 0.0,
    }
}

/// Data-plane upsert request.
#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

/// One vector in an upsert request.
#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: Vec<f32>,
    metadata: &'a QaRecord,
}
