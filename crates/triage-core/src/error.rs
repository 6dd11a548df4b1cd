//! Crate-wide error aggregation.
//!
//! Each module owns a narrow error enum for the failures it can actually
//! produce; `TriageError` aggregates them with `#[from]` so callers at the
//! crate boundary can use a single `?`-friendly type, while the CLI
//! consumes everything through `anyhow` at its own boundary.

use thiserror::Error;

/// Errors from the knowledge catalog (C1). Construction is fatal at startup;
/// lookups never fail (a missing key is `None`, not an error).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate condition id in catalog: {0}")]
    DuplicateCondition(String),
}

/// Errors from the case corpus and retriever (C2).
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("vector index error: {0}")]
    VectorIndex(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("case {0} not found")]
    NotFound(i64),
}

/// Errors from reasoning-graph construction (C3). Construction is fatal;
/// the read-side operations (`match_by_symptoms`, `age_escalation`, ...)
/// never fail.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed graph description: {0}")]
    MalformedDescription(String),
}

/// Errors surfaced by the LLM adapter (C5). None of these ever escape
/// `classify`; they exist so the adapter's internal plumbing can use `?`,
/// and `classify` maps every variant to `Ok(None)`.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("non-success status: {0}")]
    Status(reqwest::StatusCode),
    #[error("response was not valid JSON after fence-stripping: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("response missing required field: {0}")]
    MissingField(&'static str),
    #[error("timed out waiting for a response")]
    Timeout,
}

/// Errors from the learning subsystem (C7).
#[derive(Debug, Error)]
pub enum LearningError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("prediction {0} not found")]
    PredictionNotFound(i64),
    #[error("prediction {0} already has feedback recorded")]
    FeedbackAlreadyRecorded(i64),
}

/// Top-level error aggregate for the library's public API.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("case corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("reasoning graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("learning subsystem error: {0}")]
    Learning(#[from] LearningError),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TriageError>;
