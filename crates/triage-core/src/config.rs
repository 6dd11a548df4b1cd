//! Runtime configuration.
//!
//! Two records, both constructed once and passed by reference (spec.md §9
//! "global singletons" flag): [`EnsembleConfig`] is the decider's tunable
//! surface (source weights, abstention threshold, agreement boost/cap,
//! promotion confidence floor); [`TriageConfig`] wraps it plus the on-disk
//! paths and the dispatch number, resolved from environment variables with
//! `directories`-based defaults exactly as the teacher resolves
//! `FASTEMBED_CACHE_PATH` in `embeddings::local::get_cache_dir`.

use std::path::PathBuf;

use crate::types::Source;

/// Source weights, abstention threshold, agreement boost, and promotion
/// floor — ported verbatim from `hybrid_rag.py::_ensemble_decision` and
/// `ai_learning.py::get_learning_candidates`'s `min_confidence=0.8` default.
#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    pub weight_vector: f64,
    pub weight_graph: f64,
    pub weight_llm: f64,
    /// Stage C fires when normalized confidence is strictly below this.
    pub abstention_threshold: f64,
    /// Applied when ≥2 present sources agree on the winning condition.
    pub agreement_boost: f64,
    /// Confidence is never reported above this after boosting.
    pub agreement_cap: f64,
    /// Default `min_confidence` for `LearningSubsystem::promote`.
    pub promotion_min_confidence: f64,
}

impl EnsembleConfig {
    pub fn weight(&self, source: Source) -> f64 {
        match source {
            Source::VectorDb => self.weight_vector,
            Source::KnowledgeGraph => self.weight_graph,
            Source::GeminiAi => self.weight_llm,
        }
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weight_vector: 0.3,
            weight_graph: 0.4,
            weight_llm: 0.5,
            abstention_threshold: 0.35,
            agreement_boost: 1.2,
            agreement_cap: 0.99,
            promotion_min_confidence: 0.8,
        }
    }
}

/// Paths and the dispatch number, plus the embedded `EnsembleConfig`.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub ensemble: EnsembleConfig,
    /// SQLite file backing the case/prediction/feedback/retraining tables.
    pub db_path: PathBuf,
    /// USearch index file backing the case corpus's embeddings.
    pub vector_index_path: PathBuf,
    /// Number attached to verdicts as `sos_number` when `requires_sos`.
    pub sos_number: String,
    /// Base URL for the LLM adapter's `generateContent` call.
    pub llm_endpoint: Option<String>,
    /// API key appended to the LLM endpoint as a query parameter, matching
    /// Gemini's REST auth convention.
    pub llm_api_key: Option<String>,
}

impl TriageConfig {
    /// Resolve from environment variables, falling back to platform-default
    /// paths the same way `embeddings::local::get_cache_dir` does.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("TRIAGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Self {
            ensemble: EnsembleConfig::default(),
            db_path: std::env::var("TRIAGE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("triage.sqlite3")),
            vector_index_path: std::env::var("TRIAGE_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("cases.usearch")),
            sos_number: std::env::var("TRIAGE_SOS_NUMBER")
                .unwrap_or_else(|_| "911".to_string()),
            llm_endpoint: std::env::var("TRIAGE_LLM_ENDPOINT").ok(),
            llm_api_key: std::env::var("TRIAGE_LLM_API_KEY").ok(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "triage", "core") {
        return proj_dirs.data_dir().to_path_buf();
    }
    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs.home_dir().join(".local/share/triage-core");
    }
    PathBuf::from(".triage-core")
}
