//! # Triage Core
//!
//! Hybrid medical triage classifier (spec.md §1-2): a three-source ensemble
//! that fuses semantic nearest-neighbor retrieval (C2), a weighted symptom
//! reasoning graph (C3), and a prompted LLM (C5), reconciled by a weighted
//! vote with agreement boosting and an abstention threshold (C6), then
//! enriched with catalog response directives and age escalation (C1/C3) into
//! a structured triage verdict (C8). A tightly coupled learning subsystem
//! (C7) records predictions, ingests feedback, and promotes verified
//! predictions back into the case corpus.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use triage_core::{Triage, TriageConfig};
//!
//! # async fn run() -> triage_core::Result<()> {
//! let triage = Triage::open(TriageConfig::from_env())?;
//! let result = triage.classify("My grandfather collapsed and isn't breathing", None, None).await;
//! println!("{} ({})", result.verdict.condition, result.verdict.severity);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] — C1, the immutable per-condition response template
//! - [`corpus`] — C2, the embedded case corpus and its nearest-neighbor retriever
//! - [`graph`] — C3, the weighted symptom/condition/age reasoning graph
//! - [`extract`] — C4, deterministic symptom/age extraction from free text
//! - [`llm`] — C5, the prompted LLM adapter (fails closed to `None`)
//! - [`decider`] — C6, the weighted-vote ensemble and abstention logic
//! - [`learning`] — C7, prediction/feedback/promotion bookkeeping
//! - [`response`] — C8, the externally-documented verdict shape
//!
//! ## Feature flags
//!
//! - `embeddings` (default): local ONNX embedding inference via `fastembed`
//! - `vector-search` (default): HNSW nearest-neighbor search via `usearch`
//! - `bundled-sqlite` (default): statically link SQLite through `rusqlite`

#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalog;
pub mod config;
pub mod corpus;
pub mod decider;
#[cfg(feature = "embeddings")]
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod graph;
pub mod learning;
pub mod llm;
pub mod response;
#[cfg(feature = "vector-search")]
pub mod search;
pub mod storage;
pub mod types;

pub use catalog::{Catalog, CatalogEntry, Step};
pub use config::{EnsembleConfig, TriageConfig};
pub use corpus::{CaseCorpus, CaseMatch, CaseMetadata, CaseSource};
pub use decider::DecisionTrace;
pub use error::{Result, TriageError};
pub use graph::{AgeEscalation, ProgressionRisk, ReasoningGraph};
pub use learning::{
    AccuracyStats, FeedbackInput, LearningCandidate, LearningSubsystem, Mistake, PredictionRecord,
    PromoteReport, RecentImprovement, SimilarCase, TypeAccuracy,
};
pub use llm::{ContextLine, LlmAdapter, LlmVerdict};
pub use response::{AgeEscalationOut, PossibleEmergency, ProgressionRiskOut, Verdict};
pub use types::{AgeBucket, Severity, Source, SourceMatch};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The outcome of one [`Triage::classify`] call: the external verdict plus
/// the row id `record_feedback` needs, when the best-effort prediction write
/// (spec.md §4.7, §5 "background work") succeeded.
#[derive(Debug, Clone)]
pub struct ClassifyResult {
    pub verdict: Verdict,
    pub prediction_id: Option<i64>,
}

/// Process-wide handle bundling the immutable catalog and reasoning graph
/// (spec.md §9 "global singletons") with the case corpus, LLM adapter, and
/// learning subsystem. Construct once at startup and share by reference
/// (`&Triage` is `Sync`: every field's interior mutability is its own
/// connection-guarding mutex).
pub struct Triage {
    catalog: Catalog,
    graph: ReasoningGraph,
    corpus: CaseCorpus,
    llm: LlmAdapter,
    learning: LearningSubsystem,
    config: TriageConfig,
}

impl Triage {
    /// Construct every component from `config`. Catalog and graph
    /// construction, and embedding-model / corpus load, are fatal on failure
    /// per spec.md §7.
    pub fn open(config: TriageConfig) -> Result<Self> {
        let catalog = Catalog::load()?;
        let graph = ReasoningGraph::build()?;
        let corpus = CaseCorpus::open(&config.db_path, &config.vector_index_path)?;
        let known_conditions: Vec<&'static str> = catalog.all_conditions().collect();
        let llm = LlmAdapter::new(config.llm_endpoint.clone(), config.llm_api_key.clone(), known_conditions);
        let learning = LearningSubsystem::open(&config.db_path)?;
        Ok(Self { catalog, graph, corpus, llm, learning, config })
    }

    /// Run the full classification pipeline (spec.md §4.6) and record the
    /// prediction (C7). Recording never fails the classification — on
    /// persistence failure the verdict still returns and the failure is
    /// logged (spec.md §4.7, §7).
    pub async fn classify(
        &self,
        text: &str,
        age_group: Option<AgeBucket>,
        incident_id: Option<i64>,
    ) -> ClassifyResult {
        let (verdict, trace) = decider::decide(
            &self.catalog,
            &self.graph,
            &self.corpus,
            &self.llm,
            &self.config.ensemble,
            &self.config.sos_number,
            text,
            age_group,
        )
        .await;

        let record = PredictionRecord {
            incident_id,
            user_text: text.to_string(),
            predicted_condition: trace.predicted_condition,
            predicted_severity: trace.predicted_severity,
            confidence: trace.confidence,
            sources_used: trace.sources_used,
        };
        let prediction_id = match self.learning.record_prediction(&record) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("failed to record prediction, continuing without it: {e}");
                None
            }
        };

        ClassifyResult { verdict, prediction_id }
    }

    /// Attach feedback to a prior prediction (C7). Rejects an unknown
    /// `prediction_id` and enforces at most one feedback row per prediction
    /// (spec.md I3).
    pub fn record_feedback(
        &self,
        prediction_id: i64,
        feedback: &FeedbackInput,
    ) -> std::result::Result<(), error::LearningError> {
        self.learning.record_feedback(prediction_id, feedback)
    }

    /// Promote up to `max` verified-correct, high-confidence predictions
    /// into the case corpus (spec.md §4.7). Caller-triggered only; never
    /// runs automatically (spec.md §5).
    pub fn promote(&self, min_confidence: f64, max: usize) -> std::result::Result<PromoteReport, error::LearningError> {
        self.learning.promote(&self.corpus, min_confidence, max)
    }

    /// Promote using the config's default confidence floor
    /// (`EnsembleConfig::promotion_min_confidence`).
    pub fn promote_default(&self, max: usize) -> std::result::Result<PromoteReport, error::LearningError> {
        self.learning.promote(&self.corpus, self.config.ensemble.promotion_min_confidence, max)
    }

    pub fn accuracy_stats(&self) -> std::result::Result<AccuracyStats, error::LearningError> {
        self.learning.accuracy_stats()
    }

    pub fn similar_past_cases(&self, text: &str, k: usize) -> std::result::Result<Vec<SimilarCase>, error::LearningError> {
        self.learning.similar_past_cases(text, k)
    }

    /// Preview `promote`'s candidate set without consuming it (spec.md §4.7
    /// supplement, ported from the original's `get_learning_queue` route).
    pub fn learning_queue(
        &self,
        min_confidence: f64,
        limit: usize,
    ) -> std::result::Result<Vec<LearningCandidate>, error::LearningError> {
        self.learning.learning_queue(min_confidence, limit)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &ReasoningGraph {
        &self.graph
    }

    pub fn corpus(&self) -> &CaseCorpus {
        &self.corpus
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }
}

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        AgeBucket, CaseCorpus, Catalog, ClassifyResult, FeedbackInput, LearningSubsystem,
        ReasoningGraph, Result, Severity, Source, Triage, TriageConfig, Verdict,
    };
}
