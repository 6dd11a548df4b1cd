//! Shared data-model types: [`Severity`], [`AgeBucket`], and the tagged
//! [`Source`] sum that replaces dynamic dispatch across the three ensemble
//! voters. Each is `Copy`, carries `serde(rename_all = ...)`, and has a
//! hand-written `Display` + `FromStr`.

use serde::{Deserialize, Serialize};

/// Ordinal severity enum, `MILD < MODERATE < SEVERE < CRITICAL`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    /// Bump one level, capped at `CRITICAL`. Used by age escalation (C3/C6);
    /// this is the only direction severity ever moves.
    pub fn escalate_one(self) -> Self {
        match self {
            Severity::Mild => Severity::Moderate,
            Severity::Moderate => Severity::Severe,
            Severity::Severe => Severity::Critical,
            Severity::Critical => Severity::Critical,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Mild => "MILD",
            Severity::Moderate => "MODERATE",
            Severity::Severe => "SEVERE",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MILD" => Ok(Severity::Mild),
            "MODERATE" => Ok(Severity::Moderate),
            "SEVERE" => Ok(Severity::Severe),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Age bucket extracted from free text (C4) or supplied by the caller.
/// Unknown is modeled as `Option<AgeBucket>` at call sites, not a variant
/// here, since "unknown" is a distinct absence rather than a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    Child,
    Adult,
    Elderly,
}

impl std::fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgeBucket::Child => "child",
            AgeBucket::Adult => "adult",
            AgeBucket::Elderly => "elderly",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AgeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "child" => Ok(AgeBucket::Child),
            "adult" => Ok(AgeBucket::Adult),
            "elderly" => Ok(AgeBucket::Elderly),
            other => Err(format!("unknown age bucket: {other}")),
        }
    }
}

/// One of the three ensemble voters: a tagged sum rather than trait objects,
/// since the set of source kinds is small, closed, and known up front.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    VectorDb,
    KnowledgeGraph,
    GeminiAi,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Source::VectorDb => "vector_db",
            Source::KnowledgeGraph => "knowledge_graph",
            Source::GeminiAi => "gemini_ai",
        };
        write!(f, "{s}")
    }
}

/// A single source's proposed condition and confidence, carried into the
/// decider (spec.md §4.6) and echoed back in the verdict as
/// `vector_match` / `graph_match` / `llm_match`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMatch {
    #[serde(rename = "type")]
    pub condition: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}
