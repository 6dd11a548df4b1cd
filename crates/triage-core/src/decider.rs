//! Ensemble Decider (C6, spec.md §4.6).
//!
//! Ported from `hybrid_rag.py::_ensemble_decision`'s four stages: an age
//! gate, a weighted vote across the three sources, an abstention check, and
//! final assembly against the catalog (handed off to [`crate::response`] for
//! C8's shape). Never fails — a source that errs or doesn't vote is simply
//! absent from the ensemble; the decider always returns a verdict.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::corpus::CaseCorpus;
use crate::error::CorpusError;
use crate::extract;
use crate::graph::ReasoningGraph;
use crate::config::EnsembleConfig;
use crate::llm::{ContextLine, LlmAdapter};
use crate::response::{self, AgeEscalationOut, PossibleEmergency, ProgressionRiskOut, Verdict};
use crate::types::{AgeBucket, Severity, Source, SourceMatch};

/// Everything the caller needs to persist a prediction (C7), kept separate
/// from the external [`Verdict`] shape so C8's field-presence rules aren't
/// polluted by bookkeeping fields.
#[derive(Debug, Clone)]
pub struct DecisionTrace {
    pub predicted_condition: String,
    pub predicted_severity: Severity,
    pub confidence: f64,
    pub sources_used: Vec<Source>,
}

struct CandidateVote {
    condition: String,
    source: Source,
    confidence: f64,
}

/// Up to two questions per condition id, matching the catalog's universe.
/// Ported from `hybrid_rag.py::_generate_clarifying_questions`'s table, with
/// the original's `bleeding` / `heart_attack` aliases remapped to the
/// catalog ids `severe_bleeding` / `chest_pain_cardiac`.
const CLARIFYING_QUESTIONS: &[(&str, &[&str])] = &[
    ("cardiac_arrest", &["Is the person breathing or making any sounds?", "Can you check if there's a pulse?"]),
    ("choking", &["Can the person cough, speak, or make any sounds?", "Is the airway fully or partially blocked?"]),
    ("severe_bleeding", &["How much blood has been lost and is it still actively bleeding?", "Where exactly is the bleeding coming from?"]),
    ("chest_pain_cardiac", &["Is the pain spreading to the arm, jaw, or back?", "Is the person sweating, nauseous, or short of breath?"]),
    ("stroke", &["Can the person smile normally on both sides of their face?", "Can they raise both arms and keep them up?"]),
    ("seizure", &["How long has the seizure been going on?", "Has this happened before, or is it their first seizure?"]),
    ("diabetic_emergency", &["Does the person have diabetes?", "Are they conscious and able to swallow safely?"]),
    ("allergic_reaction", &["Is there any swelling of the face, lips, or throat?", "Do they have a known allergy or an epinephrine auto-injector?"]),
    ("poisoning", &["What substance was involved, and how much?", "Is the person conscious and breathing normally?"]),
    ("burn", &["How large is the burned area and how deep does it look?", "Is the skin blistered, white, or charred?"]),
    ("fracture", &["Is the limb visibly deformed or at an odd angle?", "Can they move or bear weight on it at all?"]),
    ("fainting", &["Did they lose consciousness, and for how long?", "Have they fully woken up and are they alert now?"]),
    ("hypothermia", &["How long have they been exposed to the cold?", "Are they shivering, or have they stopped shivering?"]),
    ("heat_stroke", &["Is their skin hot and dry, or are they still sweating?", "Are they confused or losing consciousness?"]),
];

const GENERIC_CLARIFYING_QUESTION: &str = "Can you describe any other symptoms you're observing?";
const GENERIC_FALLBACK_QUESTIONS: &[&str] = &[
    "Can you describe what happened in more detail?",
    "Is the person conscious and breathing?",
    "Are there any visible injuries?",
];

/// Run the full four-stage decision for one piece of free text.
#[allow(clippy::too_many_arguments)]
pub async fn decide(
    catalog: &Catalog,
    graph: &ReasoningGraph,
    corpus: &CaseCorpus,
    llm: &LlmAdapter,
    config: &EnsembleConfig,
    sos_number: &str,
    user_text: &str,
    age_override: Option<AgeBucket>,
) -> (Verdict, DecisionTrace) {
    let now = chrono::Utc::now();

    // Stage A: age gate.
    let Some(age) = age_override.or_else(|| extract::extract_age(user_text)) else {
        return (
            response::needs_age_clarification(now),
            DecisionTrace {
                predicted_condition: "needs_age_clarification".to_string(),
                predicted_severity: Severity::Mild,
                confidence: 0.0,
                sources_used: Vec::new(),
            },
        );
    };

    // Stage B: gather votes from the three sources.
    let symptoms: HashSet<String> = extract::extract_symptoms(user_text);

    let vector_hits = corpus.search(user_text, 3).unwrap_or_else(|e: CorpusError| {
        tracing::warn!("case corpus search failed, treating vector source as absent: {e}");
        Vec::new()
    });
    let vector_best = vector_hits.first();

    let graph_matches = graph.match_by_symptoms(&symptoms);
    let graph_best = graph_matches.first();

    let vector_context: Vec<ContextLine> = vector_hits
        .iter()
        .take(2)
        .map(|m| ContextLine { condition: m.condition.clone(), confidence: m.confidence })
        .collect();
    let graph_context: Vec<ContextLine> = graph_matches
        .iter()
        .take(2)
        .map(|(condition, score)| ContextLine { condition: condition.to_string(), confidence: *score })
        .collect();

    let llm_verdict = llm
        .classify(user_text, Some(age), &vector_context, &graph_context)
        .await
        .unwrap_or(None);

    let mut votes: Vec<CandidateVote> = Vec::new();
    let mut vector_match = None;
    let mut graph_match = None;
    let mut llm_match = None;

    if let Some(hit) = vector_best {
        votes.push(CandidateVote { condition: hit.condition.clone(), source: Source::VectorDb, confidence: hit.confidence });
        vector_match = Some(SourceMatch { condition: hit.condition.clone(), confidence: hit.confidence, reasoning: None });
    }
    if let Some((condition, score)) = graph_best {
        votes.push(CandidateVote { condition: condition.to_string(), source: Source::KnowledgeGraph, confidence: *score });
        graph_match = Some(SourceMatch { condition: condition.to_string(), confidence: *score, reasoning: None });
    }
    if let Some(verdict) = &llm_verdict {
        votes.push(CandidateVote { condition: verdict.emergency_type.clone(), source: Source::GeminiAi, confidence: verdict.confidence });
        llm_match = Some(SourceMatch {
            condition: verdict.emergency_type.clone(),
            confidence: verdict.confidence,
            reasoning: Some(verdict.reasoning.clone()),
        });
    }

    let sources_used: Vec<Source> = votes.iter().map(|v| v.source).collect();

    let mut credited: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
    for vote in &votes {
        *credited.entry(vote.condition.clone()).or_insert(0.0) += vote.confidence * config.weight(vote.source);
    }

    let winner = credited.iter().max_by(|a, b| {
        a.1.partial_cmp(b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let sa = catalog.get(a.0).map(|e| e.severity);
                let sb = catalog.get(b.0).map(|e| e.severity);
                sb.cmp(&sa)
            })
            .then_with(|| b.0.cmp(a.0))
    });

    let total_weight: f64 = sources_used.iter().map(|s| config.weight(*s)).sum();

    let (final_condition, mut confidence) = match winner {
        Some((condition, score)) if total_weight > 0.0 => (condition.clone(), score / total_weight),
        _ => ("unknown".to_string(), 0.0),
    };

    if !final_condition.eq("unknown") {
        let agreeing = votes.iter().filter(|v| v.condition == final_condition).count();
        if agreeing >= 2 {
            confidence = (confidence * config.agreement_boost).min(config.agreement_cap);
        }
    }
    confidence = round3(confidence);

    // Stage C: abstain if confidence is too low or nothing voted.
    if votes.is_empty() || confidence < config.abstention_threshold {
        let mut ranked: Vec<(&String, &f64)> = credited.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

        let possible_emergencies: Vec<PossibleEmergency> = ranked
            .iter()
            .take(3)
            .map(|(condition, score)| PossibleEmergency {
                condition: (*condition).clone(),
                confidence: round3(*score / sources_used.len().max(1) as f64),
            })
            .collect();

        let clarifying_questions = build_clarifying_questions(ranked.first().map(|(c, _)| c.as_str()));

        let sources_str: Vec<String> = sources_used.iter().map(|s| s.to_string()).collect();
        let verdict = response::needs_clarification(sources_str, clarifying_questions, possible_emergencies, confidence, now);

        return (
            verdict,
            DecisionTrace {
                predicted_condition: "needs_clarification".to_string(),
                predicted_severity: Severity::Moderate,
                confidence,
                sources_used,
            },
        );
    }

    // Stage D: assemble against the catalog.
    let (severity_base, steps, bring, symptoms_out, contraindications, helper_instructions, requires_sos, requires_helpers, is_known) =
        match catalog.get(&final_condition) {
            Some(entry) => (
                entry.severity,
                entry.steps.clone(),
                entry.bring.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                Some(entry.symptoms.iter().map(|s| s.to_string()).collect::<Vec<_>>()),
                Some(entry.contraindications.iter().map(|s| s.to_string()).collect::<Vec<_>>()),
                Some(entry.helper_brief.to_string()),
                entry.requires_sos,
                entry.requires_helpers,
                true,
            ),
            None => (Severity::Severe, Catalog::generic_steps(), Vec::new(), None, None, None, true, false, false),
        };

    let age_escalation = if is_known { graph.age_escalation(&final_condition, age) } else { Default::default() };
    let severity = if age_escalation.should_escalate {
        age_escalation.new_level.unwrap_or(severity_base).max(severity_base)
    } else {
        severity_base
    };
    let severity = if age_escalation.should_escalate && age_escalation.new_level.is_none() {
        severity_base
    } else {
        severity
    };
    let age_escalation_out: Option<AgeEscalationOut> = response::age_escalation_out(&age_escalation);

    let progression = graph.progression_risks(&final_condition);
    let progression_risks = if progression.is_empty() {
        None
    } else {
        Some(
            progression
                .into_iter()
                .map(|p| ProgressionRiskOut { condition: p.condition.to_string(), probability: p.probability, severity: p.severity })
                .collect(),
        )
    };
    let time_critical_minutes = graph.time_critical(&final_condition);

    let verdict_condition = if is_known { final_condition.clone() } else { "unknown".to_string() };

    let verdict = Verdict {
        condition: verdict_condition,
        severity,
        confidence,
        requires_sos,
        requires_helpers,
        sos_number: requires_sos.then(|| sos_number.to_string()),
        steps,
        bring,
        helper_instructions,
        symptoms: symptoms_out,
        contraindications,
        sources: sources_used.iter().map(|s| s.to_string()).collect(),
        vector_match,
        graph_match,
        llm_match,
        age_escalation: age_escalation_out,
        progression_risks,
        time_critical_minutes,
        clarifying_questions: None,
        possible_emergencies: None,
        message: None,
        timestamp: now,
    };

    let trace = DecisionTrace {
        predicted_condition: final_condition,
        predicted_severity: severity,
        confidence,
        sources_used,
    };

    (verdict, trace)
}

fn build_clarifying_questions(top_condition: Option<&str>) -> Vec<String> {
    let mut questions = Vec::new();
    if let Some(condition) = top_condition {
        if let Some((_, table_questions)) = CLARIFYING_QUESTIONS.iter().find(|(c, _)| *c == condition) {
            questions.extend(table_questions.iter().take(2).map(|q| q.to_string()));
        }
    }
    if questions.is_empty() {
        return GENERIC_FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect();
    }
    questions.push(GENERIC_CLARIFYING_QUESTION.to_string());
    questions
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
