//! Response Assembler (C8, spec.md §4.8).
//!
//! Maps the decider's internal decision onto the external verdict shape
//! (spec.md §6), with the field-presence rules spec.md §6 requires:
//! `sos_number` only when `requires_sos`, and `clarifying_questions` /
//! `possible_emergencies` / `message` only on the two clarification paths.

use serde::Serialize;

use crate::catalog::Step;
use crate::graph::AgeEscalation as GraphAgeEscalation;
use crate::types::{Severity, SourceMatch};

#[derive(Debug, Clone, Serialize)]
pub struct PossibleEmergency {
    #[serde(rename = "type")]
    pub condition: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeEscalationOut {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressionRiskOut {
    #[serde(rename = "type")]
    pub condition: String,
    pub probability: f64,
    pub severity: Severity,
}

/// The verdict returned to every caller of [`crate::Triage::classify`]
/// (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    #[serde(rename = "type")]
    pub condition: String,
    pub severity: Severity,
    pub confidence: f64,
    pub requires_sos: bool,
    pub requires_helpers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sos_number: Option<String>,
    pub steps: Vec<Step>,
    pub bring: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contraindications: Option<Vec<String>>,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_match: Option<SourceMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_match: Option<SourceMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_match: Option<SourceMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_escalation: Option<AgeEscalationOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progression_risks: Option<Vec<ProgressionRiskOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_critical_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarifying_questions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_emergencies: Option<Vec<PossibleEmergency>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Stage A: age is required before anything else is classified.
pub fn needs_age_clarification(now: chrono::DateTime<chrono::Utc>) -> Verdict {
    Verdict {
        condition: "needs_age_clarification".to_string(),
        severity: Severity::Mild,
        confidence: 0.0,
        requires_sos: false,
        requires_helpers: false,
        sos_number: None,
        steps: Vec::new(),
        bring: Vec::new(),
        helper_instructions: None,
        symptoms: None,
        contraindications: None,
        sources: Vec::new(),
        vector_match: None,
        graph_match: None,
        llm_match: None,
        age_escalation: None,
        progression_risks: None,
        time_critical_minutes: None,
        clarifying_questions: Some(vec![
            "How old is the person?".to_string(),
            "Is this for a child, adult, or elderly person?".to_string(),
        ]),
        possible_emergencies: None,
        message: Some("We need to know the patient's age to give safe guidance.".to_string()),
        timestamp: now,
    }
}

/// Stage C: confidence too low (or no source voted) to commit to a type.
#[allow(clippy::too_many_arguments)]
pub fn needs_clarification(
    sources: Vec<String>,
    clarifying_questions: Vec<String>,
    possible_emergencies: Vec<PossibleEmergency>,
    confidence: f64,
    now: chrono::DateTime<chrono::Utc>,
) -> Verdict {
    Verdict {
        condition: "needs_clarification".to_string(),
        severity: Severity::Moderate,
        confidence,
        requires_sos: false,
        requires_helpers: false,
        sos_number: None,
        steps: Vec::new(),
        bring: Vec::new(),
        helper_instructions: None,
        symptoms: None,
        contraindications: None,
        sources,
        vector_match: None,
        graph_match: None,
        llm_match: None,
        age_escalation: None,
        progression_risks: None,
        time_critical_minutes: None,
        clarifying_questions: Some(clarifying_questions),
        possible_emergencies: Some(possible_emergencies),
        message: Some(
            "We couldn't confidently identify the emergency. Please answer a few more questions.".to_string(),
        ),
        timestamp: now,
    }
}

pub fn age_escalation_out(esc: &GraphAgeEscalation) -> Option<AgeEscalationOut> {
    if !esc.should_escalate {
        return None;
    }
    Some(AgeEscalationOut {
        reason: esc.reason.clone().unwrap_or_default(),
        multiplier: esc.multiplier,
    })
}
