//! Reasoning Graph (C3, spec.md §4.3).
//!
//! Ported from `knowledge_graph.py::MedicalKnowledgeGraph::_build_medical_graph`.
//! The original stores heterogeneous edge-attribute dicts on a
//! `networkx.DiGraph`; rather than force that onto a single generic
//! edge-weight type (no graph crate in this pack fits that shape — see
//! SPEC_FULL.md §2), this is a hand-rolled directed multigraph: adjacency
//! lists keyed by node id, with a small [`Edge`] enum carrying each
//! relation's specific attribute.

use std::collections::HashMap;

use crate::types::Severity;

/// A typed relation between two nodes, carrying that relation's specific
/// numeric attribute (spec.md §3 "Reasoning graph").
#[derive(Debug, Clone)]
pub enum Edge {
    HasSymptom { weight: f64 },
    IncreasesRisk { multiplier: f64 },
    EscalatesWith { reason: &'static str },
    Requires { priority: u32 },
    ContraindicatedBy,
    LeadsTo { probability: f64 },
    SimilarTo { check_for: Vec<&'static str> },
}

#[derive(Debug, Clone)]
struct ConditionNode {
    severity_default: Severity,
    time_critical_minutes: Option<u32>,
}

/// Result of [`ReasoningGraph::age_escalation`].
#[derive(Debug, Clone, Default)]
pub struct AgeEscalation {
    pub should_escalate: bool,
    pub new_level: Option<Severity>,
    pub reason: Option<String>,
    pub multiplier: Option<f64>,
}

/// One entry of [`ReasoningGraph::progression_risks`].
#[derive(Debug, Clone)]
pub struct ProgressionRisk {
    pub condition: &'static str,
    pub probability: f64,
    pub severity: Severity,
}

/// The constructed-once, read-only reasoning graph.
pub struct ReasoningGraph {
    conditions: HashMap<&'static str, ConditionNode>,
    /// condition -> list of (symptom, weight) it is reachable from.
    has_symptom: HashMap<&'static str, Vec<(&'static str, f64)>>,
    /// (age_bucket, condition) -> escalation/risk edge.
    age_edges: HashMap<(&'static str, &'static str), Edge>,
    /// condition -> outgoing requires edges (treatment, priority).
    requires: HashMap<&'static str, Vec<(&'static str, u32)>>,
    /// condition -> outgoing contraindicated_by edges.
    contraindicated_by: HashMap<&'static str, Vec<&'static str>>,
    /// condition -> outgoing leads_to edges.
    leads_to: HashMap<&'static str, Vec<(&'static str, f64)>>,
    /// condition -> outgoing similar_to edges.
    similar_to: HashMap<&'static str, Vec<(&'static str, Vec<&'static str>)>>,
}

impl ReasoningGraph {
    /// Build the graph from the in-code description. Construction is fatal
    /// at startup per spec.md §7; infallible in practice since the
    /// description below is a compile-time constant, kept `Result`-typed to
    /// match that contract.
    pub fn build() -> Result<Self, crate::error::GraphError> {
        let mut conditions = HashMap::new();
        let mut has_symptom: HashMap<&'static str, Vec<(&'static str, f64)>> = HashMap::new();
        let mut age_edges = HashMap::new();
        let mut requires: HashMap<&'static str, Vec<(&'static str, u32)>> = HashMap::new();
        let mut contraindicated_by: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        let mut leads_to: HashMap<&'static str, Vec<(&'static str, f64)>> = HashMap::new();
        let mut similar_to: HashMap<&'static str, Vec<(&'static str, Vec<&'static str>)>> = HashMap::new();

        macro_rules! condition {
            ($id:expr, $severity:expr, $tc:expr) => {
                conditions.insert($id, ConditionNode { severity_default: $severity, time_critical_minutes: $tc });
            };
        }
        macro_rules! symptoms {
            ($cond:expr, [$(($s:expr, $w:expr)),* $(,)?]) => {
                has_symptom.entry($cond).or_default().extend([$(($s, $w)),*]);
            };
        }

        condition!("cardiac_arrest", Severity::Critical, Some(4));
        symptoms!("cardiac_arrest", [
            ("unconscious", 0.95), ("not_breathing", 0.95), ("no_pulse", 0.95),
            ("collapsed", 0.95), ("unresponsive", 0.95), ("blue_lips", 0.95),
        ]);
        age_edges.insert(("elderly", "cardiac_arrest"), Edge::IncreasesRisk { multiplier: 2.5 });
        requires.insert("cardiac_arrest", vec![("cpr", 1), ("aed", 2)]);
        contraindicated_by.insert("cardiac_arrest", vec!["no_food_or_water"]);

        condition!("chest_pain_cardiac", Severity::Critical, Some(30));
        symptoms!("chest_pain_cardiac", [
            ("chest_pain", 0.85), ("chest_pressure", 0.85), ("shortness_of_breath", 0.85),
            ("pain_radiating_arm", 0.85), ("pain_radiating_jaw", 0.85), ("sweating", 0.85),
            ("nausea", 0.85), ("crushing_feeling", 0.85),
        ]);
        leads_to.entry("chest_pain_cardiac").or_default().push(("cardiac_arrest", 0.40));
        age_edges.insert(("elderly", "chest_pain_cardiac"), Edge::IncreasesRisk { multiplier: 3.0 });
        age_edges.insert(("adult", "chest_pain_cardiac"), Edge::IncreasesRisk { multiplier: 1.5 });
        requires.insert("chest_pain_cardiac", vec![("aspirin", 1)]);

        condition!("choking", Severity::Critical, Some(3));
        symptoms!("choking", [
            ("cant_breathe", 0.90), ("hands_on_throat", 0.90), ("turning_blue", 0.90),
            ("gasping", 0.90), ("wheezing", 0.90), ("unable_to_speak", 0.90),
        ]);
        leads_to.entry("choking").or_default().push(("cardiac_arrest", 0.60));
        requires.insert("choking", vec![("heimlich", 1)]);
        age_edges.insert(("child", "choking"), Edge::IncreasesRisk { multiplier: 1.8 });

        condition!("severe_bleeding", Severity::Severe, Some(10));
        symptoms!("severe_bleeding", [
            ("blood_gushing", 0.88), ("heavy_bleeding", 0.88), ("deep_cut", 0.88),
            ("arterial_bleeding", 0.88), ("blood_spurting", 0.88), ("blood_pooling", 0.88),
        ]);
        condition!("shock", Severity::Critical, None);
        leads_to.entry("severe_bleeding").or_default().push(("shock", 0.35));
        requires.insert("severe_bleeding", vec![("direct_pressure", 1)]);

        condition!("stroke", Severity::Critical, Some(60));
        symptoms!("stroke", [
            ("facial_drooping", 0.92), ("arm_weakness", 0.92), ("speech_difficulty", 0.92),
            ("sudden_confusion", 0.92), ("vision_problems", 0.92), ("severe_headache", 0.92),
            ("loss_of_balance", 0.92),
        ]);
        age_edges.insert(("elderly", "stroke"), Edge::IncreasesRisk { multiplier: 4.0 });

        condition!("fainting", Severity::Moderate, None);
        symptoms!("fainting", [
            ("passed_out", 0.75), ("dizzy", 0.75), ("lightheaded", 0.75),
            ("lost_consciousness_brief", 0.75), ("pale", 0.75),
        ]);
        age_edges.insert(
            ("elderly", "fainting"),
            Edge::EscalatesWith { reason: "elderly patients fainting carry elevated cardiac risk" },
        );
        similar_to.entry("fainting").or_default().push((
            "chest_pain_cardiac",
            vec!["chest_pain", "shortness_of_breath"],
        ));

        condition!("burn", Severity::Moderate, None);
        symptoms!("burn", [
            ("red_skin", 0.80), ("blisters", 0.80), ("charred_skin", 0.80),
            ("white_areas", 0.80), ("severe_pain", 0.80), ("burned_area", 0.80),
        ]);
        age_edges.insert(
            ("child", "burn"),
            Edge::EscalatesWith { reason: "children have thinner skin and escalate faster" },
        );
        age_edges.insert(
            ("elderly", "burn"),
            Edge::EscalatesWith { reason: "elderly skin heals more slowly and risks complications" },
        );

        condition!("breathing_difficulty", Severity::Severe, Some(5));
        symptoms!("breathing_difficulty", [
            ("cant_breathe", 0.87), ("gasping", 0.87), ("wheezing", 0.87),
            ("chest_tight", 0.87), ("rapid_breathing", 0.87), ("blue_lips", 0.87),
        ]);
        leads_to.entry("breathing_difficulty").or_default().push(("cardiac_arrest", 0.30));

        condition!("minor_cut", Severity::Mild, None);
        symptoms!("minor_cut", [("small_cut", 0.70), ("scrape", 0.70), ("minor_bleeding", 0.70)]);

        condition!("allergic_reaction", Severity::Severe, Some(15));
        symptoms!("allergic_reaction", [
            ("hives", 0.82), ("swelling_face", 0.90), ("swelling_throat", 0.95),
            ("difficulty_swallowing", 0.90), ("rapid_pulse", 0.75), ("rash", 0.70),
        ]);

        condition!("seizure", Severity::Severe, Some(5));
        symptoms!("seizure", [
            ("convulsions", 0.90), ("shaking", 0.85), ("loss_of_consciousness", 0.85),
            ("stiffening", 0.80), ("confusion_after", 0.70),
        ]);

        condition!("diabetic_emergency", Severity::Severe, Some(15));
        symptoms!("diabetic_emergency", [
            ("confusion", 0.70), ("shakiness", 0.80), ("sweating", 0.70),
            ("weakness", 0.65), ("rapid_heartbeat", 0.65), ("unresponsive_diabetic", 0.95),
        ]);

        condition!("poisoning", Severity::Severe, Some(20));
        symptoms!("poisoning", [
            ("vomiting", 0.65), ("confusion", 0.70), ("difficulty_breathing", 0.85),
            ("burns_around_mouth", 0.90), ("drowsiness", 0.70),
        ]);

        condition!("fracture", Severity::Moderate, None);
        symptoms!("fracture", [
            ("deformity", 0.85), ("swelling", 0.60), ("severe_pain_limb", 0.75),
            ("unable_to_bear_weight", 0.80), ("bruising", 0.55),
        ]);

        condition!("hypothermia", Severity::Severe, Some(30));
        symptoms!("hypothermia", [
            ("shivering", 0.70), ("confusion", 0.70), ("slurred_speech", 0.80),
            ("drowsiness", 0.75), ("cold_skin", 0.80),
        ]);

        condition!("heat_stroke", Severity::Critical, Some(10));
        symptoms!("heat_stroke", [
            ("hot_dry_skin", 0.85), ("confusion", 0.75), ("rapid_pulse", 0.70),
            ("high_body_temperature", 0.90), ("loss_of_consciousness_heat", 0.95),
        ]);

        Ok(Self {
            conditions,
            has_symptom,
            age_edges,
            requires,
            contraindicated_by,
            leads_to,
            similar_to,
        })
    }

    /// `Σ edge.weight over incoming has_symptom edges whose source is in
    /// symptoms, divided by |symptoms|` — spec.md §4.3. Ties broken by
    /// higher catalog severity, then lexicographic, are the *caller's*
    /// responsibility (C6); this returns the raw ranked list.
    pub fn match_by_symptoms(&self, symptoms: &std::collections::HashSet<String>) -> Vec<(&'static str, f64)> {
        if symptoms.is_empty() {
            return Vec::new();
        }
        let mut scores: Vec<(&'static str, f64)> = self
            .has_symptom
            .iter()
            .filter_map(|(condition, edges)| {
                let total: f64 = edges
                    .iter()
                    .filter(|(s, _)| symptoms.contains(*s))
                    .map(|(_, w)| w)
                    .sum();
                if total > 0.0 {
                    Some((*condition, total / symptoms.len() as f64))
                } else {
                    None
                }
            })
            .collect();
        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let sa = self.conditions.get(a.0).map(|c| c.severity_default);
                    let sb = self.conditions.get(b.0).map(|c| c.severity_default);
                    sb.cmp(&sa)
                })
                .then_with(|| a.0.cmp(b.0))
        });
        scores
    }

    /// `increases_risk` reports a multiplier without changing severity;
    /// `escalates_with` bumps severity one level, capped at `CRITICAL`.
    pub fn age_escalation(&self, condition: &str, age: crate::types::AgeBucket) -> AgeEscalation {
        let age_key = match age {
            crate::types::AgeBucket::Child => "child",
            crate::types::AgeBucket::Adult => "adult",
            crate::types::AgeBucket::Elderly => "elderly",
        };
        let Some(node) = self.conditions.get(condition) else {
            return AgeEscalation::default();
        };
        match self.age_edges.get(&(age_key, condition)) {
            Some(Edge::EscalatesWith { reason }) => AgeEscalation {
                should_escalate: true,
                new_level: Some(node.severity_default.escalate_one()),
                reason: Some(reason.to_string()),
                multiplier: None,
            },
            Some(Edge::IncreasesRisk { multiplier }) => AgeEscalation {
                should_escalate: true,
                new_level: None,
                reason: Some(format!("{age_key} patients carry {multiplier}x increased risk for {condition}")),
                multiplier: Some(*multiplier),
            },
            _ => AgeEscalation::default(),
        }
    }

    pub fn progression_risks(&self, condition: &str) -> Vec<ProgressionRisk> {
        self.leads_to
            .get(condition)
            .map(|edges| {
                edges
                    .iter()
                    .map(|(next, probability)| ProgressionRisk {
                        condition: next,
                        probability: *probability,
                        severity: self
                            .conditions
                            .get(next)
                            .map(|c| c.severity_default)
                            .unwrap_or(Severity::Moderate),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn time_critical(&self, condition: &str) -> Option<u32> {
        self.conditions.get(condition).and_then(|c| c.time_critical_minutes)
    }

    pub fn contraindications(&self, condition: &str) -> Vec<&'static str> {
        self.contraindicated_by.get(condition).cloned().unwrap_or_default()
    }

    pub fn treatments(&self, condition: &str) -> Vec<&'static str> {
        let mut treatments = self.requires.get(condition).cloned().unwrap_or_default();
        treatments.sort_by_key(|(_, priority)| *priority);
        treatments.into_iter().map(|(t, _)| t).collect()
    }

    /// Conditions similar enough to warrant a cross-check, with the
    /// symptoms to check for — ported from the `fainting -> chest_pain_cardiac`
    /// `similar_to` edge (see SPEC_FULL.md §2 [C3]).
    pub fn similar_conditions(&self, condition: &str) -> Vec<(&'static str, Vec<&'static str>)> {
        self.similar_to.get(condition).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn empty_symptom_set_yields_no_vote() {
        let graph = ReasoningGraph::build().unwrap();
        let symptoms = HashSet::new();
        assert!(graph.match_by_symptoms(&symptoms).is_empty());
    }

    #[test]
    fn cardiac_arrest_symptoms_rank_first() {
        let graph = ReasoningGraph::build().unwrap();
        let mut symptoms = HashSet::new();
        symptoms.insert("unconscious".to_string());
        symptoms.insert("not_breathing".to_string());
        let matches = graph.match_by_symptoms(&symptoms);
        assert_eq!(matches[0].0, "cardiac_arrest");
    }

    #[test]
    fn elderly_fainting_escalates_severity() {
        let graph = ReasoningGraph::build().unwrap();
        let esc = graph.age_escalation("fainting", crate::types::AgeBucket::Elderly);
        assert!(esc.should_escalate);
        assert_eq!(esc.new_level, Some(Severity::Severe));
    }

    #[test]
    fn elderly_cardiac_arrest_increases_risk_without_level_change() {
        let graph = ReasoningGraph::build().unwrap();
        let esc = graph.age_escalation("cardiac_arrest", crate::types::AgeBucket::Elderly);
        assert!(esc.should_escalate);
        assert_eq!(esc.multiplier, Some(2.5));
        assert!(esc.new_level.is_none());
    }

    #[test]
    fn construction_is_deterministic() {
        let a = ReasoningGraph::build().unwrap();
        let b = ReasoningGraph::build().unwrap();
        assert_eq!(a.conditions.len(), b.conditions.len());
        assert_eq!(a.has_symptom.len(), b.has_symptom.len());
    }

    #[test]
    fn choking_leads_to_cardiac_arrest() {
        let graph = ReasoningGraph::build().unwrap();
        let risks = graph.progression_risks("choking");
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].condition, "cardiac_arrest");
        assert!((risks[0].probability - 0.60).abs() < 1e-9);
    }
}
