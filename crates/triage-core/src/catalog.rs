//! Knowledge Catalog (C1, spec.md §4.1).
//!
//! An immutable, read-only `condition -> CatalogEntry` mapping, loaded once
//! at startup from an in-code description — ported from
//! `llm_enhanced.py::MEDICAL_KNOWLEDGE_BASE`, supplemented with the seven
//! conditions (`allergic_reaction`, `seizure`, `diabetic_emergency`,
//! `poisoning`, `fracture`, `hypothermia`, `heat_stroke`) that only appear in
//! the original's `_generate_clarifying_questions` table, so the catalog and
//! the clarification-question surface name the same universe of conditions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// One ordered action in a [`CatalogEntry::steps`] list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub title: &'static str,
    pub detail: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_s: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence_bpm: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub critical: bool,
}

const fn step(title: &'static str, detail: &'static str) -> Step {
    Step { title, detail, timer_s: None, cadence_bpm: None, critical: false }
}

/// Static per-condition response template (spec.md §3 "Catalog entry").
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub condition: &'static str,
    pub severity: Severity,
    pub requires_sos: bool,
    pub requires_helpers: bool,
    pub steps: Vec<Step>,
    pub bring: Vec<&'static str>,
    pub symptoms: Vec<&'static str>,
    pub contraindications: Vec<&'static str>,
    pub helper_brief: &'static str,
}

/// The immutable catalog. Constructed once via [`Catalog::load`] and passed
/// by reference thereafter (spec.md §9 "global singletons" flag).
pub struct Catalog {
    entries: HashMap<&'static str, CatalogEntry>,
}

impl Catalog {
    /// Build the catalog from the in-code description. Infallible in
    /// practice (the description is a compile-time constant); returns a
    /// `Result` to match the fatal-at-startup contract spec.md §7 assigns
    /// to catalog construction.
    pub fn load() -> Result<Self, crate::error::CatalogError> {
        let mut entries = HashMap::new();
        for entry in build_entries() {
            if entries.insert(entry.condition, entry).is_some() {
                return Err(crate::error::CatalogError::DuplicateCondition(
                    "duplicate condition id".to_string(),
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, condition: &str) -> Option<&CatalogEntry> {
        self.entries.get(condition)
    }

    pub fn all_conditions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// The generic fallback steps used for `type = "unknown"` verdicts
    /// (spec.md §4.6 stage D) — ported from
    /// `llm_enhanced.py::generate_generic_emergency_steps`.
    pub fn generic_steps() -> Vec<Step> {
        vec![
            step("Assess the situation", "Check for immediate dangers and the person's responsiveness."),
            step("Call for help if needed", "Contact emergency services if the situation is serious or unclear."),
            step("Keep the person safe", "Remove hazards and keep them comfortable while help is on the way."),
            step("Monitor closely", "Watch for changes in condition and be ready to act."),
        ]
    }
}

fn build_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            condition: "cardiac_arrest",
            severity: Severity::Critical,
            requires_sos: true,
            requires_helpers: true,
            steps: vec![
                step("Check responsiveness", "Tap firmly and shout. Confirm there is no breathing or only gasping."),
                step("Call 911 now", "Call or have someone call emergency services immediately before starting CPR."),
                Step { title: "Start chest compressions", detail: "Push hard and fast in the center of the chest, at least 2 inches deep.", timer_s: None, cadence_bpm: Some(110), critical: true },
                step("Continue CPR", "Keep compressions going until help arrives or the person responds."),
            ],
            bring: vec!["AED if available"],
            symptoms: vec!["unconscious", "not_breathing", "no_pulse", "collapsed", "unresponsive", "blue_lips"],
            contraindications: vec!["no_food_or_water"],
            helper_brief: "Take turns with compressions every two minutes to avoid fatigue.",
        },
        CatalogEntry {
            condition: "choking",
            severity: Severity::Critical,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Assess if they can cough or speak", "If they can cough forcefully, encourage coughing and do not intervene further yet."),
                step("Call 911", "Call emergency services if the airway is fully blocked."),
                Step { title: "Perform abdominal thrusts", detail: "Stand behind them, make a fist above the navel, and thrust inward and upward.", timer_s: None, cadence_bpm: None, critical: true },
                step("Repeat until dislodged", "Continue thrusts until the object is expelled or the person loses consciousness."),
            ],
            bring: vec![],
            symptoms: vec!["cant_breathe", "hands_on_throat", "turning_blue", "gasping", "wheezing", "unable_to_speak"],
            contraindications: vec![],
            helper_brief: "If the person becomes unresponsive, begin CPR and continue checking the mouth for the object.",
        },
        CatalogEntry {
            condition: "severe_bleeding",
            severity: Severity::Severe,
            requires_sos: true,
            requires_helpers: true,
            steps: vec![
                step("Call 911", "Call emergency services immediately."),
                Step { title: "Apply direct pressure", detail: "Press firmly on the wound with a clean cloth or bandage.", timer_s: None, cadence_bpm: None, critical: true },
                step("Add more cloth if soaked", "Do not remove the original cloth; layer more on top."),
                step("Elevate the wound", "Raise the injured area above the heart if possible."),
            ],
            bring: vec!["clean cloths or bandages"],
            symptoms: vec!["blood_gushing", "heavy_bleeding", "deep_cut", "arterial_bleeding", "blood_spurting", "blood_pooling"],
            contraindications: vec![],
            helper_brief: "Maintain pressure without releasing to check the wound; releasing restarts bleeding.",
        },
        CatalogEntry {
            condition: "chest_pain_cardiac",
            severity: Severity::Critical,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Call 911", "Chest pain with these symptoms needs immediate emergency evaluation."),
                step("Sit and rest", "Have the person sit down, ideally in a half-reclined position, and avoid exertion."),
                step("Aspirin if not allergic", "If available and not contraindicated, chewing an aspirin may help; also give nitroglycerin if prescribed."),
                step("Monitor for cardiac arrest", "Be ready to begin CPR if they become unresponsive or stop breathing."),
            ],
            bring: vec!["aspirin", "prescribed nitroglycerin if available"],
            symptoms: vec!["chest_pain", "chest_pressure", "shortness_of_breath", "pain_radiating_arm", "pain_radiating_jaw", "sweating", "nausea", "crushing_feeling"],
            contraindications: vec!["aspirin_allergy"],
            helper_brief: "Keep the person calm and still; exertion increases cardiac workload.",
        },
        CatalogEntry {
            condition: "stroke",
            severity: Severity::Critical,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Note the time symptoms started", "Treatment windows are time-sensitive; the onset time is critical information for responders."),
                step("Call 911", "Stroke requires immediate emergency transport."),
                step("Check face, arm, speech", "Ask them to smile, raise both arms, and repeat a simple sentence."),
                step("Keep them still and calm", "Do not give food, drink, or medication."),
            ],
            bring: vec![],
            symptoms: vec!["facial_drooping", "arm_weakness", "speech_difficulty", "sudden_confusion", "vision_problems", "severe_headache", "loss_of_balance"],
            contraindications: vec!["no_food_or_water", "no_medication"],
            helper_brief: "Record the exact time symptoms began; relay it to responders.",
        },
        CatalogEntry {
            condition: "fainting",
            severity: Severity::Moderate,
            requires_sos: false,
            requires_helpers: true,
            steps: vec![
                step("Ensure safety", "Lower them gently to the ground to prevent injury from a fall."),
                step("Position properly", "Lay them flat and elevate the legs about 12 inches if there is no injury."),
                step("Check for waking", "They should regain consciousness within a minute; loosen tight clothing."),
                step("Recovery position", "If breathing normally but not fully alert, place them on their side."),
            ],
            bring: vec![],
            symptoms: vec!["passed_out", "dizzy", "lightheaded", "lost_consciousness_brief", "pale"],
            contraindications: vec![],
            helper_brief: "Do not let them stand up quickly once they wake; sit them up gradually.",
        },
        CatalogEntry {
            condition: "burn",
            severity: Severity::Moderate,
            requires_sos: false,
            requires_helpers: false,
            steps: vec![
                step("Stop the burning", "Remove the person from the heat source and remove smoldering clothing."),
                step("Cool with water", "Run cool (not ice-cold) water over the burn for 10-20 minutes."),
                step("Assess severity", "Large, deep, or white/charred burns need emergency care."),
                step("Cover loosely", "Use a clean, non-stick dressing; do not apply ice, butter, or ointments."),
            ],
            bring: vec!["clean, non-stick dressing"],
            symptoms: vec!["red_skin", "blisters", "charred_skin", "white_areas", "severe_pain", "burned_area"],
            contraindications: vec!["ice", "butter_or_oils"],
            helper_brief: "Keep the burn cool and covered; watch for signs of shock in large burns.",
        },
        CatalogEntry {
            condition: "minor_cut",
            severity: Severity::Mild,
            requires_sos: false,
            requires_helpers: false,
            steps: vec![
                step("Wash hands", "Clean your hands before treating the wound to avoid infection."),
                step("Stop the bleeding", "Apply gentle pressure with a clean cloth for a few minutes."),
                step("Clean the wound", "Rinse with clean water; remove visible debris."),
                step("Apply ointment and bandage", "Cover with an antibiotic ointment and a clean bandage."),
            ],
            bring: vec!["antibiotic ointment", "bandage"],
            symptoms: vec!["small_cut", "scrape", "minor_bleeding"],
            contraindications: vec![],
            helper_brief: "Watch for redness, swelling, or warmth over the next day as signs of infection.",
        },
        CatalogEntry {
            condition: "breathing_difficulty",
            severity: Severity::Severe,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Call 911", "Significant breathing difficulty needs emergency evaluation."),
                step("Sit upright", "Help them sit up, leaning slightly forward, to ease breathing."),
                step("Use inhaler if prescribed", "Assist with a rescue inhaler if they have one."),
                step("Keep calm", "Anxiety worsens breathing difficulty; speak calmly and reassure them."),
            ],
            bring: vec!["prescribed inhaler if available"],
            symptoms: vec!["cant_breathe", "gasping", "wheezing", "chest_tight", "rapid_breathing", "blue_lips"],
            contraindications: vec![],
            helper_brief: "Be ready to escalate to CPR if they lose consciousness or stop breathing.",
        },
        CatalogEntry {
            condition: "allergic_reaction",
            severity: Severity::Severe,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Call 911", "Severe allergic reactions can progress to anaphylaxis rapidly."),
                step("Use epinephrine auto-injector", "If prescribed, administer it into the outer thigh immediately."),
                step("Keep them lying down", "Elevate the legs unless they are having trouble breathing, then sit upright."),
                step("Monitor breathing", "Watch closely for swelling of the face, lips, or throat."),
            ],
            bring: vec!["epinephrine auto-injector if prescribed"],
            symptoms: vec!["hives", "swelling_face", "swelling_throat", "difficulty_swallowing", "rapid_pulse", "rash"],
            contraindications: vec![],
            helper_brief: "A second epinephrine dose may be needed after 5-15 minutes if symptoms persist.",
        },
        CatalogEntry {
            condition: "seizure",
            severity: Severity::Severe,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Protect from injury", "Clear the area of hard or sharp objects; do not restrain them."),
                step("Cushion the head", "Place something soft under their head."),
                step("Time the seizure", "Call 911 if it lasts longer than 5 minutes or repeats."),
                step("Turn on their side after", "Once convulsions stop, roll them onto their side to keep the airway clear."),
            ],
            bring: vec![],
            symptoms: vec!["convulsions", "shaking", "loss_of_consciousness", "stiffening", "confusion_after"],
            contraindications: vec!["do_not_restrain", "nothing_in_mouth"],
            helper_brief: "Never put anything in their mouth; note the duration for responders.",
        },
        CatalogEntry {
            condition: "diabetic_emergency",
            severity: Severity::Severe,
            requires_sos: false,
            requires_helpers: true,
            steps: vec![
                step("Check responsiveness", "If conscious and able to swallow, give fast-acting sugar."),
                step("Give sugar if conscious", "Juice, regular soda, or glucose tablets can help if low blood sugar is suspected."),
                step("Call 911 if unresponsive", "If they lose consciousness or do not improve in 15 minutes, call emergency services."),
                step("Recheck in 15 minutes", "Symptoms should improve; if not, repeat sugar or seek care."),
            ],
            bring: vec!["juice, soda, or glucose tablets"],
            symptoms: vec!["confusion", "shakiness", "sweating", "weakness", "rapid_heartbeat", "unresponsive_diabetic"],
            contraindications: vec!["no_sugar_if_unconscious"],
            helper_brief: "Never give food or drink to someone who is not fully alert.",
        },
        CatalogEntry {
            condition: "poisoning",
            severity: Severity::Severe,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Call 911 or poison control", "Get professional guidance before attempting any treatment."),
                step("Identify the substance", "Keep the container or packaging to show responders."),
                step("Do not induce vomiting", "Unless specifically instructed by poison control."),
                step("Monitor breathing and consciousness", "Be ready to perform CPR if they stop breathing."),
            ],
            bring: vec!["the substance container or packaging"],
            symptoms: vec!["vomiting", "confusion", "difficulty_breathing", "burns_around_mouth", "drowsiness"],
            contraindications: vec!["do_not_induce_vomiting"],
            helper_brief: "Do not give anything by mouth unless poison control instructs you to.",
        },
        CatalogEntry {
            condition: "fracture",
            severity: Severity::Moderate,
            requires_sos: false,
            requires_helpers: false,
            steps: vec![
                step("Keep the area still", "Avoid moving the injured limb or joint."),
                step("Immobilize if possible", "Splint using a rigid object and padding if trained to do so."),
                step("Apply ice", "Wrap ice in cloth and apply to reduce swelling."),
                step("Seek medical care", "Go to urgent care or an emergency room for an X-ray."),
            ],
            bring: vec!["splint material", "ice pack"],
            symptoms: vec!["deformity", "swelling", "severe_pain_limb", "unable_to_bear_weight", "bruising"],
            contraindications: vec!["do_not_realign"],
            helper_brief: "Do not attempt to straighten or realign the limb.",
        },
        CatalogEntry {
            condition: "hypothermia",
            severity: Severity::Severe,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Call 911", "Moderate to severe hypothermia needs emergency care."),
                step("Move to warmth", "Get them out of the cold and remove wet clothing."),
                step("Warm gradually", "Use blankets and warm, dry layers; avoid direct heat sources."),
                step("Give warm drinks if alert", "Only if they are fully conscious and able to swallow."),
            ],
            bring: vec!["blankets", "dry clothing"],
            symptoms: vec!["shivering", "confusion", "slurred_speech", "drowsiness", "cold_skin"],
            contraindications: vec!["no_direct_heat", "no_alcohol"],
            helper_brief: "Rewarm gradually; rapid rewarming can cause dangerous heart rhythm changes.",
        },
        CatalogEntry {
            condition: "heat_stroke",
            severity: Severity::Critical,
            requires_sos: true,
            requires_helpers: false,
            steps: vec![
                step("Call 911", "Heat stroke is a life-threatening emergency."),
                step("Move to a cool place", "Get them out of the sun and into shade or air conditioning."),
                step("Cool rapidly", "Apply cool water or ice packs to the neck, armpits, and groin."),
                step("Monitor closely", "Watch for loss of consciousness or seizures."),
            ],
            bring: vec!["cool water", "ice packs"],
            symptoms: vec!["hot_dry_skin", "confusion", "rapid_pulse", "high_body_temperature", "loss_of_consciousness_heat"],
            contraindications: vec!["no_aspirin"],
            helper_brief: "Do not give fluids by mouth if they are not fully alert.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_without_duplicates() {
        let catalog = Catalog::load().unwrap();
        assert!(catalog.get("cardiac_arrest").is_some());
        assert!(catalog.get("nonexistent_condition").is_none());
    }

    #[test]
    fn every_condition_has_nonempty_steps() {
        let catalog = Catalog::load().unwrap();
        for condition in catalog.all_conditions() {
            let entry = catalog.get(condition).unwrap();
            assert!(!entry.steps.is_empty(), "{condition} has no steps");
        }
    }

    #[test]
    fn requires_sos_conditions_are_severe_or_critical() {
        let catalog = Catalog::load().unwrap();
        let entry = catalog.get("cardiac_arrest").unwrap();
        assert!(entry.requires_sos);
        assert_eq!(entry.severity, Severity::Critical);
    }
}
