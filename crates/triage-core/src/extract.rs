//! Symptom & Age Extractor (C4, spec.md §4.4).
//!
//! Two pure, deterministic functions over raw text, ported from
//! `hybrid_rag.py::_extract_symptoms` (the keyword table) and
//! `_extract_age_group` (the precedence-ordered patterns). The original's
//! `_detect_unresponsiveness` helper is not ported — per spec.md §9(b) it is
//! defined but never consulted on the source's own read path.

use std::collections::HashSet;

use crate::types::AgeBucket;

/// `(canonical symptom token, surface phrases)` — a symptom is emitted when
/// any phrase matches as a case-insensitive substring of the space-normalized
/// text.
const SYMPTOM_TABLE: &[(&str, &[&str])] = &[
    ("unconscious", &["unconscious", "not waking up", "won't wake up", "wont wake up", "unresponsive"]),
    ("not_breathing", &["not breathing", "stopped breathing", "isn't breathing", "isnt breathing"]),
    ("no_pulse", &["no pulse", "can't find a pulse", "cant find a pulse"]),
    ("collapsed", &["collapsed", "fell down", "dropped to the ground"]),
    ("blue_lips", &["blue lips", "lips turning blue", "turning blue"]),
    ("chest_pain", &["chest pain", "pain in my chest", "chest hurts"]),
    ("chest_pressure", &["chest pressure", "pressure in my chest", "crushing feeling"]),
    ("shortness_of_breath", &["shortness of breath", "short of breath", "can't catch my breath", "cant catch my breath"]),
    ("pain_radiating_arm", &["pain radiating to my arm", "pain in my arm", "arm hurts"]),
    ("pain_radiating_jaw", &["pain radiating to my jaw", "jaw pain"]),
    ("sweating", &["sweating", "sweaty"]),
    ("nausea", &["nausea", "nauseous", "feel sick"]),
    ("cant_breathe", &["can't breathe", "cant breathe", "cannot breathe", "can't breath", "cant breath"]),
    ("hands_on_throat", &["hands on throat", "clutching throat", "grabbing throat"]),
    ("turning_blue", &["turning blue", "going blue"]),
    ("gasping", &["gasping", "gasping for air"]),
    ("wheezing", &["wheezing"]),
    ("unable_to_speak", &["can't speak", "cant speak", "unable to speak", "can't talk", "cant talk"]),
    ("blood_gushing", &["blood gushing", "gushing blood"]),
    ("heavy_bleeding", &["heavy bleeding", "bleeding a lot", "bleeding heavily"]),
    ("deep_cut", &["deep cut", "deep gash"]),
    ("arterial_bleeding", &["arterial bleeding", "spurting blood", "blood spurting"]),
    ("blood_pooling", &["blood pooling", "pool of blood"]),
    ("facial_drooping", &["face drooping", "facial drooping", "face is drooping"]),
    ("arm_weakness", &["arm weakness", "arm is weak", "can't lift my arm", "cant lift my arm"]),
    ("speech_difficulty", &["slurred speech", "trouble speaking", "can't speak clearly", "cant speak clearly"]),
    ("sudden_confusion", &["sudden confusion", "suddenly confused"]),
    ("vision_problems", &["vision problems", "blurry vision", "can't see", "cant see"]),
    ("severe_headache", &["severe headache", "worst headache"]),
    ("loss_of_balance", &["loss of balance", "can't balance", "cant balance"]),
    ("passed_out", &["passed out", "blacked out"]),
    ("dizzy", &["dizzy", "dizziness"]),
    ("lightheaded", &["lightheaded", "light headed"]),
    ("fainted", &["fainted", "fainting"]),
    ("pale", &["pale", "looks pale"]),
    ("red_skin", &["red skin", "skin is red"]),
    ("blisters", &["blisters", "blistering"]),
    ("charred_skin", &["charred skin", "skin is charred"]),
    ("white_areas", &["white areas", "skin turned white"]),
    ("severe_pain", &["severe pain", "excruciating pain"]),
    ("burned", &["burned", "got burned", "burning"]),
    ("hives", &["hives"]),
    ("swelling_face", &["face swelling", "swollen face", "face is swollen"]),
    ("swelling_throat", &["throat swelling", "throat closing", "throat is closing"]),
    ("difficulty_swallowing", &["difficulty swallowing", "can't swallow", "cant swallow"]),
    ("convulsions", &["convulsions", "convulsing"]),
    ("shaking", &["shaking", "shaking uncontrollably"]),
    ("confusion", &["confused", "confusion"]),
    ("shakiness", &["shaky", "shakiness"]),
    ("deformity", &["deformed", "looks deformed", "bent at an odd angle"]),
    ("unable_to_bear_weight", &["can't bear weight", "cant bear weight", "can't walk on it", "cant walk on it"]),
    ("shivering", &["shivering"]),
    ("cold_skin", &["cold skin", "skin is cold"]),
    ("hot_dry_skin", &["hot dry skin", "skin is hot and dry"]),
    ("small_cut", &["small cut", "minor cut"]),
    ("scrape", &["scrape", "scraped"]),
    ("choking", &["choking", "choked"]),
    ("burned_area", &["burned area", "burn wound"]),
];

/// Space-normalize and lowercase for substring matching.
fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `extract_symptoms(text) -> set` — order-independent, idempotent (spec.md
/// §4.4, tested in §8 "round-trip/idempotence").
pub fn extract_symptoms(text: &str) -> HashSet<String> {
    let normalized = normalize(text);
    SYMPTOM_TABLE
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|p| normalized.contains(p)))
        .map(|(token, _)| token.to_string())
        .collect()
}

/// True if `needle` occurs in `haystack` bounded by non-alphanumeric
/// characters (or the string edges) on both sides — a hand-rolled `\bword\b`
/// since phrases can contain internal spaces (e.g. "old man").
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let abs = start + pos;
        let before_ok = haystack[..abs].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[abs + needle.len()..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
    }
    false
}

/// Precedence-ordered age patterns: elderly, then child, then adult. Numeric
/// ages map to ranges (0-17 child, 18-64 adult, 65+ elderly), matching
/// `_extract_age_group`'s three regex lists.
pub fn extract_age(text: &str) -> Option<AgeBucket> {
    let lower = text.to_lowercase();

    const ELDERLY_WORDS: &[&str] = &[
        "elderly", "senior", "old man", "old woman", "grandpa", "grandma",
        "grandfather", "grandmother", "aged",
    ];
    const CHILD_WORDS: &[&str] = &[
        "child", "kid", "baby", "infant", "toddler", "boy", "girl", "son",
        "daughter", "teen", "young", "minor", "newborn",
    ];
    const ADULT_WORDS: &[&str] = &["adult", "man", "woman", "person"];

    if ELDERLY_WORDS.iter().any(|w| contains_word(&lower, w)) {
        return Some(AgeBucket::Elderly);
    }
    if let Some(n) = numeric_age(&lower) {
        return Some(bucket_for_age(n));
    }
    if CHILD_WORDS.iter().any(|w| contains_word(&lower, w)) {
        return Some(AgeBucket::Child);
    }
    if ADULT_WORDS.iter().any(|w| contains_word(&lower, w)) {
        return Some(AgeBucket::Adult);
    }
    None
}

fn bucket_for_age(age: u32) -> AgeBucket {
    match age {
        0..=17 => AgeBucket::Child,
        18..=64 => AgeBucket::Adult,
        _ => AgeBucket::Elderly,
    }
}

/// Finds a pattern like "80 year old", "80-year-old", "80 y.o.", "80yo",
/// returning the leading integer. "N months old" only counts as a numeric
/// age when N is itself in the child range (1-17): `_extract_age_group`'s
/// months pattern is one of the *child* list's own alternatives, not a
/// unit conversion, so "18 months old" matches no pattern at all rather
/// than being read as age 18.
fn numeric_age(lower: &str) -> Option<u32> {
    let bytes = lower.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let boundary_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
            if boundary_ok {
                let digits = &lower[start..i];
                if let Ok(n) = digits.parse::<u32>() {
                    if n <= 120 {
                        let rest = lower[i..].trim_start_matches(['-', ' ']);
                        let matches_years = rest.starts_with("year")
                            || rest.starts_with("y.o")
                            || rest.starts_with("yo ")
                            || rest == "yo";
                        let matches_months = rest.starts_with("months old") && (1..=17).contains(&n);
                        if matches_years || matches_months {
                            return Some(n);
                        }
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cardiac_arrest_symptoms() {
        let symptoms = extract_symptoms("My grandfather collapsed and isn't breathing");
        assert!(symptoms.contains("collapsed"));
        assert!(symptoms.contains("not_breathing"));
    }

    #[test]
    fn extract_symptoms_is_idempotent() {
        let text = "Someone is choking on food and can't breathe";
        assert_eq!(extract_symptoms(text), extract_symptoms(text));
    }

    #[test]
    fn numeric_age_seven_is_child() {
        assert_eq!(extract_age("7 years old"), Some(AgeBucket::Child));
    }

    #[test]
    fn numeric_age_eighteen_is_adult() {
        assert_eq!(extract_age("18 years old"), Some(AgeBucket::Adult));
    }

    #[test]
    fn numeric_age_sixty_five_is_elderly() {
        assert_eq!(extract_age("65 years old"), Some(AgeBucket::Elderly));
    }

    #[test]
    fn grandma_is_elderly_regardless_of_numeric() {
        assert_eq!(extract_age("grandma is 40 and fainted"), Some(AgeBucket::Elderly));
    }

    #[test]
    fn no_age_signal_returns_none() {
        assert_eq!(extract_age("they feel kinda off"), None);
    }

    #[test]
    fn person_is_adult_not_child_via_son_substring() {
        assert_eq!(extract_age("the person collapsed in the kitchen"), Some(AgeBucket::Adult));
    }

    #[test]
    fn eighteen_months_old_has_no_numeric_match() {
        assert_eq!(extract_age("an 18 months old infant is vomiting"), Some(AgeBucket::Child));
    }

    #[test]
    fn eighteen_months_old_without_child_word_is_unresolved() {
        assert_eq!(extract_age("18 months old and vomiting"), None);
    }
}
