//! Seed exemplars loaded into an empty case corpus on first open.
//!
//! The first eight groups are ported from `vector_db.py`'s
//! `training_cases` list; the remaining eight conditions
//! (`stroke`, `allergic_reaction`, `seizure`, `diabetic_emergency`,
//! `poisoning`, `fracture`, `hypothermia`, `heat_stroke`) have no seed data in
//! the original and are authored here, phrased the same way, so every
//! catalog condition clears the three-exemplar floor invariant.

use crate::types::Severity;

pub struct SeedCase {
    pub text: &'static str,
    pub condition: &'static str,
    pub severity: Severity,
}

const fn case(text: &'static str, condition: &'static str, severity: Severity) -> SeedCase {
    SeedCase { text, condition, severity }
}

pub const SEED_CASES: &[SeedCase] = &[
    // -- cardiac_arrest (ported from vector_db.py) --
    case("My dad collapsed and isn't breathing", "cardiac_arrest", Severity::Critical),
    case("He just collapsed on the floor and won't wake up", "cardiac_arrest", Severity::Critical),
    case("She's unconscious and I can't find a pulse", "cardiac_arrest", Severity::Critical),
    case("My husband fell down and he's not responding at all", "cardiac_arrest", Severity::Critical),
    case("Grandpa is unresponsive, his lips are turning blue", "cardiac_arrest", Severity::Critical),
    case("He stopped breathing suddenly and collapsed", "cardiac_arrest", Severity::Critical),
    case("She's not waking up and isn't breathing anymore", "cardiac_arrest", Severity::Critical),

    // -- chest_pain_cardiac --
    case("chest pain and sweating", "chest_pain_cardiac", Severity::Critical),
    case("I have crushing chest pain radiating to my arm", "chest_pain_cardiac", Severity::Critical),
    case("My chest hurts and I'm short of breath with jaw pain", "chest_pain_cardiac", Severity::Critical),
    case("Severe chest pressure and nausea, feels like an elephant on my chest", "chest_pain_cardiac", Severity::Critical),

    // -- choking --
    case("Someone is choking and can't speak", "choking", Severity::Critical),
    case("My son has something stuck in his throat and can't breathe", "choking", Severity::Critical),
    case("She's choking on food, hands on her throat", "choking", Severity::Critical),
    case("He's turning blue and gasping, food stuck in his throat", "choking", Severity::Critical),
    case("Can't breathe, choked on a piece of meat and can't speak", "choking", Severity::Critical),

    // -- severe_bleeding --
    case("Blood is gushing from a deep cut on his leg", "severe_bleeding", Severity::Severe),
    case("She's bleeding heavily from her arm, a pool of blood on the floor", "severe_bleeding", Severity::Severe),
    case("Arterial bleeding, blood is spurting from the wound", "severe_bleeding", Severity::Severe),
    case("Deep gash on his hand, heavy bleeding that won't stop", "severe_bleeding", Severity::Severe),

    // -- burn --
    case("I have a small cut on my finger", "minor_cut", Severity::Mild),
    case("Minor scrape on my knee from falling off my bike", "minor_cut", Severity::Mild),
    case("Small cut on my hand, just a little bleeding", "minor_cut", Severity::Mild),

    // -- burn group (separate from minor_cut above) --
    case("I got burned on my hand with hot oil, skin is red and blistering", "burn", Severity::Moderate),
    case("Spilled boiling water on my arm, the skin is white and charred in spots", "burn", Severity::Moderate),
    case("Touched a hot pan, severe pain and blisters forming", "burn", Severity::Moderate),
    case("Burned my leg on the stove, red skin and starting to blister", "burn", Severity::Moderate),

    // -- fainting --
    case("My grandmother fainted after standing up", "fainting", Severity::Moderate),
    case("He got dizzy and passed out for a few seconds", "fainting", Severity::Moderate),
    case("She felt lightheaded and blacked out briefly", "fainting", Severity::Moderate),
    case("My friend looks pale and just passed out", "fainting", Severity::Moderate),

    // -- breathing_difficulty --
    case("He's wheezing and can't catch his breath", "breathing_difficulty", Severity::Severe),
    case("She's gasping for air, chest feels tight", "breathing_difficulty", Severity::Severe),
    case("Having trouble breathing, rapid breathing and wheezing", "breathing_difficulty", Severity::Severe),

    // -- stroke (authored, no original exemplars) --
    case("His face is drooping on one side and his speech is slurred", "stroke", Severity::Critical),
    case("She suddenly can't lift her arm and her words don't make sense", "stroke", Severity::Critical),
    case("Grandma suddenly lost her balance and has blurry vision and confusion", "stroke", Severity::Critical),

    // -- allergic_reaction (authored) --
    case("His face and throat are swelling up after a bee sting", "allergic_reaction", Severity::Severe),
    case("She broke out in hives and is having trouble swallowing", "allergic_reaction", Severity::Severe),
    case("He ate peanuts and now his lips and face are swollen with a rash", "allergic_reaction", Severity::Severe),

    // -- seizure (authored) --
    case("He's having convulsions and shaking uncontrollably on the floor", "seizure", Severity::Severe),
    case("She's stiffening and jerking, looks like a seizure", "seizure", Severity::Severe),
    case("My son is convulsing and confused afterward", "seizure", Severity::Severe),

    // -- diabetic_emergency (authored) --
    case("He's a diabetic and suddenly very shaky, sweaty, and confused", "diabetic_emergency", Severity::Severe),
    case("She feels weak and confused, has diabetes and skipped a meal", "diabetic_emergency", Severity::Severe),
    case("My dad is a diabetic and unresponsive with sweating and rapid heartbeat", "diabetic_emergency", Severity::Severe),

    // -- poisoning (authored) --
    case("My toddler swallowed some pills from the medicine cabinet", "poisoning", Severity::Severe),
    case("He drank something from under the sink and is now vomiting and confused", "poisoning", Severity::Severe),
    case("She's drowsy and has burns around her mouth after swallowing a chemical", "poisoning", Severity::Severe),

    // -- fracture (authored) --
    case("He fell and his arm looks deformed and swollen, can't move it", "fracture", Severity::Moderate),
    case("She twisted her ankle badly and can't bear weight on it", "fracture", Severity::Moderate),
    case("His leg is bent at an odd angle after the fall, severe pain", "fracture", Severity::Moderate),

    // -- hypothermia (authored) --
    case("He's been out in the cold for hours and is shivering and confused", "hypothermia", Severity::Severe),
    case("Her skin is cold and she's slurring her words after being in the snow", "hypothermia", Severity::Severe),
    case("He's drowsy and shivering uncontrollably after falling into icy water", "hypothermia", Severity::Severe),

    // -- heat_stroke (authored) --
    case("She was out in the heat all day and her skin is hot and dry, very confused", "heat_stroke", Severity::Critical),
    case("He collapsed after a run in the heat, rapid pulse and not making sense", "heat_stroke", Severity::Critical),
    case("His body feels extremely hot and dry and he's losing consciousness", "heat_stroke", Severity::Critical),
];
