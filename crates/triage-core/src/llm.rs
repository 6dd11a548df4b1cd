//! LLM Adapter (C5, spec.md §4.5).
//!
//! The original calls Google's Gemini through `google.generativeai`
//! (`llm_enhanced.py`); this adapter calls the same REST surface
//! (`generateContent`) with `reqwest`, since the pack has no bindings for
//! that SDK and a plain HTTP client is the idiomatic stand-in used
//! elsewhere in the corpus for external model calls (see DESIGN.md).
//!
//! Per spec.md §9's "exception-based flow" redesign note, every failure mode
//! — network error, timeout, non-2xx, malformed JSON, missing field —
//! collapses to `Ok(None)` at [`LlmAdapter::classify`]; nothing here ever
//! propagates an `Err` out of the public entry point.

use std::time::Duration;

use serde::Deserialize;

use crate::error::LlmError;
use crate::types::AgeBucket;

const FEW_SHOT_EXAMPLES: &str = r#"
Example 1:
User: "My dad collapsed and isn't breathing"
Response: {"emergency_type": "cardiac_arrest", "severity": "CRITICAL", "confidence": 0.93, "reasoning": "Collapse with absent breathing indicates cardiac arrest", "needs_follow_up": false, "key_symptoms_identified": ["collapsed", "not_breathing"], "red_flags": ["unresponsive"]}

Example 2:
User: "Someone is choking and can't speak"
Response: {"emergency_type": "choking", "severity": "CRITICAL", "confidence": 0.90, "reasoning": "Inability to speak indicates complete airway obstruction", "needs_follow_up": false, "key_symptoms_identified": ["unable_to_speak"], "red_flags": ["cant_breathe"]}

Example 3:
User: "I have a small cut on my finger"
Response: {"emergency_type": "minor_cut", "severity": "MILD", "confidence": 0.85, "reasoning": "Small cut with no signs of severe bleeding or deep tissue involvement", "needs_follow_up": false, "key_symptoms_identified": ["small_cut"], "red_flags": []}

Example 4:
My grandmother fainted after standing up"
Response: {"emergency_type": "fainting", "severity": "MODERATE", "confidence": 0.80, "reasoning": "Brief loss of consciousness on standing, elderly patient warrants closer monitoring", "needs_follow_up": false, "key_symptoms_identified": ["passed_out"], "red_flags": []}

Example 5:
User: "chest pain and sweating"
Response: {"emergency_type": "chest_pain_cardiac", "severity": "CRITICAL", "confidence": 0.88, "reasoning": "Chest pain with diaphoresis is a classic acute coronary syndrome presentation", "needs_follow_up": false, "key_symptoms_identified": ["chest_pain", "sweating"], "red_flags": ["sweating"]}
"#;

/// The strict JSON shape the adapter instructs the model to emit
/// (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct LlmVerdict {
    pub emergency_type: String,
    pub severity: String,
    pub confidence: f64,
    pub reasoning: String,
    pub needs_follow_up: bool,
    pub key_symptoms: Vec<String>,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    emergency_type: String,
    severity: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    needs_follow_up: bool,
    #[serde(default)]
    key_symptoms_identified: Vec<String>,
    #[serde(default)]
    red_flags: Vec<String>,
}

impl From<RawVerdict> for LlmVerdict {
    fn from(raw: RawVerdict) -> Self {
        Self {
            emergency_type: raw.emergency_type,
            severity: raw.severity,
            confidence: raw.confidence,
            reasoning: raw.reasoning,
            needs_follow_up: raw.needs_follow_up,
            key_symptoms: raw.key_symptoms_identified,
            red_flags: raw.red_flags,
        }
    }
}

/// One top-k context line handed to the prompt — either a vector match or a
/// graph match, formatted as a bullet.
pub struct ContextLine {
    pub condition: String,
    pub confidence: f64,
}

pub struct LlmAdapter {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    known_conditions: Vec<&'static str>,
}

impl LlmAdapter {
    pub fn new(endpoint: Option<String>, api_key: Option<String>, known_conditions: Vec<&'static str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, endpoint, api_key, known_conditions }
    }

    /// `classify(user_text, age, vector_context, graph_context) -> llm_verdict?`
    /// (spec.md §4.5). Never returns `Err`; any internal failure collapses
    /// to `Ok(None)`.
    pub async fn classify(
        &self,
        user_text: &str,
        age: Option<AgeBucket>,
        vector_context: &[ContextLine],
        graph_context: &[ContextLine],
    ) -> Result<Option<LlmVerdict>, std::convert::Infallible> {
        let Some(endpoint) = self.endpoint.as_ref() else {
            tracing::debug!("llm adapter has no endpoint configured, treating source as absent");
            return Ok(None);
        };

        let prompt = self.build_prompt(user_text, age, vector_context, graph_context);

        match self.call(endpoint, &prompt).await {
            Ok(verdict) => Ok(Some(verdict)),
            Err(e) => {
                tracing::warn!("llm adapter call failed, treating source as absent: {e}");
                Ok(None)
            }
        }
    }

    fn build_prompt(
        &self,
        user_text: &str,
        age: Option<AgeBucket>,
        vector_context: &[ContextLine],
        graph_context: &[ContextLine],
    ) -> String {
        let age_str = age.map(|a| a.to_string()).unwrap_or_else(|| "unknown".to_string());
        let conditions = self.known_conditions.join(", ");

        let mut vector_lines = String::new();
        for line in vector_context {
            vector_lines.push_str(&format!("- {} (confidence {:.2})\n", line.condition, line.confidence));
        }
        let mut graph_lines = String::new();
        for line in graph_context {
            graph_lines.push_str(&format!("- {} (score {:.2})\n", line.condition, line.confidence));
        }

        format!(
            r#"You are a medical emergency triage assistant. Severity levels, from least to most urgent: MILD, MODERATE, SEVERE, CRITICAL.

Valid emergency categories: {conditions}

{FEW_SHOT_EXAMPLES}

Patient age group: {age_str}
User description: "{user_text}"

Vector database matches:
{vector_lines}
Knowledge graph matches:
{graph_lines}

Respond with STRICT JSON only, no surrounding prose or Markdown fences, with exactly these fields:
{{"emergency_type": string, "severity": string, "confidence": number between 0 and 1, "reasoning": string, "needs_follow_up": boolean, "key_symptoms_identified": [string], "red_flags": [string]}}

IMPORTANT RULES:
1. emergency_type MUST be one of the valid categories above, or "unknown".
2. severity MUST be one of MILD, MODERATE, SEVERE, CRITICAL.
3. confidence reflects your actual certainty, not a default value.
4. Use the vector and graph matches as supporting evidence, not as the final answer.
5. Never include text outside the JSON object."#
        )
    }

    async fn call(&self, endpoint: &str, prompt: &str) -> Result<LlmVerdict, LlmError> {
        let mut request = self.client.post(endpoint).json(&serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        }));
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LlmError::Status(response.status()));
        }

        let body: serde_json::Value = response.json().await.map_err(LlmError::Request)?;
        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(LlmError::MissingField("candidates[0].content.parts[0].text"))?;

        let stripped = strip_fences(text);
        let raw: RawVerdict = serde_json::from_str(&stripped)?;
        Ok(raw.into())
    }
}

/// Strips surrounding ```` ```json ```` / ```` ``` ```` fences, mirroring
/// `llm_enhanced.py`'s `.replace("```json", "").replace("```", "")`.
fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(fenced), "{\"a\": 1}");
    }

    #[test]
    fn strips_plain_fence() {
        let fenced = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(fenced), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn no_endpoint_configured_yields_none() {
        let adapter = LlmAdapter::new(None, None, vec!["cardiac_arrest"]);
        let result = adapter.classify("chest pain", None, &[], &[]).await.unwrap();
        assert!(result.is_none());
    }
}
