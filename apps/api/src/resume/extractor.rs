use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{generate_within, parse_model_output, ModelOutput, TextGenerator};
use crate::normalize::{heuristic_parse, normalize_extraction, CanonicalCandidateFields};
use crate::resume::prompts::extraction_prompt;

/// Which path produced the extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Ai,
    Heuristic,
}

/// Turns resume text into canonical candidate fields, preferring the AI
/// capability and falling back to the keyword parser on any failure.
pub struct ResumeExtractor {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl ResumeExtractor {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn extract(&self, text: &str) -> (CanonicalCandidateFields, ExtractionSource) {
        let Some(generator) = &self.generator else {
            return (heuristic_parse(text), ExtractionSource::Heuristic);
        };
        if text.trim().is_empty() {
            return (heuristic_parse(text), ExtractionSource::Heuristic);
        }

        let prompt = extraction_prompt(text);
        let reply = match generate_within(generator.as_ref(), &prompt, JSON_ONLY_SYSTEM, self.timeout).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("AI resume extraction failed, using heuristic parser: {e}");
                return (heuristic_parse(text), ExtractionSource::Heuristic);
            }
        };

        match parse_model_output(&reply) {
            ModelOutput::Structured(value @ Value::Object(_)) => {
                let fields = normalize_extraction(&value);
                info!(
                    "AI extracted {} skills, {} projects",
                    fields.skills.len(),
                    fields.projects.len()
                );
                (fields, ExtractionSource::Ai)
            }
            ModelOutput::Structured(_) | ModelOutput::Unparseable(_) => {
                warn!("AI resume extraction returned no JSON object, using heuristic parser");
                (heuristic_parse(text), ExtractionSource::Heuristic)
            }
        }
    }
}
