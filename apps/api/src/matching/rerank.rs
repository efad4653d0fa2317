//! AI Re-ranking Adapter — lets the text-generation capability annotate and
//! nudge the head of the ranked list.
//!
//! Every failure (transport, timeout, unparseable output, schema violation)
//! degrades the whole batch to the templated rationale with base scores left
//! untouched. A partially applied AI response is never returned.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm_client::{generate_within, parse_model_output, ModelOutput, TextGenerator};
use crate::matching::prompts::{rerank_prompt, RERANK_SYSTEM};
use crate::matching::scoring::{rank, ScoredCandidate};
use crate::models::project::Project;

/// `_base_score *= RERANK_FLOOR + RERANK_SPAN * rerank_score`
const RERANK_FLOOR: f64 = 0.8;
const RERANK_SPAN: f64 = 0.4;

/// One parsed entry of the model's `results` array.
#[derive(Debug, Clone, PartialEq)]
struct RerankVerdict {
    rerank_score: f64,
    reason: Option<String>,
}

pub struct Reranker {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl Reranker {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Re-ranks the first `top_k` candidates. The tail is returned unchanged,
    /// after the head.
    pub async fn rerank(
        &self,
        project: &Project,
        mut ranked: Vec<ScoredCandidate>,
        top_k: usize,
    ) -> Vec<ScoredCandidate> {
        let top_k = top_k.min(ranked.len());
        let head = &mut ranked[..top_k];

        let Some(generator) = &self.generator else {
            debug!("AI re-ranking disabled; using templated rationale");
            apply_templated_reasons(head);
            return ranked;
        };

        match self.ask(generator.as_ref(), project, head).await {
            Ok(verdicts) => {
                info!(
                    "AI re-ranked {} candidates ({} verdicts)",
                    head.len(),
                    verdicts.len()
                );
                apply_verdicts(head, &verdicts);
                rank(head);
            }
            Err(reason) => {
                warn!("AI re-ranking degraded to fallback: {reason}");
                apply_templated_reasons(head);
            }
        }
        ranked
    }

    async fn ask(
        &self,
        generator: &dyn TextGenerator,
        project: &Project,
        head: &[ScoredCandidate],
    ) -> Result<HashMap<String, RerankVerdict>, String> {
        let prompt = rerank_prompt(project, head);
        let text = generate_within(generator, &prompt, RERANK_SYSTEM, self.timeout)
            .await
            .map_err(|e| e.to_string())?;

        match parse_model_output(&text) {
            ModelOutput::Structured(value) => parse_verdicts(&value),
            ModelOutput::Unparseable(_) => Err("model output was not JSON".to_string()),
        }
    }
}

/// The fallback one-sentence rationale.
pub fn templated_reason(c: &ScoredCandidate) -> String {
    let skills = if c.matched_skills.is_empty() {
        "relevant".to_string()
    } else {
        c.matched_skills.join(", ")
    };

    let availability = if !c.candidate.availability_dates.is_empty() {
        c.candidate.availability_dates.join(", ")
    } else {
        c.candidate
            .availability
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("soon")
            .to_string()
    };

    format!(
        "This employee has {skills} skills, has done projects in these areas, \
         and is available {availability}."
    )
}

fn apply_templated_reasons(head: &mut [ScoredCandidate]) {
    for c in head {
        c.ai_reason = Some(templated_reason(c));
    }
}

fn apply_verdicts(head: &mut [ScoredCandidate], verdicts: &HashMap<String, RerankVerdict>) {
    for c in head {
        match verdicts.get(&c.candidate.id.to_string()) {
            Some(verdict) => {
                c.base_score *= RERANK_FLOOR + RERANK_SPAN * verdict.rerank_score;
                c.ai_reason = Some(
                    verdict
                        .reason
                        .clone()
                        .unwrap_or_else(|| templated_reason(c)),
                );
            }
            None => c.ai_reason = Some(templated_reason(c)),
        }
    }
}

/// Validates `{"results": [{"id", "rerank_score", "reason"}]}`.
///
/// Entries without an id are ignored and a missing score counts as 0; a
/// score that is not a number in [0, 1] rejects the whole response.
fn parse_verdicts(value: &Value) -> Result<HashMap<String, RerankVerdict>, String> {
    let results = value
        .get("results")
        .and_then(Value::as_array)
        .ok_or("response has no `results` array")?;

    let mut verdicts = HashMap::new();
    for entry in results {
        let id = match entry.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => continue,
        };

        let rerank_score = match entry.get("rerank_score") {
            None | Some(Value::Null) => 0.0,
            Some(raw) => raw
                .as_f64()
                .filter(|s| s.is_finite() && (0.0..=1.0).contains(s))
                .ok_or_else(|| format!("invalid rerank_score {raw} for {id}"))?,
        };

        let reason = entry
            .get("reason")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        verdicts.insert(
            id,
            RerankVerdict {
                rerank_score,
                reason,
            },
        );
    }
    Ok(verdicts)
}
