//! Question answering: classify, check the cache, and on a miss ground the
//! model on the selected résumé sections.

pub mod handlers;
pub mod summary;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::cache::{offload, CacheEntry};
use crate::llm_client::prompts::answer_prompt;
use crate::models::Section;
use crate::state::AppState;

use self::summary::{factual_summary, fallback_answer, no_information_answer};

#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub answer: String,
    pub cached: bool,
    /// Sections the answer was grounded on, in canonical order.
    pub sections: Vec<Section>,
}

/// Answers `question` for an already-resolved `role`. Never fails: a model
/// error degrades to an answer built from the facts themselves.
pub async fn answer_question(state: &AppState, question: &str, role: &str) -> ChatOutcome {
    let sections: Vec<Section> = state
        .classifier
        .identify_relevant_fields(question, role)
        .into_iter()
        .collect();
    debug!(role, sections = ?sections, "Relevant sections identified");

    let outcome = |answer: String, cached: bool| ChatOutcome {
        answer,
        cached,
        sections: sections.clone(),
    };

    if state.config.cache_enabled {
        if let Some(hit) = cached_answer(state, question, role, &sections).await {
            return outcome(hit.answer, true);
        }
    }

    let facts = state.resume.fetch_sections(&sections);
    if facts.is_empty() {
        debug!(role, "No factual data for question");
        return outcome(no_information_answer(&state.resume.loaded_sections()), false);
    }

    let summary = factual_summary(&facts);
    let system = state.roles.generate_role_prompt(role, &state.system_instruction);

    match state.llm.generate(&system, &answer_prompt(question, &summary)).await {
        Ok(answer) => {
            if state.config.cache_enabled {
                let factual_data: Map<String, Value> = facts
                    .iter()
                    .map(|(section, value)| (section.as_str().to_string(), value.clone()))
                    .collect();
                store_answer(state, question, role, &sections, &answer, Value::Object(factual_data))
                    .await;
            }
            outcome(answer, false)
        }
        Err(e) => {
            error!(error = %e, question_preview = %preview(question), "Answer generation failed");
            outcome(fallback_answer(question, &summary), false)
        }
    }
}

async fn cached_answer(
    state: &AppState,
    question: &str,
    role: &str,
    sections: &[Section],
) -> Option<CacheEntry> {
    let (question, role, sections) = (question.to_string(), role.to_string(), sections.to_vec());
    offload(&state.cache, move |cache| cache.get(&question, &role, &sections))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Cache lookup task failed, treating as miss");
            None
        })
}

async fn store_answer(
    state: &AppState,
    question: &str,
    role: &str,
    sections: &[Section],
    answer: &str,
    factual_data: Value,
) {
    let (question, role, sections, answer) = (
        question.to_string(),
        role.to_string(),
        sections.to_vec(),
        answer.to_string(),
    );
    let stored = offload(&state.cache, move |cache| {
        cache.set(&question, &role, &sections, &answer, factual_data)
    })
    .await;
    if let Err(e) = stored {
        warn!(error = %e, "Cache write task failed");
    }
}

/// First `max` characters, for log lines.
pub fn preview_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn preview(question: &str) -> String {
    preview_chars(question, 50)
}
