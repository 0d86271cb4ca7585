// Prompt text shared by the chat flow: the base system instruction and the
// per-question generation prompt.

use std::path::Path;

use serde_json::Value;
use tracing::{error, info};

/// Used whenever `system_instruction.json` is missing, malformed or empty.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are an AI assistant for Lucas's resume. Please provide relevant information.";

/// Builds the per-question prompt. The model is told to stay within the
/// supplied facts.
pub fn answer_prompt(question: &str, factual_summary: &str) -> String {
    format!(
        "Responda à pergunta do usuário usando apenas as informações abaixo, sem inventar nada. \
         Seja claro, objetivo e profissional.\n\n\
         Pergunta: {question}\n\n\
         Informações disponíveis:\n{factual_summary}"
    )
}

/// Reads and renders the system instruction, falling back to
/// [`DEFAULT_SYSTEM_INSTRUCTION`] on any failure.
pub fn load_system_instruction(path: &Path) -> String {
    let document = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            error!(path = %path.display(), error = %e, "System instruction file not readable");
            return DEFAULT_SYSTEM_INSTRUCTION.to_string();
        }
    };
    let document: Value = match serde_json::from_str(&document) {
        Ok(v) => v,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Invalid JSON in system instruction file");
            return DEFAULT_SYSTEM_INSTRUCTION.to_string();
        }
    };

    let instruction = build_system_instruction(&document);
    if instruction.trim().is_empty() {
        error!(path = %path.display(), "System instruction built from file is empty");
        return DEFAULT_SYSTEM_INSTRUCTION.to_string();
    }
    info!(chars = instruction.chars().count(), "System instruction loaded");
    instruction
}

/// Renders `sys[0]`: the role purpose, then numbered core rules (with
/// examples) and numbered advanced behaviors. Rules keep file order.
pub fn build_system_instruction(document: &Value) -> String {
    let Some(sys) = document
        .get("sys")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
    else {
        return String::new();
    };

    let mut lines: Vec<String> = Vec::new();

    if let Some(purpose) = sys
        .get("role_definition")
        .and_then(|r| r.get("purpose"))
        .and_then(Value::as_str)
    {
        lines.push(purpose.to_string());
    }

    lines.push("\nIMPORTANT Rules:".to_string());
    for (n, (key, rule)) in rules(sys, "core_rules").enumerate() {
        lines.push(format!("{}. {}", n + 1, rule_line(key, rule)));
        let examples = rule
            .get("examples")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if !examples.is_empty() {
            lines.push("    Examples:".to_string());
            for example in examples {
                lines.push(format!("    - {}", text_of(example)));
            }
        }
    }

    lines.push("\nAdvanced Behaviors:".to_string());
    for (n, (key, rule)) in rules(sys, "advanced_behaviors").enumerate() {
        lines.push(format!("{}. {}", n + 1, rule_line(key, rule)));
    }

    lines.join("\n")
}

fn rules<'a>(sys: &'a Value, field: &str) -> impl Iterator<Item = (&'a String, &'a Value)> {
    sys.get(field)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.iter())
}

fn rule_line(key: &str, rule: &Value) -> String {
    let title = rule.get("title").and_then(Value::as_str).unwrap_or(key);
    let instruction = rule.get("instruction").and_then(Value::as_str).unwrap_or_default();
    format!("{title}: {instruction}")
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
