//! Plain-text renderings of résumé data: the factual summary handed to the
//! model, and the canned answers used when there is nothing to generate from.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::Section;

const MAX_PROJECTS: usize = 3;
const MAX_LIST_ITEMS: usize = 5;

/// One line per fact, in canonical section order.
pub fn factual_summary(data: &BTreeMap<Section, Value>) -> String {
    let mut lines = Vec::new();

    for (section, value) in data {
        match (section, value) {
            (Section::AcademicBackground, Value::Array(items)) => {
                for item in items {
                    lines.push(format!(
                        "- {} em {} ({})",
                        field(item, "degree"),
                        field(item, "school"),
                        field(item, "year")
                    ));
                }
            }
            (Section::Projects, Value::Array(items)) => {
                for item in items.iter().take(MAX_PROJECTS) {
                    lines.push(format!(
                        "- Projeto: {} - {}",
                        field(item, "name"),
                        field(item, "description")
                    ));
                }
            }
            (_, Value::Array(items)) => {
                let shown = items
                    .iter()
                    .take(MAX_LIST_ITEMS)
                    .map(display)
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("- {}: {shown}", section.label()));
            }
            (_, Value::Object(map)) => {
                let shown = map
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", display(v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("- {}: {shown}", section.label()));
            }
            (_, scalar) => lines.push(format!("- {}: {}", section.label(), display(scalar))),
        }
    }

    lines.join("\n")
}

/// Returned (uncached) when the model call fails: the facts themselves.
pub fn fallback_answer(question: &str, summary: &str) -> String {
    format!(
        "Com base nas informações disponíveis:\n{summary}\n\n\
         Resposta à pergunta '{question}': As informações estão disponíveis acima."
    )
}

/// Returned when no section data could be found for the question.
/// `available` lists topics worth suggesting; empty means every section.
pub fn no_information_answer(available: &[Section]) -> String {
    let topics = if available.is_empty() {
        &Section::ALL[..]
    } else {
        available
    };
    let topics = topics
        .iter()
        .map(|s| s.as_str().replace('_', " "))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Não há informações sobre esse tema no currículo de Lucas. \
         Posso te contar sobre: {topics}. \
         Exemplos de perguntas: 'Qual a formação acadêmica?', \
         'Quais projetos ele já desenvolveu?', 'Quais certificações ele possui?'"
    )
}

fn field(item: &Value, key: &str) -> String {
    item.get(key).map(display).unwrap_or_default()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_academic_entries_one_line_each() {
        let data = BTreeMap::from([(
            Section::AcademicBackground,
            json!([
                {"degree": "Engenharia de Computação", "school": "UFSC", "year": 2021},
                {"degree": "Técnico", "school": "IFSC"}
            ]),
        )]);
        assert_eq!(
            factual_summary(&data),
            "- Engenharia de Computação em UFSC (2021)\n- Técnico em IFSC ()"
        );
    }

    #[test]
    fn test_projects_limited_to_three() {
        let projects: Vec<Value> = (1..=5)
            .map(|i| json!({"name": format!("P{i}"), "description": format!("d{i}")}))
            .collect();
        let data = BTreeMap::from([(Section::Projects, Value::Array(projects))]);
        let summary = factual_summary(&data);
        assert_eq!(summary.lines().count(), 3);
        assert!(summary.starts_with("- Projeto: P1 - d1"));
        assert!(!summary.contains("P4"));
    }

    #[test]
    fn test_generic_list_object_and_scalar() {
        let data = BTreeMap::from([
            (Section::Skills, json!(["Rust", "Python", "SQL", "Docker", "K8s", "Go"])),
            (Section::Languages, json!({"Português": "nativo", "Inglês": "fluente"})),
            (Section::SoftSkills, json!("Comunicação")),
        ]);
        assert_eq!(
            factual_summary(&data),
            "- Skills: Rust, Python, SQL, Docker, K8s\n\
             - Soft skills: Comunicação\n\
             - Languages: Português: nativo, Inglês: fluente"
        );
    }

    #[test]
    fn test_empty_data_gives_empty_summary() {
        assert_eq!(factual_summary(&BTreeMap::new()), "");
    }

    #[test]
    fn test_fallback_answer_quotes_question() {
        let answer = fallback_answer("Onde estudou?", "- X em Y (2020)");
        assert!(answer.starts_with("Com base nas informações disponíveis:\n- X em Y (2020)"));
        assert!(answer.ends_with("Resposta à pergunta 'Onde estudou?': As informações estão disponíveis acima."));
    }

    #[test]
    fn test_no_information_lists_topics() {
        let answer = no_information_answer(&[Section::SoftSkills, Section::Projects]);
        assert!(answer.contains("Posso te contar sobre: soft skills, projects."));

        let all = no_information_answer(&[]);
        assert!(all.contains("academic background, professional experience"));
        assert!(all.contains("intelligent responses."));
    }
}
