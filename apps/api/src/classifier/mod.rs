//! Relevance Classifier: maps a free-text question and a role to at most
//! three résumé sections.
//!
//! Precedence:
//! 1. context patterns (phrase regexes); any hit wins outright
//! 2. whole-word keywords, only when step 1 found nothing
//! 3. the role's priority list, only when steps 1 and 2 found nothing
//!
//! When more than [`MAX_SECTIONS`] were found, context matches survive first
//! (table order), then the role's priority order, then canonical order.
//!
//! No LLM calls, no shared mutable state. The compiled tables are built once
//! at startup and shared read-only.

pub mod tables;

use std::collections::{BTreeSet, HashMap};

use regex::Regex;
use tracing::debug;

use crate::models::Section;

pub const MAX_SECTIONS: usize = 3;

/// Distinct sections selected for a question. Ordering carries no meaning.
pub type SectionSet = BTreeSet<Section>;

/// Lower-cases and trims a question. Shared with the cache key derivation.
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

pub struct RelevanceClassifier {
    context_rules: Vec<(Section, Vec<Regex>)>,
    keyword_rules: Vec<(Section, Regex)>,
    role_priorities: HashMap<String, Vec<Section>>,
    default_priority: Vec<Section>,
}

impl RelevanceClassifier {
    /// Compiles the built-in tables. `role_priorities` comes from the role
    /// registry; roles missing from it use [`tables::DEFAULT_PRIORITY`].
    pub fn new(role_priorities: HashMap<String, Vec<Section>>) -> Result<Self, regex::Error> {
        Self::from_tables(
            tables::CONTEXT_PATTERNS,
            tables::KEYWORDS,
            role_priorities,
            tables::DEFAULT_PRIORITY.to_vec(),
        )
    }

    pub fn from_tables(
        context_patterns: &[(Section, &[&str])],
        keywords: &[(Section, &[&str])],
        role_priorities: HashMap<String, Vec<Section>>,
        default_priority: Vec<Section>,
    ) -> Result<Self, regex::Error> {
        let context_rules = context_patterns
            .iter()
            .map(|(section, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((*section, compiled))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let keyword_rules = keywords
            .iter()
            .filter(|(_, words)| !words.is_empty())
            .map(|(section, words)| {
                let alternation = words
                    .iter()
                    .map(|w| regex::escape(w))
                    .collect::<Vec<_>>()
                    .join("|");
                let re = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?;
                Ok((*section, re))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            context_rules,
            keyword_rules,
            role_priorities,
            default_priority,
        })
    }

    /// Never fails. May return an empty set when nothing matched and the
    /// role has no fallback list; callers treat that as "no grounding".
    pub fn identify_relevant_fields(&self, question: &str, role: &str) -> SectionSet {
        let normalized = normalize_question(question);
        let priority = self.priority_for(role);

        let contextual = self.context_matches(&normalized);
        let found = if !contextual.is_empty() {
            contextual.clone()
        } else {
            let keyword = self.keyword_matches(&normalized);
            if keyword.is_empty() {
                debug!(role, "No pattern or keyword match, using role priority");
                dedup(priority.to_vec())
            } else {
                keyword
            }
        };

        rank(found, &contextual, priority)
            .into_iter()
            .take(MAX_SECTIONS)
            .collect()
    }

    fn priority_for(&self, role: &str) -> &[Section] {
        self.role_priorities
            .get(role)
            .map(Vec::as_slice)
            .unwrap_or(self.default_priority.as_slice())
    }

    fn context_matches(&self, normalized: &str) -> Vec<Section> {
        dedup(
            self.context_rules
                .iter()
                .filter(|(_, patterns)| patterns.iter().any(|re| re.is_match(normalized)))
                .map(|(section, _)| *section)
                .collect(),
        )
    }

    fn keyword_matches(&self, normalized: &str) -> Vec<Section> {
        dedup(
            self.keyword_rules
                .iter()
                .filter(|(_, re)| re.is_match(normalized))
                .map(|(section, _)| *section)
                .collect(),
        )
    }
}

/// Orders `found` for truncation: context hits, then priority order, then
/// canonical order for anything left.
fn rank(found: Vec<Section>, contextual: &[Section], priority: &[Section]) -> Vec<Section> {
    let mut ranked: Vec<Section> = Vec::with_capacity(found.len());

    for section in contextual.iter().chain(priority) {
        if found.contains(section) && !ranked.contains(section) {
            ranked.push(*section);
        }
    }

    let mut leftovers: Vec<Section> = found
        .into_iter()
        .filter(|s| !ranked.contains(s))
        .collect();
    leftovers.sort();
    ranked.extend(leftovers);
    ranked
}

fn dedup(sections: Vec<Section>) -> Vec<Section> {
    let mut seen = Vec::with_capacity(sections.len());
    for section in sections {
        if !seen.contains(&section) {
            seen.push(section);
        }
    }
    seen
}
