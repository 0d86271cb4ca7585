//! Résumé data store. One JSON document per section under the data directory,
//! read on first use and kept in memory afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::Section;

pub struct ResumeStore {
    data_dir: PathBuf,
    loaded: RwLock<HashMap<Section, Value>>,
}

impl ResumeStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the requested sections that could be loaded. Missing or
    /// malformed files are logged and left out.
    pub fn fetch_sections<'a>(
        &self,
        sections: impl IntoIterator<Item = &'a Section>,
    ) -> BTreeMap<Section, Value> {
        sections
            .into_iter()
            .filter_map(|section| self.section(*section).map(|value| (*section, value)))
            .collect()
    }

    pub fn section(&self, section: Section) -> Option<Value> {
        {
            let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(value) = loaded.get(&section) {
                return Some(value.clone());
            }
        }

        let value = self.read_section(section)?;
        let mut loaded = self.loaded.write().unwrap_or_else(PoisonError::into_inner);
        Some(loaded.entry(section).or_insert(value).clone())
    }

    /// Sections read so far, in canonical order.
    pub fn loaded_sections(&self) -> Vec<Section> {
        let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
        let mut sections: Vec<Section> = loaded.keys().copied().collect();
        sections.sort();
        sections
    }

    fn read_section(&self, section: Section) -> Option<Value> {
        let path = self.data_dir.join(format!("{}.json", section.as_str()));
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Résumé section not readable");
                return None;
            }
        };

        let mut document: Value = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Résumé section is not valid JSON");
                return None;
            }
        };

        debug!(section = %section, "Loaded résumé section");
        // Section files usually wrap their payload in a key named after the section.
        match document.get_mut(section.as_str()) {
            Some(inner) => Some(inner.take()),
            None => Some(document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(files: &[(&str, &str)]) -> (ResumeStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        (ResumeStore::new(dir.path()), dir)
    }

    #[test]
    fn test_unwraps_key_named_after_section() {
        let (store, _dir) = store_with(&[("skills.json", r#"{"skills": ["Rust", "Python"]}"#)]);
        assert_eq!(store.section(Section::Skills), Some(json!(["Rust", "Python"])));
    }

    #[test]
    fn test_returns_whole_document_without_wrapper_key() {
        let (store, _dir) = store_with(&[("languages.json", r#"{"portuguese": "native"}"#)]);
        assert_eq!(
            store.section(Section::Languages),
            Some(json!({"portuguese": "native"}))
        );
    }

    #[test]
    fn test_fetch_sections_omits_missing_and_malformed() {
        let (store, _dir) = store_with(&[
            ("skills.json", r#"{"skills": ["Rust"]}"#),
            ("projects.json", "{ broken"),
        ]);
        let fetched = store.fetch_sections(&[
            Section::Skills,
            Section::Projects,
            Section::Certifications,
        ]);
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[&Section::Skills], json!(["Rust"]));
    }

    #[test]
    fn test_sections_are_memoized() {
        let (store, dir) = store_with(&[("skills.json", r#"{"skills": ["Rust"]}"#)]);
        store.section(Section::Skills);
        fs::remove_file(dir.path().join("skills.json")).unwrap();

        assert_eq!(store.section(Section::Skills), Some(json!(["Rust"])));
        assert_eq!(store.loaded_sections(), vec![Section::Skills]);
    }

    #[test]
    fn test_missing_section_is_retried_later() {
        let (store, dir) = store_with(&[]);
        assert!(store.section(Section::Projects).is_none());
        fs::write(dir.path().join("projects.json"), r#"{"projects": []}"#).unwrap();
        assert_eq!(store.section(Section::Projects), Some(json!([])));
    }
}
