//! Role registry: the audience profiles ("recruiter", "developer", ...) that
//! shape the prompt and the classifier's fallback sections.
//!
//! Roles are read once from `<data_dir>/roles/*.json` at startup. A file whose
//! shape does not match [`RoleConfig`] is logged and skipped, so one broken
//! file never takes the service down.

pub mod handlers;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{RoleConfig, RoleSummary, Section};

pub const DEFAULT_ROLE: &str = "recruiter";

const REQUIRED_FIELDS: [&str; 5] = ["id", "name", "description", "icon", "color"];

pub struct RoleRegistry {
    /// Keyed by file stem. Sorted so listings are stable.
    roles: BTreeMap<String, RoleConfig>,
}

impl RoleRegistry {
    /// Loads every `*.json` file in `dir`. A missing directory yields an empty
    /// registry.
    pub fn load(dir: &Path) -> Self {
        let mut roles = BTreeMap::new();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Roles directory not readable");
                return Self { roles };
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(role_id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            match load_role_file(&path) {
                Ok(config) => {
                    debug!(role_id = %role_id, "Loaded role");
                    roles.insert(role_id, config);
                }
                Err(reason) => warn!(role_id = %role_id, reason = %reason, "Skipping invalid role file"),
            }
        }

        info!(count = roles.len(), "Role registry loaded");
        Self { roles }
    }

    #[cfg(test)]
    pub fn from_roles(roles: impl IntoIterator<Item = RoleConfig>) -> Self {
        Self {
            roles: roles.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn validate_role(&self, role_id: &str) -> bool {
        self.roles.contains_key(role_id)
    }

    /// Unknown ids resolve to the default role. `None` only when the default
    /// role itself is missing.
    pub fn get_role_config(&self, role_id: &str) -> Option<&RoleConfig> {
        self.roles
            .get(role_id)
            .or_else(|| self.roles.get(DEFAULT_ROLE))
    }

    /// Appends the role's prompt modifiers to `base`. Returns `base` unchanged
    /// if no role could be resolved.
    pub fn generate_role_prompt(&self, role_id: &str, base: &str) -> String {
        let Some(role) = self.get_role_config(role_id) else {
            warn!(role_id, "Role not found, using base prompt");
            return base.to_string();
        };
        let modifiers = &role.prompt_modifiers;

        let mut prompt = format!(
            "{base}\n\nCONTEXTO ESPECÍFICO PARA {}:\n{}\n\n",
            role.name.to_uppercase(),
            modifiers.prefix
        );

        for (heading, items) in [("FOQUE EM", &modifiers.emphasis), ("EVITE", &modifiers.avoid)] {
            if items.is_empty() {
                continue;
            }
            prompt.push_str(heading);
            prompt.push_str(":\n");
            for item in items {
                prompt.push_str("- ");
                prompt.push_str(item);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt
    }

    pub fn get_all_roles(&self) -> Vec<&RoleConfig> {
        self.roles.values().collect()
    }

    pub fn get_role_examples(&self, role_id: &str) -> Vec<String> {
        self.get_role_config(role_id)
            .map(|r| r.example_questions.clone())
            .unwrap_or_default()
    }

    /// Case-insensitive match on the display name.
    pub fn get_role_by_name(&self, name: &str) -> Option<&RoleConfig> {
        self.find_by_name(name).map(|(_, role)| role)
    }

    fn find_by_name(&self, name: &str) -> Option<(&String, &RoleConfig)> {
        let wanted = name.trim().to_lowercase();
        self.roles.iter().find(|(_, r)| r.name.to_lowercase() == wanted)
    }

    pub fn get_available_roles(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }

    pub fn get_role_summary(&self, role_id: &str) -> Option<RoleSummary> {
        self.get_role_config(role_id).map(RoleSummary::from)
    }

    /// Resolves a requested role to a registered id: exact id, then display
    /// name, then [`DEFAULT_ROLE`].
    pub fn resolve(&self, requested: &str) -> String {
        if self.validate_role(requested) {
            return requested.to_string();
        }
        if let Some((role_id, _)) = self.find_by_name(requested) {
            return role_id.clone();
        }
        DEFAULT_ROLE.to_string()
    }

    /// Role id → focus areas that name a known section, in file order.
    pub fn priorities(&self) -> HashMap<String, Vec<Section>> {
        self.roles
            .iter()
            .map(|(id, role)| {
                let sections = role
                    .focus_areas
                    .iter()
                    .filter_map(|area| match area.parse::<Section>() {
                        Ok(section) => Some(section),
                        Err(_) => {
                            debug!(role_id = %id, area = %area, "Focus area is not a section");
                            None
                        }
                    })
                    .collect();
                (id.clone(), sections)
            })
            .collect()
    }
}

/// Checks the raw document before deserializing so the log names the actual
/// problem instead of a serde position.
fn load_role_file(path: &Path) -> Result<RoleConfig, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| format!("invalid JSON: {e}"))?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| value.get(**f).is_none()) {
        return Err(format!("missing required field '{missing}'"));
    }
    if !value.get("focus_areas").is_some_and(Value::is_array) {
        return Err("focus_areas must be a list".to_string());
    }
    if !value.get("prompt_modifiers").is_some_and(Value::is_object) {
        return Err("prompt_modifiers must be an object".to_string());
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}
