use serde::{Deserialize, Serialize};

/// Role definition loaded from `roles/<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    /// Section names in priority order. Kept as raw strings so role files can
    /// mention topics the classifier does not know yet.
    pub focus_areas: Vec<String>,
    pub prompt_modifiers: PromptModifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default)]
    pub example_questions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptModifiers {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub emphasis: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

/// Public view of a role, without prompt modifiers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub focus_areas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

impl From<&RoleConfig> for RoleSummary {
    fn from(role: &RoleConfig) -> Self {
        Self {
            id: role.id.clone(),
            name: role.name.clone(),
            description: role.description.clone(),
            icon: role.icon.clone(),
            color: role.color.clone(),
            focus_areas: role.focus_areas.clone(),
            tone: role.tone.clone(),
        }
    }
}
