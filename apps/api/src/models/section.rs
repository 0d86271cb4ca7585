use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named topic of résumé data. Declaration order is the canonical order
/// used when a set of sections has to be serialized deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    AcademicBackground,
    ProfessionalExperience,
    Projects,
    Skills,
    Certifications,
    SoftSkills,
    Languages,
    IntelligentResponses,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::AcademicBackground,
        Section::ProfessionalExperience,
        Section::Projects,
        Section::Skills,
        Section::Certifications,
        Section::SoftSkills,
        Section::Languages,
        Section::IntelligentResponses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::AcademicBackground => "academic_background",
            Section::ProfessionalExperience => "professional_experience",
            Section::Projects => "projects",
            Section::Skills => "skills",
            Section::Certifications => "certifications",
            Section::SoftSkills => "soft_skills",
            Section::Languages => "languages",
            Section::IntelligentResponses => "intelligent_responses",
        }
    }

    /// Human label used in factual summaries: `soft_skills` -> `Soft skills`.
    pub fn label(&self) -> String {
        let spaced = self.as_str().replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSection(pub String);

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section '{}'", self.0)
    }
}

impl std::error::Error for UnknownSection {}

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_matches_as_str() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>(), Ok(section));
        }
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!("technical_background".parse::<Section>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Section::SoftSkills).unwrap();
        assert_eq!(json, "\"soft_skills\"");
    }

    #[test]
    fn test_label_capitalizes_first_word() {
        assert_eq!(Section::ProfessionalExperience.label(), "Professional experience");
    }
}
