//! Interview sections and JSON question banks

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An interview section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Opening self-introduction
    SelfIntroduction,
    /// Resume deep-dive
    ResumeDigging,
    /// General ability assessment
    AbilityAssessment,
    /// Position-fit probing
    PositionMatching,
    /// Domain-specific technical questions
    ProfessionalSkills,
    /// Candidate asks, the interviewer answers
    ReverseQuestion,
}

impl Section {
    /// All sections in canonical order
    pub const ALL: [Self; 6] = [
        Self::SelfIntroduction,
        Self::ResumeDigging,
        Self::AbilityAssessment,
        Self::PositionMatching,
        Self::ProfessionalSkills,
        Self::ReverseQuestion,
    ];

    /// Stable identifier used in config files and question banks
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::SelfIntroduction => "self_introduction",
            Self::ResumeDigging => "resume_digging",
            Self::AbilityAssessment => "ability_assessment",
            Self::PositionMatching => "position_matching",
            Self::ProfessionalSkills => "professional_skills",
            Self::ReverseQuestion => "reverse_question",
        }
    }

    /// Human-readable title used in reports
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SelfIntroduction => "Self Introduction",
            Self::ResumeDigging => "Resume Deep-Dive",
            Self::AbilityAssessment => "Ability Assessment",
            Self::PositionMatching => "Position Matching",
            Self::ProfessionalSkills => "Professional Skills",
            Self::ReverseQuestion => "Reverse Questions",
        }
    }

    /// Questions asked per section by default
    #[must_use]
    pub const fn default_question_count(self) -> usize {
        match self {
            Self::ProfessionalSkills => 3,
            Self::SelfIntroduction | Self::ReverseQuestion => 1,
            _ => 2,
        }
    }

    /// Parse a section from its identifier
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == name)
    }

    /// Default section order for a full interview
    #[must_use]
    pub fn default_order() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Question bank loaded from a JSON file
///
/// The file maps section identifiers to question lists:
///
/// ```json
/// { "ability_assessment": ["Tell me about a hard bug you fixed."] }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct QuestionBank {
    #[serde(flatten)]
    sections: HashMap<String, Vec<String>>,
}

impl QuestionBank {
    /// Load a question bank from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing or not valid JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::QuestionBank(format!("{}: {e}", path.display())))?;
        let bank: Self = serde_json::from_str(&content)
            .map_err(|e| Error::QuestionBank(format!("{}: {e}", path.display())))?;

        tracing::debug!(
            path = %path.display(),
            sections = bank.sections.len(),
            "question bank loaded"
        );
        Ok(bank)
    }

    /// Questions for a section, capped at `limit`
    #[must_use]
    pub fn questions_for(&self, section: Section, limit: usize) -> Vec<String> {
        self.sections
            .get(section.id())
            .map(|qs| qs.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the bank has any questions for a section
    #[must_use]
    pub fn has_section(&self, section: Section) -> bool {
        self.sections
            .get(section.id())
            .is_some_and(|qs| !qs.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_ids_round_trip() {
        for section in Section::ALL {
            assert_eq!(Section::parse(section.id()), Some(section));
        }
        assert_eq!(Section::parse("karaoke"), None);
    }

    #[test]
    fn question_counts() {
        assert_eq!(Section::ProfessionalSkills.default_question_count(), 3);
        assert_eq!(Section::AbilityAssessment.default_question_count(), 2);
        assert_eq!(Section::SelfIntroduction.default_question_count(), 1);
    }

    #[test]
    fn bank_lookup_caps_at_limit() {
        let json = serde_json::json!({
            "ability_assessment": ["q1", "q2", "q3"],
            "position_matching": []
        });
        let bank: QuestionBank = serde_json::from_value(json).unwrap();

        assert_eq!(
            bank.questions_for(Section::AbilityAssessment, 2),
            vec!["q1", "q2"]
        );
        assert!(bank.questions_for(Section::ProfessionalSkills, 3).is_empty());
        assert!(bank.has_section(Section::AbilityAssessment));
        assert!(!bank.has_section(Section::PositionMatching));
    }
}
