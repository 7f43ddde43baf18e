//! Scored interview summary
//!
//! Each completed section is scored by the chat model, then combined into
//! a weighted total. Weights follow the interview's emphasis: deep-dive
//! and skills sections count double the opener.

use crate::llm::{ChatClient, ChatMessage};
use crate::{Result, Section};

use super::report;

/// Per-section weight in the total score
#[must_use]
pub const fn section_weight(section: Section) -> f64 {
    match section {
        Section::ResumeDigging | Section::ProfessionalSkills => 0.20,
        Section::AbilityAssessment => 0.15,
        Section::SelfIntroduction | Section::PositionMatching => 0.10,
        Section::ReverseQuestion => 0.05,
    }
}

/// One section's score and commentary
#[derive(Debug)]
pub struct SectionScore {
    /// Section scored
    pub section: Section,
    /// Score on a 0-100 scale
    pub score: f64,
    /// Model commentary
    pub commentary: String,
}

/// Complete scored summary
#[derive(Debug)]
pub struct SummaryReport {
    /// Per-section results, in canonical section order
    pub sections: Vec<SectionScore>,
    /// Weighted total on a 0-100 scale
    pub total: f64,
}

impl SummaryReport {
    /// Render the summary as Markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Interview Summary\n\n");
        md.push_str(&format!("**Weighted total: {:.1} / 100**\n\n", self.total));

        for entry in &self.sections {
            md.push_str(&format!(
                "## {} — {:.0}/100\n\n{}\n\n",
                entry.section.title(),
                entry.score,
                entry.commentary.trim()
            ));
        }
        md
    }
}

/// Scores interview transcripts
pub struct InterviewSummary {
    chat: ChatClient,
}

impl InterviewSummary {
    /// Create a summarizer
    #[must_use]
    pub const fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    /// Score every section present in the report
    ///
    /// # Errors
    ///
    /// Returns error if no section could be scored
    pub async fn score_report(&self, report_md: &str) -> Result<SummaryReport> {
        let mut sections = Vec::new();

        for section in Section::ALL {
            let Some(transcript) = report::extract_block(report_md, section) else {
                continue;
            };

            match self.score_section(section, transcript).await {
                Ok(entry) => sections.push(entry),
                Err(e) => {
                    tracing::warn!(section = %section, error = %e, "section scoring failed");
                }
            }
        }

        if sections.is_empty() {
            return Err(crate::Error::Chat("no sections could be scored".to_string()));
        }

        let total = weighted_total(&sections);
        Ok(SummaryReport { sections, total })
    }

    async fn score_section(&self, section: Section, transcript: &str) -> Result<SectionScore> {
        let messages = [
            ChatMessage::system(
                "You are an interview assessor. Score the exchange from 0 to 100 and explain \
                 briefly. Start your reply with the numeric score.",
            ),
            ChatMessage::user(&format!(
                "Section: {}\n\nTranscript:\n{transcript}",
                section.title()
            )),
        ];

        let reply = self.chat.complete(&messages).await?;
        let score = extract_score(&reply)
            .ok_or_else(|| crate::Error::Chat(format!("no score in reply: {reply}")))?;

        Ok(SectionScore {
            section,
            score,
            commentary: reply,
        })
    }
}

/// Weighted total over the sections present, renormalized so missing
/// sections do not drag the total down
fn weighted_total(sections: &[SectionScore]) -> f64 {
    let weight_sum: f64 = sections.iter().map(|s| section_weight(s.section)).sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = sections
        .iter()
        .map(|s| s.score * section_weight(s.section))
        .sum();
    weighted / weight_sum
}

/// Pull the first number out of the model's reply, clamped to 0-100
fn extract_score(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let tail = &text[start..];
    let end = tail
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(tail.len());

    tail[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .map(|s| s.clamp(0.0, 100.0))
}
