//! Interview flow driver
//!
//! Runs the configured sections in order against the speech-turn
//! orchestrator. A failing section never aborts the interview; it is
//! recorded and the next section runs.

use crate::config::InterviewPlan;
use crate::dialogue::{AnswerOutcome, SpeechTurn};
use crate::llm::{ChatClient, ChatMessage};
use crate::{QuestionBank, Result, Section};

use super::report::{QaRecord, ReportWriter};

/// Placeholder answer recorded when no speech was detected
const NO_ANSWER: &str = "(no answer)";

/// Outcome of a full interview run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Sections that completed
    pub completed: Vec<Section>,
    /// Sections that failed with the failure message
    pub failed: Vec<(Section, String)>,
}

/// Drives a complete interview
pub struct InterviewRunner {
    plan: InterviewPlan,
    orchestrator: SpeechTurn,
    chat: Option<ChatClient>,
    bank: QuestionBank,
    report: ReportWriter,
}

impl InterviewRunner {
    /// Create a runner
    ///
    /// The chat client is optional; without it the reverse-question section
    /// records the candidate's question without a spoken reply.
    pub fn new(
        plan: InterviewPlan,
        orchestrator: SpeechTurn,
        chat: Option<ChatClient>,
        bank: QuestionBank,
        report: ReportWriter,
    ) -> Self {
        Self {
            plan,
            orchestrator,
            chat,
            bank,
            report,
        }
    }

    /// Run every configured section in order
    ///
    /// # Errors
    ///
    /// Only configuration-level failures surface here; per-section failures
    /// are collected in the summary
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for &section in &self.plan.sections {
            tracing::info!(section = %section, "starting section");

            match self.run_section(section).await {
                Ok(()) => summary.completed.push(section),
                Err(e) => {
                    tracing::error!(section = %section, error = %e, "section failed, continuing");
                    summary.failed.push((section, e.to_string()));
                }
            }
        }

        tracing::info!(
            completed = summary.completed.len(),
            failed = summary.failed.len(),
            report = %self.report.path().display(),
            "interview finished"
        );
        Ok(summary)
    }

    async fn run_section(&self, section: Section) -> Result<()> {
        match section {
            Section::SelfIntroduction => self.run_self_introduction().await,
            Section::ReverseQuestion => self.run_reverse_questions().await,
            _ => self.run_question_section(section).await,
        }
    }

    /// Opening section: greeting plus self-introduction prompt
    async fn run_self_introduction(&self) -> Result<()> {
        let opening = opening_line(&self.plan);
        let outcome = self.orchestrator.ask_and_collect(&opening).await?;
        self.record(Section::SelfIntroduction, vec![qa(&opening, &outcome)])
    }

    /// Bank-driven section: ask each configured question in turn
    async fn run_question_section(&self, section: Section) -> Result<()> {
        let questions = self
            .bank
            .questions_for(section, section.default_question_count());
        if questions.is_empty() {
            tracing::warn!(section = %section, "no questions in bank, skipping");
            return Ok(());
        }

        let mut records = Vec::new();
        for question in questions {
            let outcome = self.orchestrator.ask_and_collect(&question).await?;
            records.push(qa(&question, &outcome));
        }

        self.record(section, records)
    }

    /// Closing section: the candidate asks, the interviewer answers with a
    /// streamed spoken reply
    async fn run_reverse_questions(&self) -> Result<()> {
        let invite = "That is all from my side. Do you have any questions for us?";
        let outcome = self.orchestrator.ask_and_collect(invite).await?;

        let mut records = vec![qa(invite, &outcome)];

        if let (Some(question), Some(chat)) = (outcome.text(), self.chat.as_ref()) {
            let messages = [
                ChatMessage::system(&reverse_prompt(&self.plan)),
                ChatMessage::user(&question),
            ];
            let tokens = chat.stream_completion(&messages).await?;
            let (reply, followup) = self.orchestrator.stream_and_collect(tokens).await?;

            records.push(QaRecord {
                question: reply,
                answer: followup.text().unwrap_or_else(|| NO_ANSWER.to_string()),
            });
        }

        self.record(Section::ReverseQuestion, records)
    }

    fn record(&self, section: Section, records: Vec<QaRecord>) -> Result<()> {
        self.report.upsert_section(section, &records)
    }
}

fn qa(question: &str, outcome: &AnswerOutcome) -> QaRecord {
    QaRecord {
        question: question.to_string(),
        answer: outcome.text().unwrap_or_else(|| NO_ANSWER.to_string()),
    }
}

/// Build the opening line from the interview plan
#[must_use]
pub fn opening_line(plan: &InterviewPlan) -> String {
    match (&plan.candidate_name, plan.strict_mode) {
        (Some(name), true) => format!(
            "Hello, {name}. This will be a rigorous interview covering your professional \
             depth and composure. Please begin your self-introduction, one minute at most."
        ),
        (Some(name), false) => format!(
            "Hello, {name}. I am your interviewer today. Welcome, and please begin your \
             self-introduction."
        ),
        (None, true) => "Hello. This will be a rigorous interview covering your professional \
                         depth and composure. Please begin your self-introduction, one minute \
                         at most."
            .to_string(),
        (None, false) => "Hello, I am your interviewer today. Welcome, and please begin your \
                          self-introduction."
            .to_string(),
    }
}

/// System prompt for answering the candidate's reverse questions
fn reverse_prompt(plan: &InterviewPlan) -> String {
    let company = plan.company.as_deref().unwrap_or("our company");
    format!(
        "You are an interviewer at {company} wrapping up an interview for the {} position. \
         Answer the candidate's question briefly and honestly in a conversational tone.",
        plan.position
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::InterviewPlan;

    fn plan(name: Option<&str>, strict: bool) -> InterviewPlan {
        InterviewPlan {
            candidate_name: name.map(String::from),
            position: "backend engineer".to_string(),
            company: None,
            tech_domain: None,
            strict_mode: strict,
            sections: Section::default_order(),
            questions_file: PathBuf::from("questions.json"),
            report_file: PathBuf::from("QA.md"),
        }
    }

    #[test]
    fn opening_line_uses_name_and_mode() {
        let line = opening_line(&plan(Some("Ada"), false));
        assert!(line.contains("Ada"));
        assert!(!line.contains("rigorous"));

        let line = opening_line(&plan(Some("Ada"), true));
        assert!(line.contains("Ada"));
        assert!(line.contains("rigorous"));

        let line = opening_line(&plan(None, false));
        assert!(line.contains("interviewer today"));
    }
}
