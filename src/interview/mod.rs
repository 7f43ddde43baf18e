//! Interview flow: question banks, section drivers, transcripts, scoring

mod questions;
mod report;
mod runner;
mod summary;

pub use questions::{QuestionBank, Section};
pub use report::{QaRecord, ReportWriter};
pub use runner::{InterviewRunner, RunSummary, opening_line};
pub use summary::{InterviewSummary, SectionScore, SummaryReport, section_weight};
