//! Markdown interview transcript
//!
//! Each section lives between `<!-- START: ... -->` / `<!-- END: ... -->`
//! markers so re-running a section replaces its block in place while the
//! rest of the file is preserved.

use std::path::PathBuf;

use crate::Result;

use super::Section;

/// One question/answer exchange
#[derive(Debug, Clone)]
pub struct QaRecord {
    /// What the interviewer asked (or said)
    pub question: String,
    /// The candidate's answer, or a placeholder when none was detected
    pub answer: String,
}

/// Writes the per-section interview transcript
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    /// Create a writer targeting the given Markdown file
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the report file
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Insert or replace a section block
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or written
    pub fn upsert_section(&self, section: Section, records: &[QaRecord]) -> Result<()> {
        let existing = if self.path.exists() {
            std::fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let block = render_section(section, records, &timestamp);
        let updated = upsert_block(&existing, section, &block);

        std::fs::write(&self.path, updated)?;
        tracing::debug!(path = %self.path.display(), section = %section, "report section written");
        Ok(())
    }

    /// Read the full report content
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn read(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Start marker for a section block
pub(crate) fn start_marker(section: Section) -> String {
    format!("<!-- START: {} -->", section.title())
}

/// End marker for a section block
pub(crate) fn end_marker(section: Section) -> String {
    format!("<!-- END: {} -->", section.title())
}

/// Extract a section block's inner content, if present
#[must_use]
pub(crate) fn extract_block(content: &str, section: Section) -> Option<&str> {
    let start = start_marker(section);
    let end = end_marker(section);

    let start_pos = content.find(&start)? + start.len();
    let end_pos = content[start_pos..].find(&end)? + start_pos;
    Some(&content[start_pos..end_pos])
}

/// Render a section block with markers
fn render_section(section: Section, records: &[QaRecord], timestamp: &str) -> String {
    let mut block = format!(
        "{}\n## {} - {}\n",
        start_marker(section),
        section.title(),
        timestamp
    );

    for record in records {
        block.push_str(&format!(
            "\n**Interviewer:**\n{}\n\n**Candidate:**\n{}\n",
            record.question.trim(),
            record.answer.trim()
        ));
    }

    block.push_str(&format!("\n{}", end_marker(section)));
    block
}

/// Replace an existing section block or append a new one
fn upsert_block(existing: &str, section: Section, block: &str) -> String {
    let start = start_marker(section);
    let end = end_marker(section);

    if let (Some(start_pos), Some(end_pos)) = (existing.find(&start), existing.find(&end)) {
        let after = end_pos + end.len();
        format!("{}{}{}", &existing[..start_pos], block, &existing[after..])
    } else if existing.is_empty() {
        block.to_string()
    } else {
        format!("{}\n\n{}", existing.trim_end(), block)
    }
}
