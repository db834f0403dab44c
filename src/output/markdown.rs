//! Markdown digest generation
//!
//! This module writes a human-readable markdown copy of the latest digest,
//! next to the messages in the outbox.

use crate::output::traits::{Digest, OutputResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Writes the markdown digest to `output_path`, creating parent directories
pub fn write_markdown_digest(digest: &Digest, subject: &str, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_digest(digest, subject);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a digest as markdown
pub fn format_markdown_digest(digest: &Digest, subject: &str) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", subject));
    md.push_str(&format!(
        "- **Generated**: {}\n",
        digest.generated_at.to_rfc3339()
    ));
    md.push_str(&format!("- **Matches**: {}\n\n", digest.matches.len()));

    if digest.is_empty() {
        md.push_str("No new matching positions.\n");
        return md;
    }

    md.push_str("## Matches\n\n");
    md.push_str("| Score | Title | Company | Location | Link |\n");
    md.push_str("|-------|-------|---------|----------|------|\n");
    for scored in &digest.matches {
        let record = &scored.record;
        md.push_str(&format!(
            "| {:.2} | {} | {} | {} | [Apply]({}) |\n",
            scored.score,
            escape_cell(&record.title),
            escape_cell(&record.source),
            escape_cell(&record.location),
            record.url
        ));
    }
    md.push('\n');

    let mut by_source: BTreeMap<&str, usize> = BTreeMap::new();
    for scored in &digest.matches {
        *by_source.entry(scored.record.source.as_str()).or_default() += 1;
    }

    md.push_str("## By Company\n\n");
    md.push_str("| Company | Matches |\n");
    md.push_str("|---------|---------|\n");
    for (source, count) in by_source {
        md.push_str(&format!("| {} | {} |\n", escape_cell(source), count));
    }
    md.push('\n');

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
