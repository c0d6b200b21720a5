//! Export of the current filtered view as a delimited text table. Pure
//! formatting; carries no orchestration logic.

use std::path::{Path, PathBuf};

use crate::storage::{AtomicFileWriter, StoreError};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_filename: String,
    /// Descriptions are collapsed to one line and truncated to this many
    /// characters.
    pub description_limit: usize,
    /// Wall-clock stamp written into the header; injected by the caller.
    pub generated_at: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_filename: "scout_export.tsv".to_string(),
            description_limit: 80,
            generated_at: String::new(),
        }
    }
}

/// One row of the filtered view, already flattened for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub seq: u64,
    pub external_id: Option<String>,
    pub title: String,
    pub handle: Option<String>,
    pub kind: String,
    pub member_count: u64,
    pub description: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub row_count: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

const COLUMNS: [&str; 9] = [
    "seq",
    "external_id",
    "title",
    "handle",
    "kind",
    "members",
    "description",
    "link",
    "source",
];

pub fn write_table(
    dir: &Path,
    rows: &[ExportRow],
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let mut buffer = String::new();
    buffer.push_str(&format!("# generated {}\n", options.generated_at));
    buffer.push_str(&COLUMNS.join("\t"));
    buffer.push('\n');

    for row in rows {
        let link = row
            .handle
            .as_deref()
            .map(|handle| format!("https://t.me/{handle}"))
            .unwrap_or_default();
        let fields = [
            row.seq.to_string(),
            row.external_id.clone().unwrap_or_default(),
            sanitize(&row.title),
            row.handle.clone().unwrap_or_default(),
            row.kind.clone(),
            row.member_count.to_string(),
            truncate(&sanitize(&row.description), options.description_limit),
            link,
            sanitize(&row.source),
        ];
        buffer.push_str(&fields.join("\t"));
        buffer.push('\n');
    }

    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let output_path = writer.write(&options.output_filename, &buffer)?;

    Ok(ExportSummary {
        row_count: rows.len(),
        output_path,
    })
}

/// Collapse whitespace runs so embedded newlines/tabs cannot break the
/// table shape.
fn sanitize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{cut}...")
}
