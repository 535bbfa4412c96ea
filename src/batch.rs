use crate::error::ParseError;
use crate::parser::parse_python;
use crate::refactor::refactor_tree;
use crate::render::SourceRenderer;
use crate::types::RefactorResult;
use rayon::prelude::*;
use serde_json::json;
use std::fmt;
use std::fs;
use std::path::PathBuf;

// ── per-file result ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file parsed; the result says whether the loop was rewritten.
    Refactored(RefactorResult),
    SyntaxError(ParseError),
    /// The file could not be read as UTF-8 text.
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub outcome: Outcome,
}

impl FileReport {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, Outcome::Refactored(r) if r.succeeded())
    }

    /// One entry of the `--json` `results` array.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.outcome {
            Outcome::Refactored(result) => {
                let mut value = result.to_json();
                if let Some(map) = value.as_object_mut() {
                    map.insert("file".to_string(), json!(self.file));
                }
                value
            }
            Outcome::SyntaxError(e) => json!({
                "file":          self.file,
                "succeeded":     false,
                "error_message": format!("syntax error at {e}"),
            }),
            Outcome::Unreadable(reason) => json!({
                "file":          self.file,
                "succeeded":     false,
                "error_message": format!("failed to read: {reason}"),
            }),
        }
    }
}

/// `path: <comprehension>`, `path: <reason>`, `path:line:col: syntax error: …`
/// or `path: failed to read: …`.
impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Refactored(result) => {
                write!(f, "{}: {}", self.file, result.to_string().trim_end())
            }
            Outcome::SyntaxError(e) => write!(
                f,
                "{}:{}:{}: syntax error: {}",
                self.file, e.line, e.col, e.message
            ),
            Outcome::Unreadable(reason) => write!(f, "{}: failed to read: {reason}", self.file),
        }
    }
}

// ── public entry points ──────────────────────────────────────────────────────

/// Refactor every file in parallel.  Reports come back sorted by path.
///
/// A file that cannot be read gets an [`Outcome::Unreadable`] report; the
/// other files are still processed.
pub fn refactor_files(files: &[PathBuf]) -> Vec<FileReport> {
    let mut reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let file = path.to_string_lossy();
            match fs::read_to_string(path) {
                Ok(source) => refactor_source(&file, &source),
                Err(e) => {
                    tracing::warn!(file = %file, error = %e, "skipping unreadable file");
                    FileReport {
                        file: file.into_owned(),
                        outcome: Outcome::Unreadable(e.to_string()),
                    }
                }
            }
        })
        .collect();

    reports.sort_by(|a, b| a.file.cmp(&b.file));
    reports
}

/// Refactor one in-memory source, labelled `file` in the report.
pub fn refactor_source(file: &str, source: &str) -> FileReport {
    let outcome = match parse_python(source, file) {
        Ok(tree) => Outcome::Refactored(refactor_tree(&tree, &SourceRenderer)),
        Err(e) => Outcome::SyntaxError(e),
    };
    let report = FileReport {
        file: file.to_string(),
        outcome,
    };
    tracing::debug!(file, succeeded = report.succeeded(), "refactored");
    report
}

// ── Tests ─────────────────────────────────────────────────────────────────────
