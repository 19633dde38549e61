//! Pipe-delimited bulk user import.
//!
//! One user per line, `username|balance|warnings|bagage`. Fields are trimmed
//! and missing trailing fields take the new-record defaults. A line with more
//! than four fields, or without a username, is rejected and reported instead
//! of being written with holes in it.

use models::{NewUser, UserRecord};

const MAX_FIELDS: usize = 4;

/// One non-blank input line, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportLine {
    Valid { line: usize, record: UserRecord },
    Rejected { line: usize, raw: String, reason: String },
}

impl ImportLine {
    pub fn line(&self) -> usize {
        match self {
            ImportLine::Valid { line, .. } | ImportLine::Rejected { line, .. } => *line,
        }
    }
}

/// Parse import text. Blank lines are skipped; line numbers are 1-based
/// positions in the original text.
pub fn parse_import(text: &str) -> Vec<ImportLine> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, raw.trim()))
        .filter(|(_, raw)| !raw.is_empty())
        .map(|(line, raw)| parse_line(line, raw))
        .collect()
}

fn parse_line(line: usize, raw: &str) -> ImportLine {
    let fields: Vec<&str> = raw.split('|').map(str::trim).collect();
    let reject = |reason: String| ImportLine::Rejected { line, raw: raw.to_string(), reason };

    if fields.len() > MAX_FIELDS {
        return reject(format!("expected at most {MAX_FIELDS} fields, found {}", fields.len()));
    }
    let field = |i: usize| fields.get(i).map(|s| s.to_string());
    let input = NewUser {
        username: field(0).unwrap_or_default(),
        balance: field(1),
        warnings: field(2),
        bagage: field(3),
        // rank cannot be set through this format
        rank: None,
    };
    match UserRecord::normalize_new(input) {
        Ok(record) => ImportLine::Valid { line, record },
        Err(e) => reject(e.to_string()),
    }
}
