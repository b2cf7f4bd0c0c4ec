//! Variable code dictionary (`DATA.CDE`)
//!
//! The dictionary file lists one variable per line:
//!
//! ```text
//! @CDE     LABEL                DESCRIPTION
//! HWAM     Yield at harvest     Yield at harvest maturity (kg [dm]/ha)
//! ```
//!
//! Columns after the code are separated by runs of two or more spaces.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{Result, SimObsError};
use crate::parsers::fields::{is_blank, is_comment_line, is_header_line, is_title_line};

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid column gap pattern"));

/// One dictionary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    pub cde: String,
    pub label: String,
    pub description: String,
}

/// Source of variable labels
pub trait CodeDictionary: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<Vec<CodeEntry>>;

    /// Entries keyed by upper-cased code; a failing dictionary yields an empty map
    fn index(&self) -> HashMap<String, CodeEntry> {
        match self.load() {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.cde.to_uppercase(), entry))
                .collect(),
            Err(e) => {
                warn!("Code dictionary unavailable, using raw codes: {}", e);
                HashMap::new()
            }
        }
    }
}

/// Dictionary without entries
#[derive(Debug, Default, Clone)]
pub struct EmptyCodeDictionary;

impl CodeDictionary for EmptyCodeDictionary {
    fn load(&self) -> Result<Vec<CodeEntry>> {
        Ok(Vec::new())
    }
}

/// Dictionary read from a `DATA.CDE` file on every load
#[derive(Debug, Clone)]
pub struct CdeFileDictionary {
    path: PathBuf,
}

impl CdeFileDictionary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CodeDictionary for CdeFileDictionary {
    fn load(&self) -> Result<Vec<CodeEntry>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SimObsError::unreadable(&self.path, e))?;
        let entries = parse_cde(&content);
        debug!(
            "Loaded {} variable codes from {}",
            entries.len(),
            self.path.display()
        );
        Ok(entries)
    }
}

/// Parse dictionary text into entries, skipping lines without a label
pub fn parse_cde(content: &str) -> Vec<CodeEntry> {
    content
        .lines()
        .filter(|line| {
            !is_blank(line) && !is_title_line(line) && !is_header_line(line) && !is_comment_line(line)
        })
        .filter_map(parse_cde_line)
        .collect()
}

fn parse_cde_line(line: &str) -> Option<CodeEntry> {
    let (cde, rest) = line.trim().split_once(char::is_whitespace)?;
    let mut columns = COLUMN_GAP.splitn(rest.trim(), 2);
    let label = columns.next()?.trim().to_string();
    if label.is_empty() {
        return None;
    }

    let remainder = columns.next().unwrap_or_default().trim();
    let mut description = strip_repeated_label(remainder, &label).to_string();
    if description.is_empty() || description == "." {
        description = label.clone();
    }

    Some(CodeEntry {
        cde: cde.to_string(),
        label,
        description,
    })
}

/// Drop a leading copy of `label` when it is a column of its own
///
/// `Yield at harvest maturity` keeps its words; `Tops weight  Tops weight at
/// maturity` loses the first column.
fn strip_repeated_label<'a>(description: &'a str, label: &str) -> &'a str {
    match description.strip_prefix(label) {
        Some("") => "",
        Some(after) if COLUMN_GAP.find(after).is_some_and(|gap| gap.start() == 0) => after.trim(),
        _ => description,
    }
}
