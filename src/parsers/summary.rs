//! Final-value observation (A-file) parser
//!
//! ```text
//! *EXP. DATA (A): UFGA8201MZ NITROGEN X IRRIGATION
//! @TRNO  ADAT  MDAT  HWAM  CWAM
//!     1 82171 82227  8200 15633
//!     2 82171 82226   -99 16010
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::fields::{
    header_columns, is_blank, is_comment_line, is_header_line, is_title_line, tokens,
};
use crate::constants::TRNO_COLUMN;
use crate::error::{Result, SimObsError};
use crate::models::Reading;

/// Treatment number → variable code → measured value
pub type SummaryObservations = BTreeMap<String, BTreeMap<String, f64>>;

/// Parser for final-value observation files
#[derive(Debug, Default, Clone)]
pub struct SummaryObservationParser;

impl SummaryObservationParser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse an A-file; an unreadable file is an error
    pub async fn parse_file(&self, path: &Path) -> Result<SummaryObservations> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SimObsError::unreadable(path, e))?;

        let observations = self.parse_str(&content);
        info!(
            "Parsed final observations for {} treatments from {}",
            observations.len(),
            path.display()
        );
        Ok(observations)
    }

    /// Parse A-file text
    pub fn parse_str(&self, content: &str) -> SummaryObservations {
        let mut results = SummaryObservations::new();
        let mut headers: Vec<String> = Vec::new();

        for line in content.lines() {
            if is_blank(line) || is_title_line(line) || is_comment_line(line) {
                continue;
            }
            if is_header_line(line) {
                headers = header_columns(line);
                continue;
            }
            if headers.is_empty() {
                debug!("Summary row before header skipped: {}", line.trim());
                continue;
            }

            let values = tokens(line);
            let Some(trno) = values.first() else {
                continue;
            };

            let row = results.entry(trno.to_string()).or_default();
            for (header, token) in headers.iter().zip(values.iter()).skip(1) {
                if header.eq_ignore_ascii_case(TRNO_COLUMN) {
                    continue;
                }
                if let Reading::Present(value) = Reading::parse(token) {
                    row.insert(header.clone(), value);
                }
            }
        }

        results
    }
}
