//! Line classification and tokenizing helpers shared by the file parsers

use crate::constants::{COMMENT_MARKER, HEADER_MARKER, METADATA_KEYWORDS, TITLE_MARKER};

/// Whitespace-delimited tokens of a line, empties dropped
pub fn tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Column names of an `@` header line with the leading marker trimmed
pub fn header_columns(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches(HEADER_MARKER)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn is_header_line(line: &str) -> bool {
    line.trim_start().starts_with(HEADER_MARKER)
}

pub fn is_title_line(line: &str) -> bool {
    line.trim_start().starts_with(TITLE_MARKER)
}

pub fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Lines naming the model, experiment, data path or treatment are never data
pub fn is_metadata_line(line: &str) -> bool {
    METADATA_KEYWORDS
        .iter()
        .any(|keyword| line.contains(keyword))
}

/// Position of a column in a header list
pub fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_columns() {
        assert_eq!(
            header_columns("@YEAR DOY   DAS  LAID"),
            vec!["YEAR", "DOY", "DAS", "LAID"]
        );
        assert_eq!(header_columns("  @TRNO DATE"), vec!["TRNO", "DATE"]);
        assert!(header_columns("@").is_empty());
    }

    #[test]
    fn test_line_classification() {
        assert!(is_metadata_line(" TREATMENT  1   : RAINFED"));
        assert!(is_metadata_line(" DATA PATH      : "));
        assert!(!is_metadata_line(" 1982 166   0  0.00"));
        assert!(is_title_line("*GROWTH ASPECTS OUTPUT FILE"));
        assert!(is_comment_line("! measured LAI"));
        assert!(is_blank("   "));
        assert!(is_header_line("@TRNO DATE"));
    }
}
