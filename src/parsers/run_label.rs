//! Display names for observed treatments
//!
//! Names from the experiment file win. Without one, a label is synthesized
//! from the experiment descriptor of the observation file, e.g.
//! `UFGA8201MZ PIONEER & MCCURDY, N X IRRIG` becomes `Mccurdy – N X Irrig 1982 (2)`
//! for treatment 2.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::LABEL_SEPARATOR;
use crate::date_codec::expand_two_digit_year;

/// Leading site/year/crop code of an experiment descriptor
static SITE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{4}\d{2,4}[A-Za-z]{0,3}\s*").expect("valid site code pattern")
});

/// Two-digit trial year embedded in an experiment code
static CODE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{4}(\d{2})\d{2}").expect("valid code year pattern"));

static ROTATION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\band\b").expect("valid rotation word pattern"));

static ROTATION_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*&\s*|\s+and\s+").expect("valid rotation split pattern")
});

static HAS_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2,4}").expect("valid year pattern"));

/// Inputs for label synthesis of one treatment
#[derive(Debug, Clone, Copy)]
pub struct LabelContext<'a> {
    /// Experiment descriptor from the file header
    pub experiment: &'a str,
    /// Observation file name, used as a last resort for the trial year
    pub file_name: &'a str,
    /// Year of the first valid observation date
    pub year_from_dates: Option<i32>,
}

/// Label for a treatment: the metadata name when known, otherwise synthesized
pub fn run_label(treatment_number: &str, name: Option<&str>, context: LabelContext<'_>) -> String {
    let number = treatment_ordinal(treatment_number);
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{} ({})", smart_title_case(name), number),
        None => synthesize_label(number, context),
    }
}

/// Title-case tokens that are entirely upper case; mixed-case tokens are kept
pub fn smart_title_case(text: &str) -> String {
    text.split(' ')
        .map(|token| {
            if token.chars().any(char::is_alphabetic) && token == token.to_uppercase() {
                capitalize_words(&token.to_lowercase())
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case every character that starts a word
fn capitalize_words(text: &str) -> String {
    let mut previous_is_word = false;
    text.chars()
        .map(|c| {
            let is_word = c.is_alphanumeric() || c == '_';
            let mapped = if is_word && !previous_is_word {
                c.to_ascii_uppercase()
            } else {
                c
            };
            previous_is_word = is_word;
            mapped
        })
        .collect()
}

fn treatment_ordinal(treatment_number: &str) -> i64 {
    treatment_number.trim().parse().unwrap_or(0)
}

fn synthesize_label(number: i64, context: LabelContext<'_>) -> String {
    let descriptor = context.experiment.trim();
    let cleaned = SITE_CODE.replace(descriptor, "");
    let segments: Vec<&str> = cleaned
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    let primary = segments.first().copied().unwrap_or_default();
    let secondary = segments.get(1).copied().unwrap_or_default();

    let mut chosen = if primary.contains('&') || ROTATION_WORD.is_match(primary) {
        pick_rotation(primary, number)
    } else {
        primary.to_string()
    };
    if chosen.is_empty() && secondary.is_empty() {
        chosen = format!("Run {}", number);
    }

    let mut label = [smart_title_case(&chosen), smart_title_case(secondary)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR);

    let year = context
        .year_from_dates
        .or_else(|| year_from_code(descriptor))
        .or_else(|| year_from_code(context.file_name));
    if let Some(year) = year {
        if !HAS_YEAR.is_match(&label) {
            label = format!("{} {}", label, year).trim().to_string();
        }
    }

    format!("{} ({})", label, number)
}

/// Entry `(number - 1) mod count` of an `&`/`and` separated rotation
fn pick_rotation(primary: &str, number: i64) -> String {
    let parts: Vec<&str> = ROTATION_SPLIT
        .split(primary)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return String::new();
    }

    let index = if number >= 1 {
        ((number - 1) as usize) % parts.len()
    } else {
        0
    };
    parts[index].to_string()
}

fn year_from_code(text: &str) -> Option<i32> {
    let captures = CODE_YEAR.captures(text)?;
    let yy: i32 = captures.get(1)?.as_str().parse().ok()?;
    Some(expand_two_digit_year(yy))
}
