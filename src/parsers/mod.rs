//! Parsers for the crop model's fixed-format text files
//!
//! ## Architecture
//!
//! - [`simulation`] - simulation outputs (`*.OUT`), per-run simulated series
//! - [`evaluation`] - `Evaluate.OUT`, measured vs simulated end-of-season values
//! - [`time_series`] - daily observations (T-files)
//! - [`summary`] - final observations (A-files)
//! - [`run_label`] - display names for observed treatments
//! - [`fields`] - line classification and tokenizing shared by all parsers
//!
//! Every parser treats the `-99` sentinel and non-numeric cells as absent.

pub mod evaluation;
pub mod fields;
pub mod run_label;
pub mod simulation;
pub mod summary;
pub mod time_series;

#[cfg(test)]
pub mod tests;

pub use evaluation::{
    ColumnRole, CombinedValue, EvaluationOutput, EvaluationOutputParser, EvaluationRecord,
    KeyColumn,
};
pub use simulation::{SimulationOutputParser, SimulationRun};
pub use summary::{SummaryObservationParser, SummaryObservations};
pub use time_series::{TimeSeriesObservationParser, TimeSeriesRun};
