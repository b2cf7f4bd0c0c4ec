//! DSSAT sim-vs-obs library
//!
//! Reads the fixed-format text files of the DSSAT crop model and reconciles
//! simulated and observed values into one record per treatment.
//!
//! This library provides tools for:
//! - Decoding the model's `YEAR`/`DOY` and packed `YYDDD` dates
//! - Parsing simulation outputs, evaluation outputs and observation (T/A) files
//! - Resolving treatment identity across those sources
//! - Merging everything for one simulation output, reporting unmatched treatments
//! - Agreement statistics between observed and simulated values
//!
//! ```no_run
//! use dssat_simobs::{Crop, SimObsConfig, SimVsObsMerger};
//!
//! # async fn example() -> dssat_simobs::Result<()> {
//! let config = SimObsConfig::default().with_base_path("/opt/dssat");
//! let outcome = SimVsObsMerger::from_config(config)
//!     .merge(&Crop::Maize, "PlantGro.OUT")
//!     .await?;
//! println!("{} treatments", outcome.records.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod date_codec;
pub mod discovery;
pub mod error;
pub mod merger;
pub mod models;
pub mod parsers;
pub mod stats;

pub use config::SimObsConfig;
pub use error::{Result, SimObsError};
pub use merger::{IdentityMismatch, MergeOutcome, SimVsObsMerger};
pub use models::{AxisPoint, Crop, MeasuredValue, Reading, SourceKind, TreatmentRun, VariableSeries};
