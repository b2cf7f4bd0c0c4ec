//! Command-line interface components.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SimObsConfig;
use crate::error::Result;
use crate::models::Crop;

#[derive(Parser, Debug)]
#[command(name = "dssat-simobs")]
#[command(about = "Reconcile DSSAT simulation outputs with field observations")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// DSSAT installation folder holding one sub-folder per crop
    #[arg(short, long, global = true, value_name = "PATH")]
    pub base_path: Option<PathBuf>,

    /// Config file (defaults to the user config dir when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Evaluation output to merge instead of Evaluate.OUT
    #[arg(long, global = true, value_name = "NAME")]
    pub evaluate_file: Option<String>,

    /// Variable code dictionary (DATA.CDE) used for labels
    #[arg(long, global = true, value_name = "FILE")]
    pub cde: Option<PathBuf>,

    /// Do not read treatment names from experiment files
    #[arg(long, global = true)]
    pub no_treatment_names: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merge a simulation output with the evaluation and observation files of its experiment
    Merge {
        /// Crop folder name, e.g. Maize
        crop: String,
        /// Simulation output file, e.g. PlantGro.OUT
        out_file: String,
    },
    /// Merge, then report observed vs simulated agreement per variable
    Stats {
        /// Crop folder name, e.g. Maize
        crop: String,
        /// Simulation output file, e.g. PlantGro.OUT
        out_file: String,
    },
    /// List the simulation and evaluation outputs of a crop
    Outfiles { crop: String },
    /// Parse an evaluation output
    Evaluate { crop: String, file: String },
    /// Parse a daily observation (T) file
    Tfile { crop: String, file: String },
    /// Parse a simulation output
    Out { crop: String, file: String },
}

impl Command {
    pub fn crop(&self) -> Result<Crop> {
        let name = match self {
            Command::Merge { crop, .. }
            | Command::Stats { crop, .. }
            | Command::Outfiles { crop }
            | Command::Evaluate { crop, .. }
            | Command::Tfile { crop, .. }
            | Command::Out { crop, .. } => crop,
        };
        Crop::parse(name)
    }
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Command-line settings win over file and environment
    pub fn apply_overrides(&self, config: &mut SimObsConfig) {
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(name) = &self.evaluate_file {
            config.evaluate_file_name = name.clone();
        }
        if let Some(cde) = &self.cde {
            config.code_dictionary_path = Some(cde.clone());
        }
        if self.no_treatment_names {
            config.treatment_metadata = false;
        }
    }
}
