//! Application constants for the sim-vs-obs reconciler
//!
//! File conventions, line markers and column names shared by the parsers.

// =============================================================================
// Missing Values
// =============================================================================

/// Sentinel written by the crop model for "not recorded"
pub const MISSING_VALUE: &str = "-99";

// =============================================================================
// Line Markers
// =============================================================================

/// Column header lines start with this marker
pub const HEADER_MARKER: char = '@';

/// Section titles
pub const TITLE_MARKER: char = '*';

/// Comment lines in observation files
pub const COMMENT_MARKER: char = '!';

/// Metadata keywords that appear inside data blocks of simulation outputs
pub const TREATMENT_KEYWORD: &str = "TREATMENT";
pub const EXPERIMENT_KEYWORD: &str = "EXPERIMENT";
pub const MODEL_KEYWORD: &str = "MODEL";
pub const DATA_PATH_KEYWORD: &str = "DATA PATH";

/// All metadata keywords that disqualify a line from being a data row
pub const METADATA_KEYWORDS: &[&str] = &[
    MODEL_KEYWORD,
    EXPERIMENT_KEYWORD,
    DATA_PATH_KEYWORD,
    TREATMENT_KEYWORD,
];

/// Column where the experiment code starts on an EXPERIMENT line
/// (` EXPERIMENT     : UFGA8201 MZ ...`)
pub const EXPERIMENT_CODE_OFFSET: usize = 18;

// =============================================================================
// Column Names
// =============================================================================

pub const YEAR_COLUMN: &str = "YEAR";
pub const DOY_COLUMN: &str = "DOY";
pub const DAS_COLUMN: &str = "DAS";
pub const DAP_COLUMN: &str = "DAP";
pub const DATE_COLUMN: &str = "DATE";
pub const TRNO_COLUMN: &str = "TRNO";
pub const EXCODE_COLUMN: &str = "EXCODE";

/// Simulation output columns that only drive the date axis
pub const AXIS_COLUMNS: &[&str] = &[YEAR_COLUMN, DOY_COLUMN, DAS_COLUMN, DAP_COLUMN];

// =============================================================================
// File Conventions
// =============================================================================

/// Extension of every simulation output file
pub const OUTPUT_FILE_EXT: &str = ".OUT";

/// Marker that identifies evaluation outputs among the simulation outputs
pub const EVALUATE_FILE_MARKER: &str = "evaluate";

/// Default evaluation file name inside a crop folder
pub const DEFAULT_EVALUATE_FILE: &str = "Evaluate.OUT";

/// Default installation folder of the crop model
pub const DEFAULT_BASE_PATH: &str = "C:/DSSAT48";

/// Separator between primary and secondary descriptors in synthesized run labels
pub const LABEL_SEPARATOR: &str = " – ";

/// Width of the TNAME field in experiment files
pub const TREATMENT_NAME_WIDTH: usize = 25;

// =============================================================================
// Environment
// =============================================================================

pub const ENV_BASE_PATH: &str = "DSSAT_SIMOBS_BASE_PATH";
pub const ENV_EVALUATE_FILE: &str = "DSSAT_SIMOBS_EVALUATE_FILE";
pub const ENV_CDE_PATH: &str = "DSSAT_SIMOBS_CDE_PATH";

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "dssat-simobs";
pub const CONFIG_FILE_NAME: &str = "config.toml";
