//! Tests for the sim-vs-obs merge
//!
//! Fixtures describe one Maize experiment (`UFGA8201`, two treatments) laid
//! out the way the crop model writes its files.

pub mod merge_tests;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PLANT_GRO: &str = "\
*DSSAT Cropping System Model Ver. 4.8.0.000

*RUN   1        : RAINFED LOW NITROGEN       MZCER048 UFGA8201   1
 MODEL          : MZCER048 - Maize
 EXPERIMENT     : UFGA8201 MZ NITROGEN X IRRIGATION
 TREATMENT  1   : RAINFED LOW NITROGEN       MZCER048

@YEAR DOY   DAS   DAP   LAID   CWAD
 1982 166    0     0   0.30    500
 1982 180    1     1   1.10    850

*RUN   2        : IRRIGATED HIGH NITROGEN    MZCER048 UFGA8201   2
 MODEL          : MZCER048 - Maize
 EXPERIMENT     : UFGA8201 MZ NITROGEN X IRRIGATION
 TREATMENT  2   : IRRIGATED HIGH NITROGEN    MZCER048

@YEAR DOY   DAS   DAP   LAID   CWAD
 1982 166    0     0   0.40    520
";

pub const EVALUATE: &str = "\
*EVALUATION : UFGA8201MZ NITROGEN X IRRIGATION

@RUN EXCODE        TRNO RN CR   HWAMS   HWAMM   LAIXS  LAIXM
   1 UFGA8201MZ       1  0 MZ    7895    8200    3.12    -99
   2 UFGA8201MZ       2  0 MZ    9012    9441    3.55   3.70
   3 UFGA8201MZ       3  0 MZ    6000    6100    2.00   2.10
   4 KSAS8101WH       1  0 WH    3000    3100    1.00   1.10
";

pub const T_FILE: &str = "\
*EXP. DATA (T): UFGA8201MZ NITROGEN X IRRIGATION

@TRNO DATE  LAID  CWAD
    1 82180  1.20   896
    1 82166  0.35   -99
    2 82166  0.41   310
";

pub const A_FILE: &str = "\
*EXP. DATA (A): UFGA8201MZ NITROGEN X IRRIGATION

@TRNO  HWAM  MDAT
    1  8250 82227
    2   -99 82226
";

/// Base directory with a `Maize` folder holding the given files
pub fn crop_folder_with(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let folder = temp_dir.path().join("Maize");
    fs::create_dir_all(&folder).unwrap();
    for (name, content) in files {
        fs::write(folder.join(name), content).unwrap();
    }
    (temp_dir, folder)
}
