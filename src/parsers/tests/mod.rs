//! Tests for the file parsers
//!
//! Fixtures mirror the layouts written by the crop model, including the
//! irregular spacing and sentinel values found in real files.


/// Two-run simulation output with YEAR/DOY columns
pub const PLANT_GROWTH_OUT: &str = "\
$GROWTH ASPECTS OUTPUT FILE
*DSSAT Cropping System Model Ver. 4.8.0.000

*RUN   1        : RAINFED LOW NITROGEN       MZCER048 UFGA8201   1
 MODEL          : MZCER048 - Maize
 EXPERIMENT     : UFGA8201 MZ NITROGEN X IRRIGATION
 DATA PATH      :
 TREATMENT  1   : RAINFED LOW NITROGEN       MZCER048

@YEAR DOY   DAS   DAP   LAID   CWAD   HWAD
 1982  57     0     0   0.00      0    -99
 1982  58     1     1   0.01      5    -99
 1982  59     2     2   0.03     11      0

*RUN   2        : IRRIGATED HIGH NITROGEN    MZCER048 UFGA8201   2
 MODEL          : MZCER048 - Maize
 EXPERIMENT     : UFGA8201 MZ NITROGEN X IRRIGATION
 DATA PATH      :
 TREATMENT  2   : IRRIGATED HIGH NITROGEN    MZCER048

@YEAR DOY   DAS   DAP   LAID   CWAD   HWAD
 1982  57     0     0   0.00      0    -99
 1982  58     1     1   0.02      7    -99
";
