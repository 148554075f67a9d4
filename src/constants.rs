/// Mass of one soybean bushel, in kilograms.
pub const SOY_BUSHEL_KG: f64 = 27.2155;

/// Mass of one sack, in kilograms.
pub const SACK_KG: f64 = 60.0;

/// Bushels contained in one sack (~2.20462).
pub const BUSHELS_PER_SACK: f64 = SACK_KG / SOY_BUSHEL_KG;

/// Sacks contained in one metric ton (~16.6667).
pub const SACKS_PER_TON: f64 = 1000.0 / SACK_KG;

/// Metric tons contained in one soybean bushel.
pub const TONS_PER_BUSHEL: f64 = SOY_BUSHEL_KG / 1000.0;

/// Day-of-month sentinel for reference-month keys (YYYY-MM-30).
pub const REF_MONTH_DAY: u32 = 30;

/// Exchange month codes, indexed by calendar month (1-based).
pub const FUTURES_MONTH_CODES: [char; 12] =
    ['F', 'G', 'H', 'J', 'K', 'M', 'N', 'Q', 'U', 'V', 'X', 'Z'];

/// Commodity root for auto-derived soybean futures symbols.
pub const FUTURES_SYMBOL_ROOT: &str = "ZS";

/// Exchange suffix for auto-derived futures symbols.
pub const FUTURES_SYMBOL_SUFFIX: &str = ".CBT";

/// Marker value requesting symbol derivation from the reference month.
pub const AUTO_SYMBOL: &str = "AUTO";

/// Coverage above this is treated as fully locked.
pub const COVERAGE_FULL: f64 = 0.999999;

/// Coverage below this is treated as fully open.
pub const COVERAGE_NONE: f64 = 0.000001;

/// Denominators smaller than this are treated as zero.
pub const DIV_EPSILON: f64 = 1e-12;
