// Process-wide constants for the commission engine.

/// Standard depth of the upline walk.
pub const DEFAULT_MAX_LEVELS: usize = 8;

/// Standard commission table, level -> fraction of the sale.
pub const DEFAULT_RATES: [(u32, f64); 8] = [
    (1, 0.02),
    (2, 0.015),
    (3, 0.01),
    (4, 0.005),
    (5, 0.005),
    (6, 0.003),
    (7, 0.002),
    (8, 0.002),
];

/// Downline display tree bounds
pub const DOWNLINE_MAX_DEPTH: usize = 8;
pub const DOWNLINE_MAX_CHILDREN: usize = 7;

/// Rates are stored as parts-per-million of the sale amount.
pub const RATE_SCALE: u64 = 1_000_000;
/// Money is stored in cents.
pub const CENTS_PER_UNIT: u64 = 100;

pub const CONFIG_PATH_ENV: &str = "REFERRAL_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/referral.toml";
pub const MAX_LEVELS_ENV: &str = "REFERRAL_MAX_LEVELS";
pub const STRICT_ENV: &str = "REFERRAL_STRICT";
pub const LOG_ENV: &str = "REFERRAL_LOG";
