//! Chain-wide integer constants. These are part of the consensus parameter set
//! and must be chosen to match the chain the subsystem is deployed against; the
//! values here are the conventional defaults used by chains of this shape.

/// Fixed-point precision for bandwidth accounting: `average_bandwidth` and
/// `lifetime_bandwidth` are stored in units of `trx_size * BANDWIDTH_PRECISION`.
pub const BANDWIDTH_PRECISION: u64 = 1_000_000;

/// Width, in seconds, of the exponential averaging window used by the
/// bandwidth meter.
pub const BANDWIDTH_AVERAGE_WINDOW: u64 = 60 * 60 * 24 * 7;

/// Nominal seconds between blocks.
pub const BLOCK_INTERVAL: u64 = 3;

/// Fixed-point precision for `current_reserve_ratio`.
pub const RESERVE_RATIO_PRECISION: i64 = 1_000_000;

/// Minimum absolute increment applied to the reserve ratio on a slack
/// (growth) adjustment, in `RESERVE_RATIO_PRECISION` units.
pub const RESERVE_RATIO_MIN_INCREMENT: i64 = RESERVE_RATIO_PRECISION;

/// Upper bound on `current_reserve_ratio`, expressed as a multiple of
/// `RESERVE_RATIO_PRECISION`.
pub const MAX_RESERVE_RATIO: i64 = 20_000;

/// Maximum size, in bytes, of a generated block.
pub const MAX_BLOCK_SIZE: u64 = 2 * 1024 * 1024;

/// Maximum nesting depth for a comment reply chain.
pub const SOFT_MAX_COMMENT_DEPTH: u16 = 0xFFFF / 8;

/// One percent, expressed in the same fixed-point base the chain uses for
/// percentages (10_000 == 100%).
pub const ONE_PERCENT: u32 = 100;

/// Maximum allowed skew, in milliseconds, between a scheduled slot time and
/// wall-clock time for the block still to be produced.
pub const BLOCK_PRODUCING_LAG_TIME_MS: i64 = 750;

/// Period, in milliseconds, of the production loop's timer tick.
pub const BLOCK_PRODUCTION_LOOP_SLEEP_TIME_MS: u64 = 200;

/// Floor on the timer's re-sleep duration, to avoid busy-looping on skew.
pub const MIN_SLEEP_TIME_MS: u64 = 50;

/// Fixed-point precision used by the reserve-ratio controller's pressure
/// distance calculation.
pub const DISTANCE_CALC_PRECISION: i64 = 10_000;

/// Number of blocks between reserve-ratio controller evaluations.
pub const RESERVE_RATIO_EVALUATION_INTERVAL: u64 = 20;

/// Multiplier applied to `trx_size` when charging the `market` bandwidth kind.
pub const MARKET_BANDWIDTH_MULTIPLIER: u64 = 10;
