//! Wall-clock timer utilities for the Block Production Loop (§4.5).
//!
//! Slot scheduling itself (which slot is open, who is scheduled for it) is
//! chain-engine knowledge and lives behind the `ChainEngine` trait in
//! `witness-core`; this crate only concerns the loop's own periodic wake-up,
//! the way `consensus/slots`' `next_time_boundary` drives its interval timer.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Adds `pad` to `now` and truncates to whole seconds, matching step 1 of
/// `maybe_produce_block`: `now = round_up_to_second(now_fine + 500ms)`. This
/// mirrors `fc::time_point_sec`'s constructor, which truncates rather than
/// rounds — a fractional remainder after padding is dropped, not rounded up.
/// Returns unix seconds.
pub fn round_up_to_second(now: SystemTime, pad: Duration) -> i64 {
	let padded = now + pad;
	let since_epoch = padded.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
	since_epoch.as_secs() as i64
}

/// How long the production loop's timer should sleep before its next tick:
/// time remaining until `period`'s next wall-clock boundary, floored at
/// `min_sleep` to avoid busy-looping when the previous tick overran.
pub fn next_tick_in(period: Duration, min_sleep: Duration) -> Duration {
	let now_ms = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or(Duration::ZERO)
		.as_millis();
	let period_ms = period.as_millis().max(1);
	let next_boundary_ms = (now_ms / period_ms + 1) * period_ms;
	Duration::from_millis((next_boundary_ms - now_ms) as u64).max(min_sleep)
}
