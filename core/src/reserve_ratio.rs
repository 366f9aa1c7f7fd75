//! Reserve-Ratio Controller (§4.4): a feedback loop that grows or shrinks
//! virtual bandwidth capacity from the observed average block size.
//!
//! All arithmetic here is wide-integer (`i128`); floating point is forbidden
//! because these values feed deterministic chain state.

use witness_primitives::constants::{
	BANDWIDTH_AVERAGE_WINDOW, BANDWIDTH_PRECISION, BLOCK_INTERVAL, DISTANCE_CALC_PRECISION,
	MAX_RESERVE_RATIO, RESERVE_RATIO_EVALUATION_INTERVAL, RESERVE_RATIO_MIN_INCREMENT,
	RESERVE_RATIO_PRECISION,
};

/// A point-in-time view of the controller, exported through the optional
/// block-data-export collaborator interface (§6).
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ReserveRatioSnapshot {
	pub average_block_size: i128,
	pub current_reserve_ratio: i128,
	pub max_virtual_bandwidth: i128,
	pub block_size: u64,
}

/// The singleton reserve-ratio record (§3 Data Model).
#[derive(Debug, Clone, Copy)]
pub struct ReserveRatioController {
	average_block_size: i128,
	current_reserve_ratio: i128,
	max_virtual_bandwidth: i128,
}

impl ReserveRatioController {
	/// Creates the record as it exists on the first post-apply-block: zeroed
	/// average, reserve ratio at its maximum, virtual bandwidth computed from
	/// that starting ratio.
	pub fn new(max_block_size: u64) -> Self {
		let current_reserve_ratio = MAX_RESERVE_RATIO as i128 * RESERVE_RATIO_PRECISION as i128;
		let max_virtual_bandwidth = recompute_max_virtual_bandwidth(max_block_size, current_reserve_ratio);
		Self { average_block_size: 0, current_reserve_ratio, max_virtual_bandwidth }
	}

	pub fn current_reserve_ratio(&self) -> i128 {
		self.current_reserve_ratio
	}

	pub fn average_block_size(&self) -> i128 {
		self.average_block_size
	}

	pub fn max_virtual_bandwidth(&self) -> i128 {
		self.max_virtual_bandwidth
	}

	/// Invoked from post-apply-block with the just-applied block's serialized
	/// size and the chain's head block number and configured max block size.
	pub fn on_applied_block(&mut self, block_num: u64, block_size: u64, max_block_size: u64) {
		self.average_block_size = (99 * self.average_block_size + block_size as i128) / 100;

		if block_num.is_multiple_of(RESERVE_RATIO_EVALUATION_INTERVAL) {
			self.evaluate(max_block_size);
		}
	}

	fn evaluate(&mut self, max_block_size: u64) {
		let l4 = (max_block_size as i128 / 4).max(1);
		let p = DISTANCE_CALC_PRECISION as i128;
		let d = ((self.average_block_size - l4) * p) / l4;

		let previous = self.current_reserve_ratio;
		let r = self.current_reserve_ratio;

		let updated = if d > 0 {
			let shrink = (r * d) / (d + p);
			(r - shrink).max(RESERVE_RATIO_PRECISION as i128)
		} else {
			let grow = (r * d) / (d - p);
			let increment = (RESERVE_RATIO_MIN_INCREMENT as i128).max(grow);
			(r + increment).min(MAX_RESERVE_RATIO as i128 * RESERVE_RATIO_PRECISION as i128)
		};

		self.current_reserve_ratio = updated;
		self.max_virtual_bandwidth = recompute_max_virtual_bandwidth(max_block_size, updated);

		if updated != previous {
			log::info!(target: "witness::reserve_ratio", "reserve ratio changed from {previous} to {updated} (average_block_size={})", self.average_block_size);
		}
	}

	pub fn snapshot(&self, block_size: u64) -> ReserveRatioSnapshot {
		ReserveRatioSnapshot {
			average_block_size: self.average_block_size,
			current_reserve_ratio: self.current_reserve_ratio,
			max_virtual_bandwidth: self.max_virtual_bandwidth,
			block_size,
		}
	}
}

fn recompute_max_virtual_bandwidth(max_block_size: u64, current_reserve_ratio: i128) -> i128 {
	(max_block_size as i128 * current_reserve_ratio * BANDWIDTH_PRECISION as i128 * BANDWIDTH_AVERAGE_WINDOW as i128)
		/ (BLOCK_INTERVAL as i128 * RESERVE_RATIO_PRECISION as i128)
}

#[cfg(test)]
mod tests {
	use super::*;

	const MAX_BLOCK_SIZE: u64 = 64 * 1024;

	#[test]
	fn starts_at_max_ratio() {
		let controller = ReserveRatioController::new(MAX_BLOCK_SIZE);
		assert_eq!(
			controller.current_reserve_ratio(),
			MAX_RESERVE_RATIO as i128 * RESERVE_RATIO_PRECISION as i128
		);
	}

	#[test]
	fn average_block_size_is_exact_ewma() {
		let mut controller = ReserveRatioController::new(MAX_BLOCK_SIZE);
		let mut expected: i128 = 0;
		for block_num in 1..=5u64 {
			let size = 1000 * block_num;
			expected = (99 * expected + size as i128) / 100;
			controller.on_applied_block(block_num, size, MAX_BLOCK_SIZE);
			assert_eq!(controller.average_block_size(), expected);
		}
	}

	// average_block_size is a weight-1/100 EWMA (time constant ~100 blocks), so
	// sustained full-size blocks on a small max_block_size cross the L/4
	// pressure threshold within the first evaluation windows.
	const SMALL_MAX_BLOCK_SIZE: u64 = 4096;

	#[test]
	fn high_pressure_shrinks_ratio_and_stays_bounded() {
		let mut controller = ReserveRatioController::new(SMALL_MAX_BLOCK_SIZE);
		let starting = controller.current_reserve_ratio();
		for block_num in 1..=100u64 {
			controller.on_applied_block(block_num, SMALL_MAX_BLOCK_SIZE, SMALL_MAX_BLOCK_SIZE);
		}
		let shrunk = controller.current_reserve_ratio();
		assert!(shrunk < starting);
		assert!(shrunk >= RESERVE_RATIO_PRECISION as i128);
	}

	#[test]
	fn slack_grows_ratio_up_to_the_cap() {
		let mut controller = ReserveRatioController::new(SMALL_MAX_BLOCK_SIZE);
		for block_num in 1..=100u64 {
			controller.on_applied_block(block_num, SMALL_MAX_BLOCK_SIZE, SMALL_MAX_BLOCK_SIZE);
		}
		let shrunk = controller.current_reserve_ratio();

		for block_num in 101..=700u64 {
			controller.on_applied_block(block_num, 64, SMALL_MAX_BLOCK_SIZE);
		}
		let recovered = controller.current_reserve_ratio();

		assert!(recovered > shrunk);
		assert!(recovered <= MAX_RESERVE_RATIO as i128 * RESERVE_RATIO_PRECISION as i128);
	}
}
