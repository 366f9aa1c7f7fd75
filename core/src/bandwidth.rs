//! Bandwidth Meter (§4.3): per-account exponentially-decaying transaction
//! bandwidth, weighed against stake to throttle transaction spam without a
//! fee market.

use std::collections::HashMap;

use witness_primitives::{
	constants::{BANDWIDTH_AVERAGE_WINDOW, BANDWIDTH_PRECISION, MARKET_BANDWIDTH_MULTIPLIER},
	AccountId, BandwidthKind,
};

use crate::chain::{ChainEngine, HF_BANDWIDTH_RETIREMENT};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BandwidthError {
	#[error(
		"account {account} exceeded its stake-proportional bandwidth allowance \
		 (effective_stake={effective_stake}, average_bandwidth={average_bandwidth}, \
		 max_virtual_bandwidth={max_virtual_bandwidth}, total_stake={total_stake})"
	)]
	CapExceeded {
		account: AccountId,
		effective_stake: u64,
		average_bandwidth: u128,
		max_virtual_bandwidth: i128,
		total_stake: u64,
	},
}

/// The decaying bandwidth state tracked for one (account, kind) pair.
#[derive(Debug, Clone, Copy, Default)]
struct BandwidthRecord {
	average_bandwidth: u128,
	lifetime_bandwidth: u128,
	last_update: i64,
}

/// Tracks per-account bandwidth and enforces the stake-proportional cap.
///
/// Skipped entirely whenever [`ChainEngine::total_stake`] is zero (no stake
/// has been distributed yet, e.g. during genesis replay).
#[derive(Debug, Default)]
pub struct BandwidthMeter {
	records: HashMap<(AccountId, BandwidthKind), BandwidthRecord>,
}

impl BandwidthMeter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Charges `trx_size` bytes of bandwidth to `account` under `kind`, at
	/// chain time `now` (unix seconds), then enforces the cap if the engine
	/// is actively producing and bandwidth enforcement isn't skipped.
	///
	/// `max_virtual_bandwidth` is the figure last published by the
	/// [`crate::reserve_ratio::ReserveRatioController`]; the two modules stay
	/// decoupled by having the caller pass it through rather than the meter
	/// reaching into the controller directly.
	///
	/// Market-kind bandwidth is charged at [`MARKET_BANDWIDTH_MULTIPLIER`]
	/// times `trx_size`; callers charge a transaction's market kind at most
	/// once regardless of how many market operations it contains.
	pub fn charge(
		&mut self,
		engine: &dyn ChainEngine,
		account: &AccountId,
		kind: BandwidthKind,
		trx_size: u64,
		now: i64,
		max_virtual_bandwidth: i128,
		skip_enforce_bandwidth: bool,
	) -> Result<(), BandwidthError> {
		let total_stake = engine.total_stake();
		if total_stake == 0 {
			return Ok(());
		}

		let weighted_size = match kind {
			BandwidthKind::Forum => trx_size as u128,
			BandwidthKind::Market => trx_size as u128 * MARKET_BANDWIDTH_MULTIPLIER as u128,
		};
		let charge = weighted_size * BANDWIDTH_PRECISION as u128;

		let key = (account.clone(), kind);
		let record = self.records.entry(key).or_default();
		update_record(record, charge, now);

		let enforce = engine.is_producing()
			&& (!engine.has_hardfork(HF_BANDWIDTH_RETIREMENT) || !skip_enforce_bandwidth);
		if !enforce {
			return Ok(());
		}

		let effective_stake = engine.effective_stake(account);
		// Saturating, not wrapping: `effective_stake` up to `u64::MAX` against a
		// `max_virtual_bandwidth` near its own ceiling can exceed `i128::MAX`.
		// Saturating to `i128::MAX` keeps the comparison's direction intact (an
		// overflowing lhs is, unambiguously, far larger than any in-range rhs)
		// instead of silently wrapping to a small or negative value.
		let lhs = (effective_stake as i128).saturating_mul(max_virtual_bandwidth);
		let rhs = (record.average_bandwidth as i128).saturating_mul(total_stake as i128);
		if lhs <= rhs {
			return Err(BandwidthError::CapExceeded {
				account: account.clone(),
				effective_stake,
				average_bandwidth: record.average_bandwidth,
				max_virtual_bandwidth,
				total_stake,
			});
		}
		Ok(())
	}
}

fn update_record(record: &mut BandwidthRecord, charge: u128, now: i64) {
	let delta_time = (now - record.last_update).clamp(0, BANDWIDTH_AVERAGE_WINDOW as i64) as u128;
	if record.last_update == 0 || delta_time >= BANDWIDTH_AVERAGE_WINDOW as u128 {
		record.average_bandwidth = charge;
	} else {
		let window = BANDWIDTH_AVERAGE_WINDOW as u128;
		record.average_bandwidth =
			(record.average_bandwidth * (window - delta_time) + charge * delta_time) / window;
	}
	record.lifetime_bandwidth += charge;
	record.last_update = now;
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FakeEngine {
		producing: bool,
		total_stake: u64,
		effective_stake: u64,
		max_block_size: u64,
		hardfork: bool,
	}

	impl ChainEngine for FakeEngine {
		fn head_block_num(&self) -> u64 { 0 }
		fn head_block_time(&self) -> i64 { 0 }
		fn max_block_size(&self) -> u64 { self.max_block_size }
		fn is_producing(&self) -> bool { self.producing }
		fn has_hardfork(&self, _: u32) -> bool { self.hardfork }
		fn get_account(&self, _: &AccountId) -> Option<crate::chain::AccountAuthorities> { None }
		fn get_comment(&self, _: &AccountId, _: &str) -> Option<crate::chain::CommentInfo> { None }
		fn effective_stake(&self, _: &AccountId) -> u64 { self.effective_stake }
		fn total_stake(&self) -> u64 { self.total_stake }
		fn get_slot_at_time(&self, _: i64) -> witness_primitives::Slot { witness_primitives::Slot::NONE }
		fn get_slot_time(&self, _: witness_primitives::Slot) -> i64 { 0 }
		fn get_scheduled_producer(&self, _: witness_primitives::Slot) -> AccountId { AccountId::from("") }
		fn witness_participation_rate(&self) -> u8 { 100 }
		fn generate_block(
			&mut self,
			_: i64,
			_: &AccountId,
			_: &witness_primitives::keys::PrivateKey,
			_: witness_primitives::SkipFlags,
		) -> Result<crate::chain::AppliedBlock, crate::chain::GenerateBlockError> {
			unimplemented!()
		}
	}

	#[test]
	fn zero_total_stake_skips_metering() {
		let engine = FakeEngine { producing: true, total_stake: 0, effective_stake: 0, max_block_size: 1000, hardfork: false };
		let mut meter = BandwidthMeter::new();
		meter
			.charge(&engine, &AccountId::from("alice"), BandwidthKind::Forum, 1_000_000, 100, 0, false)
			.unwrap();
	}

	#[test]
	fn well_staked_account_is_not_capped() {
		let engine = FakeEngine { producing: true, total_stake: 100, effective_stake: 100, max_block_size: 1_000_000, hardfork: false };
		let mut meter = BandwidthMeter::new();
		meter
			.charge(&engine, &AccountId::from("alice"), BandwidthKind::Forum, 256, 100, i128::MAX / 1_000, false)
			.unwrap();
	}

	#[test]
	fn unstaked_account_is_capped() {
		let engine = FakeEngine { producing: true, total_stake: 100, effective_stake: 0, max_block_size: 1_000_000, hardfork: false };
		let mut meter = BandwidthMeter::new();
		let err = meter
			.charge(&engine, &AccountId::from("alice"), BandwidthKind::Forum, 256, 100, i128::MAX / 1_000, false)
			.unwrap_err();
		assert_eq!(
			err,
			BandwidthError::CapExceeded {
				account: AccountId::from("alice"),
				effective_stake: 0,
				average_bandwidth: 256 * BANDWIDTH_PRECISION as u128,
				max_virtual_bandwidth: i128::MAX / 1_000,
				total_stake: 100,
			}
		);
	}

	#[test]
	fn exact_boundary_is_capped() {
		// lhs == rhs must also fail the cap (§4.3: within cap iff v×M > new_avg×V).
		let engine = FakeEngine { producing: true, total_stake: 1, effective_stake: 1, max_block_size: 1_000_000, hardfork: false };
		let mut meter = BandwidthMeter::new();
		let charge = 256u128 * BANDWIDTH_PRECISION as u128;
		let err = meter
			.charge(&engine, &AccountId::from("alice"), BandwidthKind::Forum, 256, 100, charge as i128, false)
			.unwrap_err();
		assert!(matches!(err, BandwidthError::CapExceeded { .. }));
	}

	#[test]
	fn huge_stake_against_huge_max_virtual_bandwidth_does_not_overflow() {
		// effective_stake near u64::MAX times a max_virtual_bandwidth near its
		// own realistic ceiling overflows i128 if multiplied unchecked; it must
		// saturate instead of panicking (debug) or wrapping (release).
		let engine = FakeEngine {
			producing: true,
			total_stake: 1,
			effective_stake: u64::MAX,
			max_block_size: 1_000_000,
			hardfork: false,
		};
		let mut meter = BandwidthMeter::new();
		meter
			.charge(&engine, &AccountId::from("alice"), BandwidthKind::Forum, 256, 100, i128::MAX / 1_000, false)
			.unwrap();
	}

	#[test]
	fn market_bandwidth_is_weighted_ten_x() {
		let mut forum_record = BandwidthRecord::default();
		update_record(&mut forum_record, BANDWIDTH_PRECISION as u128 * 10, 1);
		let mut market_record = BandwidthRecord::default();
		update_record(&mut market_record, BANDWIDTH_PRECISION as u128 * 10 * MARKET_BANDWIDTH_MULTIPLIER as u128, 1);
		assert_eq!(market_record.average_bandwidth, forum_record.average_bandwidth * MARKET_BANDWIDTH_MULTIPLIER as u128);
	}
}
