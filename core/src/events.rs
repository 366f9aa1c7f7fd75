//! Event Binding (§4.1): wires the five chain-apply hooks to the Policy
//! Checker, Bandwidth Meter, and Reserve-Ratio Controller in the order the
//! chain engine invokes them.
//!
//! The source registers both its pre- and post-block handlers against the
//! *post*-apply-block hook; here the duplicate-custom reset runs at
//! pre-apply-block (so it is clear before block `N` starts) and again at the
//! tail of post-apply-block (so it is clear for out-of-band reads between
//! blocks), while the reserve-ratio update runs only at post-apply-block.

use witness_primitives::{AccountId, BandwidthKind};

use crate::{
	bandwidth::{BandwidthError, BandwidthMeter},
	chain::{AppliedBlock, ChainEngine, Operation, Transaction},
	policy::{DuplicateCustomTracker, PolicyChecker, PolicyError},
	reserve_ratio::{ReserveRatioController, ReserveRatioSnapshot},
};

/// Owns the mutable state shared by all five hooks: the bandwidth records,
/// the reserve-ratio record (absent until the first post-apply-block), and
/// the per-block duplicate-custom set.
#[derive(Default)]
pub struct EventBinding {
	bandwidth: BandwidthMeter,
	reserve_ratio: Option<ReserveRatioController>,
	duplicates: DuplicateCustomTracker,
}

impl EventBinding {
	pub fn new() -> Self {
		Self::default()
	}

	/// Clears the duplicate-custom set before the block's operations are
	/// applied.
	pub fn pre_apply_block(&mut self) {
		self.duplicates.clear();
	}

	/// Producing-only policy predicates over a single operation, run before
	/// it is applied.
	pub fn pre_apply_operation(
		&self,
		engine: &dyn ChainEngine,
		account: &AccountId,
		op: &Operation,
	) -> Result<(), PolicyError> {
		if !engine.is_producing() {
			return Ok(());
		}
		PolicyChecker::check_operation(engine, account, op)
	}

	/// Producing-only duplicate-custom tracking, run after an operation has
	/// been applied.
	pub fn post_apply_operation(&mut self, engine: &dyn ChainEngine, op: &Operation) -> Result<(), PolicyError> {
		if !engine.is_producing() {
			return Ok(());
		}
		PolicyChecker::track_custom_operation(&mut self.duplicates, op)
	}

	/// Charges every required signer of `trx` for `trx.trx_size` bytes of
	/// forum bandwidth, plus market bandwidth (charged at most once per
	/// transaction) if any operation in it is a market operation.
	/// `max_virtual_bandwidth` is the figure last published by
	/// [`ReserveRatioController::max_virtual_bandwidth`].
	pub fn charge_transaction(
		&mut self,
		engine: &dyn ChainEngine,
		trx: &Transaction,
		now: i64,
		max_virtual_bandwidth: i128,
		skip_enforce_bandwidth: bool,
	) -> Result<(), BandwidthError> {
		let is_market = trx.operations.iter().any(Operation::is_market);
		for signer in &trx.required_signers {
			self.bandwidth.charge(
				engine,
				signer,
				BandwidthKind::Forum,
				trx.trx_size,
				now,
				max_virtual_bandwidth,
				skip_enforce_bandwidth,
			)?;
			if is_market {
				self.bandwidth.charge(
					engine,
					signer,
					BandwidthKind::Market,
					trx.trx_size,
					now,
					max_virtual_bandwidth,
					skip_enforce_bandwidth,
				)?;
			}
		}
		Ok(())
	}

	/// Updates the reserve-ratio record from the just-applied block, then
	/// clears the duplicate-custom set again. On the call that creates the
	/// controller, the block's size is not blended into the average — the
	/// record is only initialized (`average_block_size = 0`), matching the
	/// source's strict if/else between first-use initialization and every
	/// later update; the creating block's size is folded in starting with
	/// the next call.
	pub fn post_apply_block(&mut self, block: AppliedBlock, max_block_size: u64) -> ReserveRatioSnapshot {
		let just_created = self.reserve_ratio.is_none();
		let controller =
			self.reserve_ratio.get_or_insert_with(|| ReserveRatioController::new(max_block_size));
		if !just_created {
			controller.on_applied_block(block.block_num, block.serialized_size, max_block_size);
		}
		let snapshot = controller.snapshot(block.serialized_size);
		self.duplicates.clear();
		snapshot
	}

	pub fn reserve_ratio(&self) -> Option<&ReserveRatioController> {
		self.reserve_ratio.as_ref()
	}
}
