//! Block Production Loop (§4.5): a periodic timer tick that evaluates slot
//! eligibility and, on a hit, requests a signed block and hands it to the
//! peer layer.

use std::time::{Duration, SystemTime};

use witness_core::chain::{AccountAuthorities, ChainEngine, GenerateBlockError};
use witness_primitives::{constants, AccountId, SkipFlags, Slot};

use crate::{key_store::KeyStore, peer::PeerLayer};

/// Every outcome `maybe_produce_block` can return (§4.5 table), each
/// carrying the diagnostic context named in the spec for that condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductionCondition {
	WaitForGenesis,
	NotSynced,
	NotTimeYet,
	NotMyTurn { slot: Slot, scheduled: AccountId },
	NoPrivateKey { scheduled: AccountId },
	LowParticipation { observed: u8, required: u8 },
	Lag { scheduled_time: i64, now: i64 },
	/// Reserved: only emitted if a consecutive-block guard is enabled. This
	/// implementation omits the guard (see the accompanying design notes),
	/// so this variant is never produced.
	Consecutive,
	ExceptionProducingBlock { reason: String },
	Produced { block_num: u64 },
}

/// Runtime flags the production loop consults on every tick (§3 Data Model).
pub struct RuntimeFlags {
	pub production_enabled: bool,
	pub required_participation: u8,
	pub skip_flags: SkipFlags,
	pub skip_enforce_bandwidth: bool,
	pub genesis_time: i64,
}

impl Default for RuntimeFlags {
	fn default() -> Self {
		Self {
			production_enabled: false,
			required_participation: 33,
			skip_flags: SkipFlags::NONE,
			skip_enforce_bandwidth: true,
			genesis_time: 0,
		}
	}
}

pub struct ProductionLoop<E, P> {
	engine: E,
	peer: P,
	key_store: KeyStore,
	flags: RuntimeFlags,
}

impl<E: ChainEngine, P: PeerLayer> ProductionLoop<E, P> {
	pub fn new(engine: E, peer: P, key_store: KeyStore, flags: RuntimeFlags) -> Self {
		Self { engine, peer, key_store, flags }
	}

	/// The ten-step algorithm of §4.5, evaluated once per tick. `Cancelled`
	/// and `UnknownHardfork` are fatal (§7: "propagated" exceptions that
	/// must stop the loop without rescheduling) and are returned as `Err`
	/// rather than folded into [`ProductionCondition`]; every other outcome,
	/// including a transient [`GenerateBlockError::Other`], is `Ok`.
	pub async fn maybe_produce_block(
		&mut self,
		now_fine: SystemTime,
	) -> Result<ProductionCondition, GenerateBlockError> {
		let now = witness_scheduler::round_up_to_second(now_fine, Duration::from_millis(500));

		if now < self.flags.genesis_time {
			return Ok(ProductionCondition::WaitForGenesis);
		}

		if !self.flags.production_enabled {
			let next_slot_time = self.engine.get_slot_time(Slot(1));
			if next_slot_time >= now {
				self.flags.production_enabled = true;
				self.peer.set_block_production(true).await;
			} else {
				return Ok(ProductionCondition::NotSynced);
			}
		}

		let slot = self.engine.get_slot_at_time(now);
		if slot.is_none() {
			return Ok(ProductionCondition::NotTimeYet);
		}

		assert!(now > self.engine.head_block_time(), "slot calculator produced a slot not after head block time");

		let scheduled = self.engine.get_scheduled_producer(slot);
		if !self.key_store.controls(&scheduled) {
			return Ok(ProductionCondition::NotMyTurn { slot, scheduled });
		}

		let authorities = self.engine.get_account(&scheduled).unwrap_or_else(|| AccountAuthorities {
			owner_keys: Vec::new(),
			active_keys: Vec::new(),
			posting_keys: Vec::new(),
			memo_key: None,
		});
		let Some(key) = self.key_store.signing_key_for(&authorities).cloned() else {
			return Ok(ProductionCondition::NoPrivateKey { scheduled });
		};

		let participation = self.engine.witness_participation_rate();
		if participation < self.flags.required_participation {
			return Ok(ProductionCondition::LowParticipation {
				observed: participation,
				required: self.flags.required_participation,
			});
		}

		let scheduled_time = self.engine.get_slot_time(slot);
		if (scheduled_time - now).unsigned_abs() * 1000 > constants::BLOCK_PRODUCING_LAG_TIME_MS as u64 {
			return Ok(ProductionCondition::Lag { scheduled_time, now });
		}

		match self.engine.generate_block(scheduled_time, &scheduled, &key, self.flags.skip_flags) {
			Ok(block) => {
				self.peer.broadcast_block(&block).await;
				Ok(ProductionCondition::Produced { block_num: block.block_num })
			},
			Err(err @ (GenerateBlockError::Cancelled | GenerateBlockError::UnknownHardfork)) => Err(err),
			Err(GenerateBlockError::Other(reason)) => Ok(ProductionCondition::ExceptionProducingBlock { reason }),
		}
	}

	/// Runs the timer loop until `shutdown` resolves or a fatal
	/// [`GenerateBlockError`] is raised. Every tick runs `maybe_produce_block`
	/// and reschedules regardless of outcome, except on a fatal error, which
	/// stops the loop immediately without rescheduling. The timer races the
	/// shutdown signal the same way the slot worker races a proposal against
	/// its own deadline.
	pub async fn run(mut self, mut shutdown: tokio::sync::oneshot::Receiver<()>) -> Result<(), GenerateBlockError> {
		loop {
			let period = Duration::from_millis(constants::BLOCK_PRODUCTION_LOOP_SLEEP_TIME_MS);
			let min_sleep = Duration::from_millis(constants::MIN_SLEEP_TIME_MS);
			let sleep_for = witness_scheduler::next_tick_in(period, min_sleep);

			match futures::future::select(futures_timer::Delay::new(sleep_for), &mut shutdown).await {
				futures::future::Either::Left(_) => match self.maybe_produce_block(SystemTime::now()).await {
					Ok(condition) => {
						log::trace!(target: "witness::producer", "production tick: {condition:?}");
					},
					Err(err) => {
						log::error!(target: "witness::producer", "fatal producer exception: {err}");
						return Err(err);
					},
				},
				futures::future::Either::Right(_) => {
					log::info!(target: "witness::producer", "production loop shutting down");
					return Ok(());
				},
			}
		}
	}
}
