//! An in-memory, single-process example `ChainEngine`, used by the binary's
//! own integration tests and as a demonstration of the collaborator
//! interface. Never intended to back a real deployment — storage, fork
//! choice and block assembly are explicitly out of scope (§1).

use std::collections::HashMap;

use witness_core::chain::{AccountAuthorities, AppliedBlock, ChainEngine, CommentInfo, GenerateBlockError};
use witness_primitives::{constants::BLOCK_INTERVAL, keys::PrivateKey, AccountId, SkipFlags, Slot};

pub struct ExampleChainEngine {
	pub head_block_num: u64,
	pub head_block_time: i64,
	pub genesis_time: i64,
	pub max_block_size: u64,
	pub producing: bool,
	pub hardforks: u32,
	pub schedule: Vec<AccountId>,
	pub accounts: HashMap<AccountId, AccountAuthorities>,
	pub comments: HashMap<(AccountId, String), CommentInfo>,
	pub stakes: HashMap<AccountId, u64>,
	pub total_stake: u64,
	pub participation_rate: u8,
}

impl ExampleChainEngine {
	pub fn new(genesis_time: i64, schedule: Vec<AccountId>) -> Self {
		Self {
			head_block_num: 0,
			head_block_time: genesis_time,
			genesis_time,
			max_block_size: witness_primitives::constants::MAX_BLOCK_SIZE,
			producing: true,
			hardforks: 0,
			schedule,
			accounts: HashMap::new(),
			comments: HashMap::new(),
			stakes: HashMap::new(),
			total_stake: 0,
			participation_rate: 100,
		}
	}
}

impl ChainEngine for ExampleChainEngine {
	fn head_block_num(&self) -> u64 {
		self.head_block_num
	}

	fn head_block_time(&self) -> i64 {
		self.head_block_time
	}

	fn max_block_size(&self) -> u64 {
		self.max_block_size
	}

	fn is_producing(&self) -> bool {
		self.producing
	}

	fn has_hardfork(&self, hardfork: u32) -> bool {
		self.hardforks >= hardfork
	}

	fn get_account(&self, account: &AccountId) -> Option<AccountAuthorities> {
		self.accounts.get(account).cloned()
	}

	fn get_comment(&self, author: &AccountId, permlink: &str) -> Option<CommentInfo> {
		self.comments.get(&(author.clone(), permlink.to_owned())).copied()
	}

	fn effective_stake(&self, account: &AccountId) -> u64 {
		self.stakes.get(account).copied().unwrap_or(0)
	}

	fn total_stake(&self) -> u64 {
		self.total_stake
	}

	fn get_slot_at_time(&self, now: i64) -> Slot {
		let first_slot_time = self.get_slot_time(Slot(1));
		if now < first_slot_time {
			return Slot::NONE;
		}
		Slot((now - first_slot_time) as u64 / BLOCK_INTERVAL + 1)
	}

	fn get_slot_time(&self, slot: Slot) -> i64 {
		if slot.is_none() {
			return 0;
		}
		if self.head_block_num == 0 {
			return self.genesis_time + *slot as i64 * BLOCK_INTERVAL as i64;
		}
		let head_slot = self.head_block_time / BLOCK_INTERVAL as i64 * BLOCK_INTERVAL as i64;
		head_slot + *slot as i64 * BLOCK_INTERVAL as i64
	}

	fn get_scheduled_producer(&self, slot: Slot) -> AccountId {
		if self.schedule.is_empty() {
			return AccountId::from("");
		}
		let index = (*slot as usize) % self.schedule.len();
		self.schedule[index].clone()
	}

	fn witness_participation_rate(&self) -> u8 {
		self.participation_rate
	}

	fn generate_block(
		&mut self,
		scheduled_time: i64,
		producer: &AccountId,
		_key: &PrivateKey,
		_skip_flags: SkipFlags,
	) -> Result<AppliedBlock, GenerateBlockError> {
		self.head_block_num += 1;
		self.head_block_time = scheduled_time;
		log::info!(target: "witness::producer", "produced block {} for {producer} at {scheduled_time}", self.head_block_num);
		Ok(AppliedBlock { block_num: self.head_block_num, serialized_size: 0 })
	}
}
