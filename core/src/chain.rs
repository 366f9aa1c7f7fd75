//! The `ChainEngine` collaborator interface (§6): everything the witness
//! subsystem treats as an opaque, externally-owned service. Storage, fork
//! choice and block assembly primitives live behind this trait; the
//! subsystem never assumes anything about how they're implemented.

use witness_primitives::{AccountId, PublicKey, SkipFlags, Slot};

/// An account's authority state, as maintained by the chain engine.
#[derive(Debug, Clone, Default)]
pub struct AccountAuthorities {
	pub owner_keys: Vec<PublicKey>,
	pub active_keys: Vec<PublicKey>,
	pub posting_keys: Vec<PublicKey>,
	pub memo_key: Option<PublicKey>,
}

/// The subset of comment state the Policy Checker needs.
#[derive(Debug, Clone, Copy)]
pub struct CommentInfo {
	pub depth: u16,
}

/// One operation within a transaction, restricted to the kinds the Policy
/// Checker and Bandwidth Meter care about. Unrelated kinds fall through the
/// catch-all `Other` arm wherever this is matched.
#[derive(Debug, Clone)]
pub enum Operation {
	Comment { parent_author: Option<AccountId>, parent_permlink: Option<String> },
	CommentOptions { beneficiaries: Vec<AccountId>, unknown_extension: bool },
	Transfer { from: AccountId, memo: String },
	TransferToSavings { from: AccountId, memo: String },
	TransferFromSavings { from: AccountId, memo: String },
	CustomJson { required_auths: Vec<AccountId>, required_posting_auths: Vec<AccountId> },
	CustomBinary { required_auths: Vec<AccountId> },
	Custom { required_auths: Vec<AccountId> },
	Market,
	Other,
}

impl Operation {
	/// Accounts impacted by a custom operation, used by the duplicate-custom
	/// tracker. Empty for every other operation kind.
	pub fn impacted_accounts(&self) -> Vec<AccountId> {
		match self {
			Operation::CustomJson { required_auths, required_posting_auths } => {
				let mut accounts = required_auths.clone();
				accounts.extend(required_posting_auths.iter().cloned());
				accounts
			},
			Operation::CustomBinary { required_auths } | Operation::Custom { required_auths } => {
				required_auths.clone()
			},
			_ => Vec::new(),
		}
	}

	pub fn is_market(&self) -> bool {
		matches!(self, Operation::Market)
	}
}

/// A transaction as seen by the Bandwidth Meter: its required signers and its
/// serialized size.
#[derive(Debug, Clone)]
pub struct Transaction {
	pub required_signers: Vec<AccountId>,
	pub trx_size: u64,
	pub operations: Vec<Operation>,
}

/// A just-applied block, as seen by the Reserve-Ratio Controller.
#[derive(Debug, Clone, Copy)]
pub struct AppliedBlock {
	pub block_num: u64,
	pub serialized_size: u64,
}

/// Everything the subsystem reads from, or hands to, chain state. Implemented
/// by the host process's chain engine; the `witness-node` binary supplies an
/// in-memory example implementation for its own tests. Slot scheduling
/// (`get_slot_at_time`/`get_slot_time`/`get_scheduled_producer`) is owned by
/// the engine, not the witness subsystem — it is the one piece of consensus
/// knowledge the production loop cannot compute for itself.
pub trait ChainEngine {
	fn head_block_num(&self) -> u64;
	fn head_block_time(&self) -> i64;
	fn max_block_size(&self) -> u64;
	fn is_producing(&self) -> bool;
	fn has_hardfork(&self, hardfork: u32) -> bool;

	fn get_account(&self, account: &AccountId) -> Option<AccountAuthorities>;
	fn get_comment(&self, author: &AccountId, permlink: &str) -> Option<CommentInfo>;
	fn find_comment(&self, author: &AccountId, permlink: &str) -> bool {
		self.get_comment(author, permlink).is_some()
	}

	fn effective_stake(&self, account: &AccountId) -> u64;
	fn total_stake(&self) -> u64;

	/// Slot index open at unix-time `now` (seconds); `Slot::NONE` if none is.
	fn get_slot_at_time(&self, now: i64) -> Slot;
	/// Wall-clock time, in unix seconds, at which `slot` opens.
	fn get_slot_time(&self, slot: Slot) -> i64;
	/// The producer scheduled for `slot`.
	fn get_scheduled_producer(&self, slot: Slot) -> AccountId;
	/// Percentage (0-99) of the configured producer set reporting as
	/// participating in recent blocks.
	fn witness_participation_rate(&self) -> u8;

	/// Assembles and signs a block for `scheduled_time`, on behalf of
	/// `producer`, using `key`, honoring `skip_flags`.
	fn generate_block(
		&mut self,
		scheduled_time: i64,
		producer: &AccountId,
		key: &witness_primitives::keys::PrivateKey,
		skip_flags: SkipFlags,
	) -> Result<AppliedBlock, GenerateBlockError>;
}

/// Raised by [`ChainEngine::generate_block`] (§7: "Producer exception" /
/// "Fatal producer exception").
#[derive(Debug, thiserror::Error)]
pub enum GenerateBlockError {
	#[error("block production was cancelled")]
	Cancelled,
	#[error("node is running an unknown hardfork and cannot continue producing")]
	UnknownHardfork,
	#[error("chain engine failed to produce a block: {0}")]
	Other(String),
}

/// The bandwidth-retirement hardfork number (§4.3): once the chain has passed
/// it, `skip_enforce_bandwidth` governs enforcement instead of it being always
/// active.
pub const HF_BANDWIDTH_RETIREMENT: u32 = 20;
