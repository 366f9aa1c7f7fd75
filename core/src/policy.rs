//! Policy Checker (§4.2): pure predicates applied to operations while the
//! chain engine is actively producing. Never invoked during replay or peer
//! block validation — callers must gate on [`ChainEngine::is_producing`].

use std::collections::HashSet;

use witness_primitives::{constants::SOFT_MAX_COMMENT_DEPTH, keys::PrivateKey, AccountId};

use crate::chain::{AccountAuthorities, ChainEngine, CommentInfo, Operation};

const ROLES: [&str; 3] = ["owner", "active", "posting"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
	#[error("comment depth {actual} exceeds soft max {max}")]
	CommentDepthExceeded { actual: u16, max: u16 },
	#[error("comment-options beneficiary count {actual} exceeds limit {max}")]
	TooManyBeneficiaries { actual: usize, max: usize },
	#[error("detected private {role} key in memo field")]
	MemoKeyLeak { role: &'static str },
	#[error("account {account} already submitted a custom operation this block")]
	DuplicateCustomOperation { account: AccountId },
}

const MAX_COMMENT_BENEFICIARIES: usize = 8;

/// Tracks, per block, which accounts have already emitted a custom-JSON /
/// custom-binary / generic custom operation (§4.2, §3 invariants). Cleared at
/// pre-apply-block and again at the tail of post-apply-block.
#[derive(Debug, Default)]
pub struct DuplicateCustomTracker {
	seen: HashSet<AccountId>,
}

impl DuplicateCustomTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Called from post-apply-operation for custom-JSON, custom-binary and
	/// generic custom operations while the chain engine is producing.
	pub fn record(&mut self, account: AccountId) -> Result<(), PolicyError> {
		if !self.seen.insert(account.clone()) {
			return Err(PolicyError::DuplicateCustomOperation { account });
		}
		Ok(())
	}

	/// Cleared at pre-apply-block and again at the tail of post-apply-block.
	pub fn clear(&mut self) {
		self.seen.clear();
	}

	pub fn is_empty(&self) -> bool {
		self.seen.is_empty()
	}
}

/// Stateless predicates over operations, consulted from pre-apply-operation
/// and post-apply-operation.
pub struct PolicyChecker;

impl PolicyChecker {
	/// Pre-apply-operation check. `engine` supplies comment lookups and the
	/// sender's authority set; both are read-only.
	pub fn check_operation(
		engine: &dyn ChainEngine,
		_account: &AccountId,
		op: &Operation,
	) -> Result<(), PolicyError> {
		match op {
			Operation::Comment { parent_author, parent_permlink } => {
				if let Some(parent_author) = parent_author {
					let permlink = parent_permlink.as_deref().unwrap_or("");
					Self::check_comment_depth(engine, parent_author, permlink)?;
				}
				Ok(())
			},
			Operation::CommentOptions { beneficiaries, unknown_extension: _ } => {
				// Any other recognized extension variant is accepted silently; see
				// the allowed-vote-assets open question.
				if beneficiaries.len() > MAX_COMMENT_BENEFICIARIES {
					return Err(PolicyError::TooManyBeneficiaries {
						actual: beneficiaries.len(),
						max: MAX_COMMENT_BENEFICIARIES,
					});
				}
				Ok(())
			},
			Operation::Transfer { from, memo }
			| Operation::TransferToSavings { from, memo }
			| Operation::TransferFromSavings { from, memo } => {
				if memo.is_empty() {
					return Ok(());
				}
				let Some(authorities) = engine.get_account(from) else {
					return Ok(());
				};
				check_memo(memo, from, &authorities)
			},
			Operation::CustomJson { .. }
			| Operation::CustomBinary { .. }
			| Operation::Custom { .. }
			| Operation::Market
			| Operation::Other => Ok(()),
		}
	}

	fn check_comment_depth(
		engine: &dyn ChainEngine,
		parent_author: &AccountId,
		parent_permlink: &str,
	) -> Result<(), PolicyError> {
		let Some(CommentInfo { depth }) = engine.get_comment(parent_author, parent_permlink) else {
			return Ok(());
		};
		if depth >= SOFT_MAX_COMMENT_DEPTH {
			return Err(PolicyError::CommentDepthExceeded { actual: depth, max: SOFT_MAX_COMMENT_DEPTH });
		}
		Ok(())
	}

	/// Post-apply-operation: called only for custom-JSON / custom-binary /
	/// generic custom operations, only while producing.
	pub fn track_custom_operation(
		tracker: &mut DuplicateCustomTracker,
		op: &Operation,
	) -> Result<(), PolicyError> {
		for account in op.impacted_accounts() {
			tracker.record(account)?;
		}
		Ok(())
	}
}

/// Derives candidate public keys from `memo` and fails if any matches an
/// authority key of `sender` (§4.2). Base58 decoding failures in step 1 are
/// ignored silently — an un-parseable memo simply yields no candidate from
/// that step.
fn check_memo(memo: &str, sender: &AccountId, authorities: &AccountAuthorities) -> Result<(), PolicyError> {
	let mut candidates = Vec::new();

	if let Ok(candidate) = PrivateKey::from_wif(memo) {
		candidates.push((candidate.public_key(), "memo"));
	}

	for role in ROLES {
		if let Ok(candidate) = PrivateKey::from_login_seed(&sender.0, role, memo) {
			candidates.push((candidate.public_key(), role));
		}
	}

	for (candidate, role) in candidates {
		let hits_authority = authorities.owner_keys.contains(&candidate)
			|| authorities.active_keys.contains(&candidate)
			|| authorities.posting_keys.contains(&candidate)
			|| authorities.memo_key == Some(candidate);
		if hits_authority {
			return Err(PolicyError::MemoKeyLeak { role: leaked_role(role, authorities, candidate) });
		}
	}

	Ok(())
}

/// Names the authority role the leaked candidate actually matched, falling
/// back to the role under which it was derived.
fn leaked_role(
	derived_role: &'static str,
	authorities: &AccountAuthorities,
	candidate: witness_primitives::PublicKey,
) -> &'static str {
	if authorities.owner_keys.contains(&candidate) {
		"owner"
	} else if authorities.active_keys.contains(&candidate) {
		"active"
	} else if authorities.posting_keys.contains(&candidate) {
		"posting"
	} else if authorities.memo_key == Some(candidate) {
		"memo"
	} else {
		derived_role
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn duplicate_custom_tracker_rejects_second_submission_same_block() {
		let mut tracker = DuplicateCustomTracker::new();
		let alice = AccountId::from("alice");
		tracker.record(alice.clone()).unwrap();
		let err = tracker.record(alice.clone()).unwrap_err();
		assert_eq!(err, PolicyError::DuplicateCustomOperation { account: alice });
	}

	#[test]
	fn duplicate_custom_tracker_allows_across_blocks() {
		let mut tracker = DuplicateCustomTracker::new();
		let alice = AccountId::from("alice");
		tracker.record(alice.clone()).unwrap();
		tracker.clear();
		tracker.record(alice).unwrap();
	}

	#[test]
	fn memo_leak_is_detected() {
		let alice = AccountId::from("alice");
		let posting = PrivateKey::from_login_seed("alice", "posting", "pw").unwrap();
		let authorities = AccountAuthorities {
			posting_keys: vec![posting.public_key()],
			..Default::default()
		};
		let err = check_memo("pw", &alice, &authorities).unwrap_err();
		assert_eq!(err, PolicyError::MemoKeyLeak { role: "posting" });
	}

	#[test]
	fn unrelated_memo_passes() {
		let alice = AccountId::from("alice");
		let authorities = AccountAuthorities::default();
		check_memo("thanks for the coffee", &alice, &authorities).unwrap();
	}

	#[test]
	fn comment_depth_clamp() {
		struct Engine(u16);
		impl ChainEngine for Engine {
			fn head_block_num(&self) -> u64 { 0 }
			fn head_block_time(&self) -> i64 { 0 }
			fn max_block_size(&self) -> u64 { 0 }
			fn is_producing(&self) -> bool { true }
			fn has_hardfork(&self, _: u32) -> bool { true }
			fn get_account(&self, _: &AccountId) -> Option<AccountAuthorities> { None }
			fn get_comment(&self, _: &AccountId, permlink: &str) -> Option<CommentInfo> {
				assert_eq!(permlink, "my-post", "parent_permlink must reach get_comment unchanged");
				Some(CommentInfo { depth: self.0 })
			}
			fn effective_stake(&self, _: &AccountId) -> u64 { 0 }
			fn total_stake(&self) -> u64 { 0 }
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

		let ok = Engine(SOFT_MAX_COMMENT_DEPTH - 1);
		let op = Operation::Comment {
			parent_author: Some(AccountId::from("bob")),
			parent_permlink: Some("my-post".to_owned()),
		};
		PolicyChecker::check_operation(&ok, &AccountId::from("alice"), &op).unwrap();

		let over = Engine(SOFT_MAX_COMMENT_DEPTH);
		let err = PolicyChecker::check_operation(&over, &AccountId::from("alice"), &op).unwrap_err();
		assert_eq!(err, PolicyError::CommentDepthExceeded { actual: SOFT_MAX_COMMENT_DEPTH, max: SOFT_MAX_COMMENT_DEPTH });
	}
}
