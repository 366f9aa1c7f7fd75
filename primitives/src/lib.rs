//! Primitives for the witness (block-producing) subsystem.
//!
//! Some consensus algorithms have a concept of *slots*, which are intervals in
//! time during which certain events can and/or must occur. This crate provides
//! the shared vocabulary (slots, accounts, keys, constants) used by the rest of
//! the witness crates.

pub mod constants;
pub mod keys;

pub use keys::PublicKey;

use std::fmt;

/// A producer (witness) identifier, e.g. an account name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for AccountId {
	fn from(s: &str) -> Self {
		Self(s.to_owned())
	}
}

impl From<String> for AccountId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

/// An integer slot index. Slot 0 means "no slot currently open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Slot(pub u64);

impl Slot {
	/// The sentinel slot meaning "no slot is open".
	pub const NONE: Slot = Slot(0);

	/// Whether this slot is the "no slot open" sentinel.
	pub fn is_none(self) -> bool {
		self.0 == 0
	}
}

impl From<u64> for Slot {
	fn from(v: u64) -> Self {
		Slot(v)
	}
}

impl std::ops::Deref for Slot {
	type Target = u64;

	fn deref(&self) -> &u64 {
		&self.0
	}
}

/// The two bandwidth kinds a per-account record is tracked under.
///
/// `Market` traffic (order-book operations) is charged ten times the weight of
/// ordinary `Forum` traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandwidthKind {
	Forum,
	Market,
}

/// A bitmask of block-generation skip flags forwarded to the chain engine
/// unexamined; the subsystem never interprets individual bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipFlags(pub u32);

impl SkipFlags {
	pub const NONE: SkipFlags = SkipFlags(0);
	/// Bit forwarded when stale production is enabled (skip undo-history checks).
	pub const SKIP_UNDO_HISTORY: SkipFlags = SkipFlags(1 << 0);

	pub fn with(self, other: SkipFlags) -> Self {
		SkipFlags(self.0 | other.0)
	}
}
