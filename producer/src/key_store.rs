//! Key Store (§4.6): the producer set the node controls and its key ring.
//! Both are parsed once at startup and read-only thereafter.

use std::collections::{HashMap, HashSet};

use witness_core::chain::AccountAuthorities;
use witness_primitives::{
	keys::{KeyError, PrivateKey, PublicKey},
	AccountId,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
	#[error("invalid private key: {0}")]
	InvalidPrivateKey(#[from] KeyError),
	#[error("a producer is configured but witness-skip-enforce-bandwidth is off while the resource-credit subsystem's reject-on-insufficient-credit flag is on")]
	ConflictingBandwidthFlags,
}

/// Producer set plus public-key → private-key ring, immutable after
/// construction.
pub struct KeyStore {
	producers: HashSet<AccountId>,
	keys: HashMap<PublicKey, PrivateKey>,
}

impl KeyStore {
	/// Parses every WIF in `private_keys`; a single malformed key is a fatal
	/// startup error (§7 "Startup error").
	pub fn new(producers: Vec<AccountId>, private_keys: Vec<String>) -> Result<Self, StartupError> {
		let mut keys = HashMap::with_capacity(private_keys.len());
		for wif in private_keys {
			let key = PrivateKey::from_wif(&wif)?;
			keys.insert(key.public_key(), key);
		}
		Ok(Self { producers: producers.into_iter().collect(), keys })
	}

	pub fn is_empty(&self) -> bool {
		self.producers.is_empty()
	}

	pub fn controls(&self, producer: &AccountId) -> bool {
		self.producers.contains(producer)
	}

	/// Finds the signing key for `producer` by intersecting its on-chain
	/// authority keys with our key ring, preferring the active authority
	/// (the conventional witness-signing role) over owner.
	pub fn signing_key_for(&self, authorities: &AccountAuthorities) -> Option<&PrivateKey> {
		authorities
			.active_keys
			.iter()
			.chain(authorities.owner_keys.iter())
			.find_map(|public_key| self.keys.get(public_key))
	}

	pub fn producers(&self) -> impl Iterator<Item = &AccountId> {
		self.producers.iter()
	}
}

/// Validates the §6 startup preconditions that don't belong to key parsing
/// itself: a configured producer set requires bandwidth enforcement to be
/// off and the sibling resource-credit subsystem to be permissive.
pub fn check_startup_preconditions(
	key_store: &KeyStore,
	skip_enforce_bandwidth: bool,
	resource_credit_rejects_insufficient: bool,
) -> Result<(), StartupError> {
	if key_store.is_empty() {
		return Ok(());
	}
	if !skip_enforce_bandwidth || resource_credit_rejects_insufficient {
		return Err(StartupError::ConflictingBandwidthFlags);
	}
	Ok(())
}
