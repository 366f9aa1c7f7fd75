//! WIF-encoded key parsing and the public/private key types used by the
//! Key Store and the memo-leak policy check.

use secp256k1::{PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

/// A private signing key, parsed from a WIF string at startup.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

/// A public key, derivable from a [`PrivateKey`] or decoded from an authority
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(Secp256k1PublicKey);

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
	#[error("invalid base58 encoding")]
	InvalidBase58,
	#[error("WIF payload has the wrong length")]
	BadLength,
	#[error("WIF checksum mismatch")]
	BadChecksum,
	#[error("invalid secret key bytes")]
	InvalidSecretKey,
}

impl PrivateKey {
	/// Parse a WIF-encoded private key (version byte + 32-byte secret +
	/// optional compression flag + 4-byte double-SHA256 checksum).
	pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
		let raw = bs58::decode(wif).into_vec().map_err(|_| KeyError::InvalidBase58)?;
		if raw.len() != 37 && raw.len() != 38 {
			return Err(KeyError::BadLength);
		}
		let (payload, checksum) = raw.split_at(raw.len() - 4);
		let expected = double_sha256(payload);
		if &expected[..4] != checksum {
			return Err(KeyError::BadChecksum);
		}
		let secret_bytes = &payload[1..33];
		let secret = SecretKey::from_slice(secret_bytes).map_err(|_| KeyError::InvalidSecretKey)?;
		Ok(Self(secret))
	}

	/// Derive a private key deterministically from `SHA-256(seed)`, used both
	/// by [`Self::from_login_seed`] and the memo-leak candidate derivation in
	/// the policy checker.
	pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
		let digest = Sha256::digest(seed);
		let secret = SecretKey::from_slice(&digest).map_err(|_| KeyError::InvalidSecretKey)?;
		Ok(Self(secret))
	}

	/// Derive the public key for a (`account_name`, `role`, `password`) login
	/// triple, the same derivation `check_memo` replays against each of an
	/// account's authority roles.
	pub fn from_login_seed(account: &str, role: &str, password: &str) -> Result<Self, KeyError> {
		let mut seed = Vec::with_capacity(account.len() + role.len() + password.len());
		seed.extend_from_slice(account.as_bytes());
		seed.extend_from_slice(role.as_bytes());
		seed.extend_from_slice(password.as_bytes());
		Self::from_seed(&seed)
	}

	pub fn public_key(&self) -> PublicKey {
		let secp = Secp256k1::new();
		PublicKey(Secp256k1PublicKey::from_secret_key(&secp, &self.0))
	}

	pub fn secret(&self) -> &SecretKey {
		&self.0
	}
}

impl PublicKey {
	pub fn inner(&self) -> &Secp256k1PublicKey {
		&self.0
	}
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
	let first = Sha256::digest(data);
	Sha256::digest(first).into()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn to_wif(secret: &SecretKey) -> String {
		let mut payload = Vec::with_capacity(33);
		payload.push(0x80);
		payload.extend_from_slice(&secret.secret_bytes());
		let checksum = double_sha256(&payload);
		payload.extend_from_slice(&checksum[..4]);
		bs58::encode(payload).into_string()
	}

	#[test]
	fn wif_round_trips() {
		let secret = SecretKey::new(&mut rand::thread_rng());
		let wif = to_wif(&secret);
		let decoded = PrivateKey::from_wif(&wif).unwrap();
		assert_eq!(decoded.secret(), &secret);
	}

	#[test]
	fn bad_checksum_is_rejected() {
		let secret = SecretKey::new(&mut rand::thread_rng());
		let mut wif = to_wif(&secret).into_bytes();
		// Corrupt a character in the encoded string.
		wif[5] = if wif[5] == b'a' { b'b' } else { b'a' };
		let wif = String::from_utf8(wif).unwrap();
		assert!(PrivateKey::from_wif(&wif).is_err());
	}

	#[test]
	fn login_seed_is_deterministic() {
		let a = PrivateKey::from_login_seed("alice", "posting", "pw").unwrap();
		let b = PrivateKey::from_login_seed("alice", "posting", "pw").unwrap();
		assert_eq!(a.public_key(), b.public_key());
	}
}
