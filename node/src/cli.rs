//! CLI surface (§6 Configuration surface).

use clap::Parser;
use serde::Serialize;

/// The CLI surface, echoed to the log at startup so operators can confirm
/// what the node was actually launched with. `private_key` is excluded from
/// the echo since WIF secrets must never be written to a log.
#[derive(Debug, Parser, Serialize)]
#[command(name = "witness-node", about = "Witness (block-producing) subsystem")]
pub struct Cli {
	/// A producer identifier the node will produce for. Repeatable.
	#[arg(long = "witness")]
	pub witness: Vec<String>,

	/// A WIF-encoded private key. Repeatable.
	#[arg(long = "private-key")]
	#[serde(skip_serializing)]
	pub private_key: Vec<String>,

	/// Allow producing before the node has caught up to wall time; also
	/// enables the skip-undo-history flag on generated blocks.
	#[arg(long = "enable-stale-production", default_value_t = false)]
	pub enable_stale_production: bool,

	/// Percent of the producer set that must be reported participating.
	#[arg(long = "required-participation", default_value_t = 33)]
	pub required_participation: u8,

	/// If on, the bandwidth cap is computed but not enforced.
	#[arg(long = "witness-skip-enforce-bandwidth", default_value_t = true)]
	pub witness_skip_enforce_bandwidth: bool,
}
