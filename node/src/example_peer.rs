//! A trivial peer-layer stand-in: logs what it would have broadcast.

use async_trait::async_trait;
use witness_core::chain::AppliedBlock;
use witness_producer::PeerLayer;

#[derive(Default)]
pub struct LoggingPeerLayer {
	pub broadcast_count: u64,
}

#[async_trait]
impl PeerLayer for LoggingPeerLayer {
	async fn broadcast_block(&mut self, block: &AppliedBlock) {
		self.broadcast_count += 1;
		log::info!(target: "witness::producer", "broadcasting block {}", block.block_num);
	}

	async fn set_block_production(&mut self, enabled: bool) {
		log::info!(target: "witness::producer", "block production {}", if enabled { "enabled" } else { "disabled" });
	}
}
