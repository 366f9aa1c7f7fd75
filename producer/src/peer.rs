//! Collaborator interface consumed from the peer layer (§6): block
//! propagation and the production-enabled flag the peer layer surfaces to
//! the rest of the node (e.g. for RPC reporting).
//!
//! Both methods are async: a real peer layer broadcasts over the network,
//! the same reason the chain engine's own worker trait methods are async.

use async_trait::async_trait;
use witness_core::chain::AppliedBlock;

#[async_trait]
pub trait PeerLayer {
	async fn broadcast_block(&mut self, block: &AppliedBlock);
	async fn set_block_production(&mut self, enabled: bool);
}
