//! Key Store, peer-layer collaborator interface, and Block Production Loop
//! for the witness subsystem (§4.5, §4.6).

pub mod key_store;
pub mod peer;
pub mod production_loop;

pub use key_store::{check_startup_preconditions, KeyStore, StartupError};
pub use peer::PeerLayer;
pub use production_loop::{ProductionCondition, ProductionLoop, RuntimeFlags};
