//! Deterministic accounting and policy state for the witness subsystem:
//! the chain-engine collaborator interface, policy checks, bandwidth
//! metering, reserve-ratio control, and the event dispatcher that wires
//! them to the five chain-apply hooks.

pub mod bandwidth;
pub mod chain;
pub mod events;
pub mod policy;
pub mod reserve_ratio;

pub use bandwidth::{BandwidthError, BandwidthMeter};
pub use chain::ChainEngine;
pub use events::EventBinding;
pub use policy::{PolicyChecker, PolicyError};
pub use reserve_ratio::{ReserveRatioController, ReserveRatioSnapshot};
