mod cli;
mod example_engine;
mod example_peer;

use clap::Parser;
use witness_primitives::{AccountId, SkipFlags};
use witness_producer::{check_startup_preconditions, KeyStore, ProductionLoop, RuntimeFlags};

use crate::{cli::Cli, example_engine::ExampleChainEngine, example_peer::LoggingPeerLayer};

#[tokio::main]
async fn main() {
	env_logger::init();
	let cli = Cli::parse();
	match serde_json::to_string(&cli) {
		Ok(config) => log::info!(target: "witness::producer", "starting with config: {config}"),
		Err(err) => log::warn!(target: "witness::producer", "failed to serialize startup config: {err}"),
	}

	let producers: Vec<AccountId> = cli.witness.iter().map(|s| AccountId::from(s.as_str())).collect();
	let key_store = match KeyStore::new(producers.clone(), cli.private_key.clone()) {
		Ok(store) => store,
		Err(err) => {
			log::error!(target: "witness::producer", "fatal startup error: {err}");
			std::process::exit(1);
		},
	};

	if let Err(err) =
		check_startup_preconditions(&key_store, cli.witness_skip_enforce_bandwidth, false)
	{
		log::error!(target: "witness::producer", "fatal startup error: {err}");
		std::process::exit(1);
	}

	if key_store.is_empty() {
		log::info!(target: "witness::producer", "no producer configured; production loop not started");
		return;
	}

	let mut skip_flags = SkipFlags::NONE;
	if cli.enable_stale_production {
		skip_flags = skip_flags.with(SkipFlags::SKIP_UNDO_HISTORY);
	}

	let flags = RuntimeFlags {
		production_enabled: cli.enable_stale_production,
		required_participation: cli.required_participation,
		skip_flags,
		skip_enforce_bandwidth: cli.witness_skip_enforce_bandwidth,
		genesis_time: 0,
	};

	let engine = ExampleChainEngine::new(0, producers);
	let peer = LoggingPeerLayer::default();
	let loop_ = ProductionLoop::new(engine, peer, key_store, flags);

	let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
	if let Err(err) = loop_.run(shutdown_rx).await {
		log::error!(target: "witness::producer", "fatal producer exception: {err}");
		std::process::exit(1);
	}
}
