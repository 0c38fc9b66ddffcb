/// dms3-namesys - resolve names from the command line
///
/// Resolves each argument through DNS and proquint resolvers, with an
/// in-memory value store standing in for the network.

use anyhow::Context;
use namesys::{
    namesys::HickoryTxtLookup,
    store::{MemoryDatastore, MemoryValueStore},
    CancellationToken, Depth, NameError, NameSysConfig, NameSystem, ResolveOptions,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = NameSysConfig::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("namesys={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        eprintln!("usage: dms3-namesys <name>...");
        std::process::exit(2);
    }

    let txt_lookup =
        HickoryTxtLookup::from_config(&config.dns).context("Failed to create DNS resolver")?;
    let name_system = NameSystem::new(
        Arc::new(MemoryValueStore::new()),
        Arc::new(MemoryDatastore::new()),
        Arc::new(txt_lookup),
        &config,
    );

    info!(
        cache_size = config.cache.size,
        depth_limit = config.resolve.depth_limit,
        "Name system ready"
    );

    // Ctrl-C cancels whatever resolution is in flight
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let options = ResolveOptions::new().depth(Depth::limited(config.resolve.depth_limit));
    let mut failed = false;

    for name in &names {
        match name_system.resolve(&cancel, name, &options).await {
            Ok(path) => println!("{}", path),
            Err(NameError::RecursionLimitReached { path }) => {
                println!("{}", path);
                error!(name = %name, "Recursion limit reached before a content path");
                failed = true;
            }
            Err(e) => {
                error!(name = %name, error = %e, "Resolution failed");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
