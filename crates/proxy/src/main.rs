//! Offline mapping-pack validator: load a mappings directory exactly the
//! way the proxy would at startup, report what registered, and optionally
//! print the dispatch-order dump.

use std::path::PathBuf;

use conduit_engine::registry::DispatchRegistry;
use conduit_proxy::{dump, loader};

fn main() {
    let mappings_dir: PathBuf = std::env::args()
        .skip_while(|a| a != "--mappings")
        .nth(1)
        .unwrap_or_else(|| "mappings".into())
        .into();
    let print_dump = std::env::args().any(|a| a == "--dump");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    tracing::info!("Loading custom item mappings from {}", mappings_dir.display());

    let registry = DispatchRegistry::new();
    match loader::reload(&registry, &mappings_dir) {
        Ok(count) => {
            tracing::info!("Mapping pack OK: {} definitions", count);
        }
        Err(e) => {
            tracing::error!("Failed to load mappings: {:#}", e);
            std::process::exit(1);
        }
    }

    if print_dump {
        print!("{}", dump::render(&registry.snapshot()));
    }
}
