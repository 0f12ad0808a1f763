// src/lib.rs
// The replicated voting ledger, exposed as a library so both `main.rs`
// and the integration tests under `tests/` can drive it.

pub mod admission;
pub mod api;
pub mod broadcast;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod miner;
pub mod node;
pub mod state;

use std::sync::Arc;

use log::info;
use tokio::sync::watch;

pub use config::Args;
pub use node::Node;

/// Build a node and run it until a ctrl-c or `shutdown` fires. This wires
/// the admission engine, miner, broadcast layer, and HTTP surface together;
/// `main.rs` only needs to parse arguments and call this.
pub async fn run(args: Args) -> anyhow::Result<()> {
    let node = Arc::new(Node::new(args.port, args.mine, args.servers.clone()));

    if args.mine {
        info!("miner started on {}", args.port);
    } else {
        info!("node started on {}", args.port);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(broadcast::discover(node.clone()));

    if args.mine {
        tokio::spawn(miner::run(node.clone(), shutdown_rx));
    }

    let app = api::router(node.clone());
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}
