// src/config.rs
// Command-line configuration for a blockvote node.

use clap::Parser;

/// Number of ballots stored in a single (non-genesis) block.
pub const BLOCK_BALLOT_COUNT: usize = 4;

/// Number of leading hex zero nibbles a block's digest must have.
pub const MINING_DIFFICULTY: usize = 2;

/// Delay before the discover warm-up task starts querying seed peers.
pub const DISCOVER_WARMUP: std::time::Duration = std::time::Duration::from_secs(5);

/// How long the miner sleeps between idle polls when no election is mineable.
pub const MINER_IDLE_POLL: std::time::Duration = std::time::Duration::from_secs(1);

/// The lowest port a node can run on; other nodes are addressed by port alone.
pub const BASE_PORT: u16 = 5000;

/// Run a node on the blockvote blockchain.
#[derive(Parser, Debug, Clone)]
#[command(about = "Run a node on the blockvote blockchain", long_about = None)]
pub struct Args {
    /// Port this node listens on.
    #[arg(short, long, default_value_t = BASE_PORT)]
    pub port: u16,

    /// Ports of seed peers to contact at startup.
    #[arg(short, long, num_args = 0..)]
    pub servers: Vec<u16>,

    /// Run the background miner.
    #[arg(short, long, default_value_t = false)]
    pub mine: bool,
}

impl Args {
    /// This node's own base URL, as peers address it.
    pub fn base_url(&self) -> String {
        build_url(self.port, "")
    }
}

/// Construct a fully-qualified node URL from a port and a path with a leading slash.
pub fn build_url(port: u16, path: &str) -> String {
    format!("http://localhost:{}{}", port, path)
}
