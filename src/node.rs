// src/node.rs
// Bundles the pieces every part of the node is wired against: the guarded
// State, the observability sink, the outbound HTTP client, this node's own
// identity, and the pluggable block digest.

use std::sync::Arc;

use crate::crypto::{BlockDigest, FastDigest};
use crate::events::EventSink;
use crate::state::State;

pub struct Node {
    pub state: State,
    pub events: EventSink,
    pub http: reqwest::Client,
    /// This node's own port — embedded as `mined_by` on blocks it seals.
    pub port: u16,
    pub digest: Arc<dyn BlockDigest + Send + Sync>,
}

impl Node {
    pub fn new(port: u16, is_miner: bool, seed_peers: impl IntoIterator<Item = u16>) -> Self {
        Node {
            state: State::new(is_miner, seed_peers),
            events: EventSink::new(),
            http: reqwest::Client::new(),
            port,
            digest: Arc::new(FastDigest),
        }
    }
}
