// src/events.rs
// The observability push channel. An injected sink with a single `emit`
// operation; the HTTP layer (api::ws_handler) is the one concrete
// transport wired on top of it.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::state::Inner;

/// Lightweight node-info record, pushed on connect and on every state
/// transition: election added, mining started/stopped.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub nodes: Vec<u16>,
    pub blockchain_count: usize,
    pub is_miner: bool,
    pub mining: Option<usize>,
}

impl NodeInfo {
    pub fn from_state(inner: &Inner) -> Self {
        NodeInfo {
            nodes: inner.peer_list(),
            blockchain_count: inner.elections.len(),
            is_miner: inner.is_miner,
            mining: inner.mining_height,
        }
    }
}

/// An injected sink for `NodeInfo` transitions. Cloning is cheap — every
/// clone shares the same underlying channel.
#[derive(Clone)]
pub struct EventSink {
    tx: broadcast::Sender<NodeInfo>,
}

impl EventSink {
    pub fn new() -> Self {
        // Bounded at a small backlog: a slow subscriber just misses
        // intermediate transitions and gets the latest on reconnect, which
        // matches the "push on each transition" contract without requiring
        // unbounded buffering for a channel nobody is obligated to drain.
        let (tx, _rx) = broadcast::channel(32);
        EventSink { tx }
    }

    pub fn emit(&self, info: NodeInfo) {
        // No subscribers is not an error — the channel is best-effort.
        let _ = self.tx.send(info);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeInfo> {
        self.tx.subscribe()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}
