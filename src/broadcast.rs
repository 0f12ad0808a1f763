// src/broadcast.rs
// Best-effort fan-out of elections, ballots, and blocks to known peers,
// plus the peer-list warm-up discover task.

use std::sync::Arc;

use log::warn;
use serde_json::json;

use crate::chain::{BallotEnvelope, Block, Election};
use crate::config::{build_url, DISCOVER_WARMUP};
use crate::node::Node;

/// Fan out `election` to every currently known peer. Each peer gets its own
/// detached request so one slow or unreachable peer never blocks the rest.
pub async fn broadcast_election(node: Arc<Node>, election: Election) {
    let peers = node.state.with(|inner| inner.peer_list());
    for peer in peers {
        let http = node.http.clone();
        let election = election.clone();
        tokio::spawn(async move {
            let url = build_url(peer, "/receive_election");
            if let Err(e) = http.post(&url).json(&json!({ "election": election })).send().await {
                warn!("broadcast_election to {} failed: {}", peer, e);
            }
        });
    }
}

/// Fan out a ballot envelope to every currently known peer.
pub async fn broadcast_ballot(node: Arc<Node>, ballot: BallotEnvelope) {
    let peers = node.state.with(|inner| inner.peer_list());
    for peer in peers {
        let http = node.http.clone();
        let ballot = ballot.clone();
        tokio::spawn(async move {
            let url = build_url(peer, "/receive_ballot");
            if let Err(e) = http.post(&url).json(&json!({ "ballot": ballot })).send().await {
                warn!("broadcast_ballot to {} failed: {}", peer, e);
            }
        });
    }
}

/// Fan out a sealed block to every currently known peer.
pub async fn broadcast_block(node: Arc<Node>, block: Block) {
    let peers = node.state.with(|inner| inner.peer_list());
    for peer in peers {
        let http = node.http.clone();
        let block = block.clone();
        tokio::spawn(async move {
            let url = build_url(peer, "/receive_block");
            if let Err(e) = http.post(&url).json(&json!({ "block": block })).send().await {
                warn!("broadcast_block to {} failed: {}", peer, e);
            }
        });
    }
}

/// Warm-up task: after a short delay, ask every seed peer for its peer
/// list. Deliberately does NOT union the returned peers into the local
/// list — only the requester-side effect (the peer learning about *this*
/// node) actually changes anything.
pub async fn discover(node: Arc<Node>) {
    tokio::time::sleep(DISCOVER_WARMUP).await;

    let peers = node.state.with(|inner| inner.peer_list());
    for peer in peers {
        let url = build_url(peer, "/get_nodes");
        match node
            .http
            .get(&url)
            .header("node-port", node.port.to_string())
            .send()
            .await
        {
            Ok(resp) => {
                if let Err(e) = resp.json::<Vec<u16>>().await {
                    warn!("discover: malformed peer list from {}: {}", peer, e);
                }
                // Returned peers are intentionally not merged in — see doc comment above.
            }
            Err(e) => warn!("discover: request to {} failed: {}", peer, e),
        }
    }
}
