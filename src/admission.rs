// src/admission.rs
// Admission engine. Three paths for externally-delivered artifacts
// (election/ballot/block), each silently idempotent and never failing the
// caller, plus the two local-origination paths that do report precondition
// violations.

use std::sync::Arc;

use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::broadcast;
use crate::chain::{
    self, create_ballot, create_chain, create_genesis, key_already_used, key_in_election,
    verify_block, BallotEnvelope, Block, BlockHeader, Election,
};
use crate::config::MINING_DIFFICULTY;
use crate::crypto::{generate_keypairs, sign_ballot, verify_signature, verifying_key_from_signing_key};
use crate::error::NodeError;
use crate::events::NodeInfo;
use crate::node::Node;

/// Admit a whole `Election`. A no-op if its id is already known.
pub async fn admit_election(node: &Arc<Node>, election: Election) {
    let (transitioned, info) = node.state.with(|inner| {
        if inner.elections.contains_key(&election.id) {
            return (false, None);
        }
        inner.elections.insert(election.id, election.clone());
        inner.mempools.insert(election.id, chain::Mempool::new());
        (true, Some(NodeInfo::from_state(inner)))
    });

    if transitioned {
        info!("received election {}", election.id);
        if let Some(node_info) = info {
            node.events.emit(node_info);
        }
        tokio::spawn(broadcast::broadcast_election(node.clone(), election));
    }
}

/// Admit a signed ballot. Silently rejected unless every eligibility and
/// signature check passes.
pub async fn admit_ballot(node: &Arc<Node>, envelope: BallotEnvelope) {
    let accepted = node.state.with(|inner| {
        let election = inner.elections.get(&envelope.ballot.election)?;
        let mempool = inner.mempools.get(&envelope.ballot.election)?;

        if mempool.contains_key(&envelope.ballot.id) {
            return None;
        }
        if !key_in_election(&envelope.ballot.verifying_key, election) {
            return None;
        }
        if key_already_used(&envelope.ballot.verifying_key, election, mempool) {
            return None;
        }
        if !verify_signature(&envelope.ballot, &envelope.signature, &envelope.ballot.verifying_key) {
            return None;
        }

        inner
            .mempools
            .get_mut(&envelope.ballot.election)
            .expect("checked above")
            .insert(envelope.ballot.id, envelope.clone());
        Some(())
    });

    if accepted.is_some() {
        info!("received ballot {}", envelope.ballot.id);
        tokio::spawn(broadcast::broadcast_ballot(node.clone(), envelope));
    }
}

/// Admit a sealed block. Silently rejected unless it extends the local
/// tip and satisfies proof-of-work; forks are rejected outright, never
/// reconciled.
pub async fn admit_block(node: &Arc<Node>, block: Block) {
    let (election_id, previous_id) = match &block.header {
        BlockHeader::Regular {
            election,
            previous_id,
            ..
        } => (*election, *previous_id),
        BlockHeader::Genesis { .. } => return,
    };

    let accepted = node.state.with(|inner| {
        let election = inner.elections.get(&election_id)?;

        if !verify_block(&block, node.digest.as_ref(), MINING_DIFFICULTY) {
            return None;
        }
        if election.contains_block_id(block.header.id()) {
            return None;
        }
        if election.tip().header.id() != previous_id {
            return None;
        }

        if let Some(mempool) = inner.mempools.get_mut(&election_id) {
            for envelope in &block.ballots {
                mempool.shift_remove(&envelope.ballot.id);
            }
        }
        inner
            .elections
            .get_mut(&election_id)
            .expect("checked above")
            .chain
            .push(block.clone());
        Some(())
    });

    if accepted.is_some() {
        info!("received block {}", block.header.id());
        tokio::spawn(broadcast::broadcast_block(node.clone(), block));
    }
}

/// Response body for `POST /new_election`.
#[derive(Debug, Serialize)]
pub struct NewElectionResponse {
    pub id: Uuid,
    pub label: String,
    pub time: f64,
    pub candidates: Vec<String>,
    pub verifying_keys: Vec<String>,
    pub signing_keys: Vec<String>,
}

/// Create and locally admit a new election, returning the freshly generated
/// key material to the caller. The signing keys never leave this response.
pub async fn new_election(
    node: &Arc<Node>,
    label: String,
    candidates: Vec<String>,
    ballot_count: usize,
) -> Result<NewElectionResponse, NodeError> {
    if label.trim().is_empty() || candidates.is_empty() || ballot_count == 0 {
        return Err(NodeError::BadRequest(
            "label, candidates, and a positive ballot_count are required".into(),
        ));
    }

    let (signing_keys, verifying_keys) = generate_keypairs(ballot_count);
    let genesis = create_genesis(label, candidates, verifying_keys.clone());
    let (id, label, timestamp, candidates) = match &genesis.header {
        BlockHeader::Genesis {
            id,
            label,
            timestamp,
            candidates,
            ..
        } => (*id, label.clone(), *timestamp, candidates.clone()),
        BlockHeader::Regular { .. } => unreachable!(),
    };
    let election = create_chain(genesis);

    admit_election(node, election).await;
    info!("created election {}", id);

    Ok(NewElectionResponse {
        id,
        label,
        time: timestamp,
        candidates,
        verifying_keys,
        signing_keys,
    })
}

/// Derive the voter's key, run the same eligibility checks as
/// `admit_ballot`, then construct, sign, and admit the ballot.
pub async fn cast_ballot(
    node: &Arc<Node>,
    signing_key: String,
    candidates: Vec<String>,
    election: Uuid,
) -> Result<BallotEnvelope, NodeError> {
    let verifying_key = verifying_key_from_signing_key(&signing_key)
        .ok_or_else(|| NodeError::BadRequest("malformed signing_key".into()))?;

    let envelope = node.state.with(|inner| -> Result<BallotEnvelope, NodeError> {
        let election_obj = inner
            .elections
            .get(&election)
            .ok_or_else(|| NodeError::Precondition("unknown election".into()))?;

        if !key_in_election(&verifying_key, election_obj) {
            return Err(NodeError::Precondition("key is not eligible to vote in this election".into()));
        }

        let mempool = inner
            .mempools
            .get(&election)
            .ok_or_else(|| NodeError::Precondition("unknown election".into()))?;

        if key_already_used(&verifying_key, election_obj, mempool) {
            return Err(NodeError::Precondition("key has already cast a ballot".into()));
        }

        let ballot = create_ballot(election, candidates, verifying_key.clone());
        let signature = sign_ballot(&ballot, &signing_key)
            .ok_or_else(|| NodeError::BadRequest("malformed signing_key".into()))?;
        let envelope = BallotEnvelope { ballot, signature };

        inner
            .mempools
            .get_mut(&election)
            .expect("checked above")
            .insert(envelope.ballot.id, envelope.clone());

        Ok(envelope)
    })?;

    info!("cast ballot {}", envelope.ballot.id);
    tokio::spawn(broadcast::broadcast_ballot(node.clone(), envelope.clone()));

    Ok(envelope)
}
