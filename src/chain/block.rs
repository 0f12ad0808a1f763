// src/chain/block.rs

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::ballot::BallotEnvelope;
use crate::crypto::canonical::canonical_bytes;
use crate::crypto::digest::BlockDigest;

/// A block header, in one of two shapes.
///
/// The genesis header opens an election; every other header extends it.
/// Modelling this as a tagged enum (rather than one struct with optional
/// fields, as the original Python dict allowed) means a `Regular` header is
/// statically guaranteed to carry `previous_id`/`previous_hash`/`mined_by`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum BlockHeader {
    Genesis {
        id: Uuid,
        timestamp: f64,
        label: String,
        candidates: Vec<String>,
        verifying_keys: Vec<String>,
        nonce: u64,
    },
    Regular {
        id: Uuid,
        election: Uuid,
        timestamp: f64,
        previous_id: Uuid,
        previous_hash: String,
        nonce: u64,
        mined_by: u16,
    },
}

impl BlockHeader {
    pub fn id(&self) -> Uuid {
        match self {
            BlockHeader::Genesis { id, .. } => *id,
            BlockHeader::Regular { id, .. } => *id,
        }
    }

    fn nonce_mut(&mut self) -> &mut u64 {
        match self {
            BlockHeader::Genesis { nonce, .. } => nonce,
            BlockHeader::Regular { nonce, .. } => nonce,
        }
    }
}

/// A proof-of-work-sealed batch of ballots (empty, for a genesis block).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    pub ballots: Vec<BallotEnvelope>,
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the unix epoch")
        .as_secs_f64()
}

/// Create a genesis block opening a new election. Its id doubles as the
/// election's id.
pub fn create_genesis(label: String, candidates: Vec<String>, verifying_keys: Vec<String>) -> Block {
    Block {
        header: BlockHeader::Genesis {
            id: Uuid::new_v4(),
            timestamp: now_secs(),
            label,
            candidates,
            verifying_keys,
            nonce: 0,
        },
        ballots: vec![],
    }
}

/// Create a regular block extending `previous_id`/`previous_hash`, with its
/// nonce at zero — not yet mined.
pub fn create_block(
    election: Uuid,
    ballots: Vec<BallotEnvelope>,
    previous_hash: String,
    previous_id: Uuid,
    mined_by: u16,
) -> Block {
    Block {
        header: BlockHeader::Regular {
            id: Uuid::new_v4(),
            election,
            timestamp: now_secs(),
            previous_id,
            previous_hash,
            nonce: 0,
            mined_by,
        },
        ballots,
    }
}

/// Hex digest of a block's canonical encoding.
pub fn hash_block(block: &Block, digest: &dyn BlockDigest) -> String {
    digest.digest_hex(&canonical_bytes(block))
}

/// Whether `block`'s digest satisfies the mining difficulty. The only
/// structural check performed on a received block — it does not revalidate
/// ballot signatures, membership, or that `previous_hash` actually hashes
/// the local tip. Genesis blocks carry no proof-of-work and always verify.
pub fn verify_block(block: &Block, digest: &dyn BlockDigest, difficulty: usize) -> bool {
    match &block.header {
        BlockHeader::Genesis { .. } => true,
        BlockHeader::Regular { .. } => {
            let h = hash_block(block, digest);
            h.starts_with(&"0".repeat(difficulty))
        }
    }
}

/// Mine `block` in place: increment its nonce until `verify_block` holds.
/// Runs entirely outside any lock — this is the proof-of-work step.
pub fn mine_block(mut block: Block, digest: &dyn BlockDigest, difficulty: usize) -> Block {
    while !verify_block(&block, digest, difficulty) {
        *block.header.nonce_mut() += 1;
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::digest::FastDigest;

    #[test]
    fn genesis_always_verifies() {
        let g = create_genesis("E".into(), vec!["A".into()], vec![]);
        assert!(verify_block(&g, &FastDigest, MINING_DIFFICULTY_TEST));
    }

    const MINING_DIFFICULTY_TEST: usize = 2;

    #[test]
    fn mined_block_satisfies_difficulty() {
        let g = create_genesis("E".into(), vec!["A".into()], vec![]);
        let prev_hash = hash_block(&g, &FastDigest);
        let block = create_block(g.header.id(), vec![], prev_hash, g.header.id(), 5000);
        let mined = mine_block(block, &FastDigest, MINING_DIFFICULTY_TEST);
        assert!(verify_block(&mined, &FastDigest, MINING_DIFFICULTY_TEST));
    }

    #[test]
    fn hash_is_canonical_regardless_of_field_order() {
        let g = create_genesis("E".into(), vec!["A".into(), "B".into()], vec!["vk".into()]);
        let h1 = hash_block(&g, &FastDigest);
        let g2 = g.clone();
        let h2 = hash_block(&g2, &FastDigest);
        assert_eq!(h1, h2);
    }
}
