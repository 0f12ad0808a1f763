// src/chain/election.rs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ballot::BallotEnvelope;
use super::block::{Block, BlockHeader};

/// An independent ledger identified by its genesis block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Election {
    pub id: Uuid,
    pub label: String,
    pub chain: Vec<Block>,
}

/// Insertion-ordered pool of admitted, unsealed ballots for one election.
pub type Mempool = IndexMap<Uuid, BallotEnvelope>;

/// Build an `Election` from a freshly created genesis block.
pub fn create_chain(genesis: Block) -> Election {
    let (id, label) = match &genesis.header {
        BlockHeader::Genesis { id, label, .. } => (*id, label.clone()),
        BlockHeader::Regular { .. } => {
            unreachable!("create_chain is only ever called with a genesis block")
        }
    };
    Election {
        id,
        label,
        chain: vec![genesis],
    }
}

impl Election {
    pub fn genesis(&self) -> &Block {
        &self.chain[0]
    }

    pub fn tip(&self) -> &Block {
        self.chain.last().expect("chain is always non-empty")
    }

    pub fn verifying_keys(&self) -> &[String] {
        match &self.genesis().header {
            BlockHeader::Genesis { verifying_keys, .. } => verifying_keys,
            BlockHeader::Regular { .. } => unreachable!("chain[0] is always a genesis block"),
        }
    }

    pub fn candidates(&self) -> &[String] {
        match &self.genesis().header {
            BlockHeader::Genesis { candidates, .. } => candidates,
            BlockHeader::Regular { .. } => unreachable!("chain[0] is always a genesis block"),
        }
    }

    pub fn contains_block_id(&self, id: Uuid) -> bool {
        self.chain.iter().any(|b| b.header.id() == id)
    }
}

/// Whether `vk` appears in the genesis verifying-key list of `election`.
pub fn key_in_election(vk: &str, election: &Election) -> bool {
    election.verifying_keys().iter().any(|k| k == vk)
}

/// Whether `vk` has already cast a ballot on this election, either
/// confirmed (in a block of the chain) or unconfirmed (in the mempool).
pub fn key_already_used(vk: &str, election: &Election, mempool: &Mempool) -> bool {
    let in_chain = election
        .chain
        .iter()
        .flat_map(|b| b.ballots.iter())
        .any(|envelope| envelope.ballot.verifying_key == vk);
    if in_chain {
        return true;
    }
    mempool
        .values()
        .any(|envelope| envelope.ballot.verifying_key == vk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ballot::create_ballot;
    use crate::chain::block::create_genesis;

    fn election_with_keys(keys: Vec<String>) -> Election {
        let genesis = create_genesis("E".into(), vec!["A".into(), "B".into()], keys);
        create_chain(genesis)
    }

    #[test]
    fn key_in_election_checks_genesis_list() {
        let election = election_with_keys(vec!["vk1".into(), "vk2".into()]);
        assert!(key_in_election("vk1", &election));
        assert!(!key_in_election("vk3", &election));
    }

    #[test]
    fn key_already_used_checks_mempool_and_chain() {
        let election = election_with_keys(vec!["vk1".into()]);
        let mut mempool = Mempool::new();
        assert!(!key_already_used("vk1", &election, &mempool));

        let ballot = create_ballot(election.id, vec!["A".into()], "vk1".into());
        mempool.insert(
            ballot.id,
            BallotEnvelope {
                ballot,
                signature: "sig".into(),
            },
        );
        assert!(key_already_used("vk1", &election, &mempool));
    }
}
