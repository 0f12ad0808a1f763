// src/miner.rs
// The background miner. Snapshot-mine-commit: the lock is held only for
// the two bounded critical sections around picking a job and committing
// it; proof-of-work in between runs with no lock held at all.

use std::sync::Arc;

use log::info;
use rand::seq::SliceRandom;
use tokio::sync::watch;
use uuid::Uuid;

use crate::broadcast;
use crate::chain::{create_block, hash_block, mine_block, BallotEnvelope, Block};
use crate::config::{BLOCK_BALLOT_COUNT, MINER_IDLE_POLL, MINING_DIFFICULTY};
use crate::events::NodeInfo;
use crate::node::Node;

struct MiningJob {
    election: Uuid,
    ballots: Vec<BallotEnvelope>,
    previous_hash: String,
    previous_id: Uuid,
    height: usize,
}

/// Run the miner loop until `shutdown` reports true. Only ever spawned when
/// the node was started with `--mine`.
pub async fn run(node: Arc<Node>, mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let job = pick_job(&node);

        let Some(job) = job else {
            tokio::select! {
                _ = tokio::time::sleep(MINER_IDLE_POLL) => {}
                _ = shutdown.changed() => {}
            }
            continue;
        };

        info!("started mining block {} for election {}", job.height, job.election);
        node.state.with(|inner| {
            inner.mining_height = Some(job.height);
        });
        node.events.emit(node.state.with(|inner| NodeInfo::from_state(inner)));

        let unsealed = create_block(
            job.election,
            job.ballots.clone(),
            job.previous_hash.clone(),
            job.previous_id,
            node.port,
        );
        // Proof-of-work: no lock held across this call.
        let block = mine_block(unsealed, node.digest.as_ref(), MINING_DIFFICULTY);

        commit(&node, job, block).await;
    }
}

/// Pick a mineable election and snapshot the ballots/tip it would extend.
/// Released back to the caller with the lock already dropped.
fn pick_job(node: &Arc<Node>) -> Option<MiningJob> {
    node.state.with(|inner| {
        let mineable: Vec<Uuid> = inner
            .mempools
            .iter()
            .filter(|(_, mempool)| mempool.len() >= BLOCK_BALLOT_COUNT)
            .map(|(id, _)| *id)
            .collect();

        let election_id = *mineable.choose(&mut rand::thread_rng())?;

        let mempool = inner.mempools.get(&election_id)?;
        let ballots: Vec<BallotEnvelope> = mempool
            .values()
            .take(BLOCK_BALLOT_COUNT)
            .cloned()
            .collect();

        let election = inner.elections.get(&election_id)?;
        let tip = election.tip();
        let previous_hash = hash_block(tip, node.digest.as_ref());

        Some(MiningJob {
            election: election_id,
            ballots,
            previous_hash,
            previous_id: tip.header.id(),
            height: election.chain.len() + 1,
        })
    })
}

/// Remove the mined ballots from the mempool (tolerating concurrent
/// removal by a racing block admission) and append the block
/// unconditionally, without re-checking that the local tip is still the
/// one this block extends. A concurrently admitted block can race this
/// append and leave two blocks referencing the same previous id.
async fn commit(node: &Arc<Node>, job: MiningJob, block: Block) {
    node.state.with(|inner| {
        if let Some(mempool) = inner.mempools.get_mut(&job.election) {
            for envelope in &job.ballots {
                mempool.shift_remove(&envelope.ballot.id);
            }
        }
        if let Some(election) = inner.elections.get_mut(&job.election) {
            election.chain.push(block.clone());
        }
        inner.mining_height = None;
    });

    info!("finished mining block {} for election {}", job.height, job.election);
    node.events.emit(node.state.with(|inner| NodeInfo::from_state(inner)));

    tokio::spawn(broadcast::broadcast_block(node.clone(), block));
}
