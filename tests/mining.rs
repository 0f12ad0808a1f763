// Integration tests for the background miner, exercised against a real
// `Node` and a spawned `miner::run` task rather than by calling its
// private helpers directly.

use std::sync::Arc;
use std::time::Duration;

use blockvote_node::chain::{create_block, hash_block, mine_block};
use blockvote_node::config::MINING_DIFFICULTY;
use blockvote_node::{admission, miner, node::Node};
use tokio::sync::watch;

fn test_node() -> Arc<Node> {
    Arc::new(Node::new(5002, true, vec![]))
}

async fn cast_n_ballots(node: &Arc<Node>, election_id: uuid::Uuid, signing_keys: &[String], n: usize) {
    for signing_key in signing_keys.iter().take(n) {
        admission::cast_ballot(node, signing_key.clone(), vec!["A".into()], election_id)
            .await
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_full_mempool_is_mined_into_a_new_block() {
    let node = test_node();
    let created = admission::new_election(&node, "E".into(), vec!["A".into(), "B".into()], 4)
        .await
        .unwrap();
    cast_n_ballots(&node, created.id, &created.signing_keys, 4).await;

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let miner_node = node.clone();
    let handle = tokio::spawn(miner::run(miner_node, shutdown_rx));

    let mined = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let chain_len = node.state.with(|inner| inner.elections.get(&created.id).unwrap().chain.len());
            if chain_len == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    handle.abort();
    assert!(mined.is_ok(), "miner did not seal a block within the timeout");

    let (chain_len, mempool_len) = node.state.with(|inner| {
        (
            inner.elections.get(&created.id).unwrap().chain.len(),
            inner.mempools.get(&created.id).unwrap().len(),
        )
    });
    assert_eq!(chain_len, 2);
    assert_eq!(mempool_len, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_election_with_too_few_ballots_is_never_mined() {
    let node = test_node();
    let created = admission::new_election(&node, "E".into(), vec!["A".into(), "B".into()], 4)
        .await
        .unwrap();
    cast_n_ballots(&node, created.id, &created.signing_keys, 3).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let miner_node = node.clone();
    let handle = tokio::spawn(miner::run(miner_node, shutdown_rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;

    let (chain_len, mempool_len) = node.state.with(|inner| {
        (
            inner.elections.get(&created.id).unwrap().chain.len(),
            inner.mempools.get(&created.id).unwrap().len(),
        )
    });
    assert_eq!(chain_len, 1);
    assert_eq!(mempool_len, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mining_picks_among_several_mineable_elections_without_starving_any_forever() {
    let node = test_node();
    let first = admission::new_election(&node, "First".into(), vec!["A".into()], 4).await.unwrap();
    let second = admission::new_election(&node, "Second".into(), vec!["A".into()], 4).await.unwrap();
    cast_n_ballots(&node, first.id, &first.signing_keys, 4).await;
    cast_n_ballots(&node, second.id, &second.signing_keys, 4).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let miner_node = node.clone();
    let handle = tokio::spawn(miner::run(miner_node, shutdown_rx));

    let both_mined = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let (a, b) = node.state.with(|inner| {
                (
                    inner.elections.get(&first.id).unwrap().chain.len(),
                    inner.elections.get(&second.id).unwrap().chain.len(),
                )
            });
            if a == 2 && b == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;

    assert!(both_mined.is_ok(), "both elections should eventually be mined");
}

/// Exercises the designed-in race in `miner::commit`: it appends its mined
/// block unconditionally, without re-checking that the snapshot tip it
/// mined against is still the chain's tip. Racing a directly-admitted
/// block against the miner for the same extension point must not panic or
/// deadlock, even though it can leave the chain with two blocks both
/// naming the same `previous_id`.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_block_admitted_while_mining_races_the_miners_unconditional_append() {
    let node = test_node();
    let created = admission::new_election(&node, "E".into(), vec!["A".into(), "B".into()], 4)
        .await
        .unwrap();
    cast_n_ballots(&node, created.id, &created.signing_keys, 4).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let miner_node = node.clone();
    let handle = tokio::spawn(miner::run(miner_node, shutdown_rx));

    // Give the miner a moment to snapshot the genesis tip before we race it
    // with a directly-admitted block extending that same tip.
    tokio::time::sleep(Duration::from_millis(10)).await;

    let genesis = node
        .state
        .with(|inner| inner.elections.get(&created.id).unwrap().chain[0].clone());
    let genesis_hash = hash_block(&genesis, node.digest.as_ref());
    let rival = create_block(created.id, vec![], genesis_hash, genesis.header.id(), 9999);
    let rival = mine_block(rival, node.digest.as_ref(), MINING_DIFFICULTY);
    let rival_id = rival.header.id();
    admission::admit_block(&node, rival).await;

    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let len = node.state.with(|inner| inner.elections.get(&created.id).unwrap().chain.len());
            if len >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;

    assert!(settled.is_ok(), "neither the rival block nor the miner ever extended the chain");

    // However the race resolved — the rival landing before or after the
    // miner's commit — the chain must stay internally sane: the rival
    // appears at most once (admission never double-inserts), and the chain
    // never shrinks or loses a block that was accepted.
    let chain = node.state.with(|inner| inner.elections.get(&created.id).unwrap().chain.clone());
    let rival_occurrences = chain.iter().filter(|b| b.header.id() == rival_id).count();
    assert!(rival_occurrences <= 1, "the directly-admitted block must never be duplicated");
    assert!(chain.len() >= 2, "at least one of the rival or the miner must have extended the chain");
}
