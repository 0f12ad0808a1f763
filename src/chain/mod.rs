// src/chain/mod.rs
// Pure constructors and predicates over elections, blocks, and ballots.
// Nothing in this module touches I/O or a lock.

pub mod ballot;
pub mod block;
pub mod election;

pub use ballot::{create_ballot, Ballot, BallotEnvelope};
pub use block::{create_block, create_genesis, hash_block, mine_block, verify_block, Block, BlockHeader};
pub use election::{create_chain, key_already_used, key_in_election, Election, Mempool};
