// src/chain/ballot.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single ranked-choice vote within one election.
///
/// `candidates` is ordered from highest to lowest preference. Verification
/// of ranking rules (e.g. that every candidate appears at most once) is a
/// later concern and is not performed by admission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ballot {
    pub id: Uuid,
    pub election: Uuid,
    pub candidates: Vec<String>,
    pub verifying_key: String,
}

/// A ballot together with the signature over its canonical encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BallotEnvelope {
    pub ballot: Ballot,
    pub signature: String,
}

/// Construct a ballot with a fresh id.
pub fn create_ballot(election: Uuid, candidates: Vec<String>, verifying_key: String) -> Ballot {
    Ballot {
        id: Uuid::new_v4(),
        election,
        candidates,
        verifying_key,
    }
}
