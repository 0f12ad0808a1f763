// src/crypto/digest.rs
// Block digest: pluggable so a cryptographically strong hash can be swapped
// in for the fast default without touching any call site.

use sha2::{Digest as _, Sha256};

/// A digest algorithm usable for block hashing.
///
/// The design deliberately keeps this pluggable: the default
/// implementation (`FastDigest`) is a fast, non-cryptographic hash sized to
/// support a toy mining difficulty, matching the original node's choice of
/// `md5` "for performance reasons during testing". `StrongDigest` is the
/// substitute a production deployment would reach for.
pub trait BlockDigest {
    /// Hex-lowercase digest of `bytes`.
    fn digest_hex(&self, bytes: &[u8]) -> String;
}

/// Fast, non-cryptographic digest (ahash). Default for mining/verification.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastDigest;

impl BlockDigest for FastDigest {
    fn digest_hex(&self, bytes: &[u8]) -> String {
        // ahash's fixed-key hasher gives a stable, reproducible digest across
        // runs and processes, which is what proof-of-work over a shared
        // chain requires (a per-process random seed would not be).
        let hash = ahash::RandomState::with_seeds(0, 0, 0, 0).hash_one(bytes);
        format!("{:016x}", hash)
    }
}

/// Cryptographically strong digest (SHA-256), substitutable for `FastDigest`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrongDigest;

impl BlockDigest for StrongDigest {
    fn digest_hex(&self, bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}
