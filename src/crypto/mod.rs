// src/crypto/mod.rs
// Crypto primitives: canonical encoding, block digests, ECDSA keys.

pub mod canonical;
pub mod digest;
pub mod keys;

pub use canonical::canonical_bytes;
pub use digest::{BlockDigest, FastDigest, StrongDigest};
pub use keys::{
    generate_keypairs, sign_ballot, verify_signature, verifying_key_from_signing_key,
};
