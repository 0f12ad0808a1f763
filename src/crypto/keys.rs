// src/crypto/keys.rs
// ECDSA (NIST P-256) keypair generation, signing, and verification over the
// canonical encoding of a ballot.

use ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;

use super::canonical::canonical_bytes;
use crate::chain::ballot::Ballot;

/// Generate `n` fresh ECDSA keypairs as hex strings.
///
/// Returns `(signing_keys, verifying_keys)`, matching index-for-index. Only
/// the verifying keys are ever embedded in a genesis block; the signing keys
/// are returned to the caller and never stored by the node.
pub fn generate_keypairs(n: usize) -> (Vec<String>, Vec<String>) {
    let mut signing_keys = Vec::with_capacity(n);
    let mut verifying_keys = Vec::with_capacity(n);

    for _ in 0..n {
        let sk = SigningKey::random(&mut OsRng);
        let vk = VerifyingKey::from(&sk);

        signing_keys.push(hex::encode(sk.to_bytes()));
        verifying_keys.push(hex::encode(vk.to_encoded_point(true).as_bytes()));
    }

    (signing_keys, verifying_keys)
}

/// Sign `ballot` with `signing_key_hex`, returning the signature as a hex
/// string. Returns `None` if the key hex is malformed.
pub fn sign_ballot(ballot: &Ballot, signing_key_hex: &str) -> Option<String> {
    let sk = decode_signing_key(signing_key_hex)?;
    let sig: Signature = sk.sign(&canonical_bytes(ballot));
    Some(hex::encode(sig.to_bytes()))
}

/// Verify that `signature_hex` is a valid ECDSA signature over the canonical
/// encoding of `ballot` under `verifying_key_hex`.
///
/// Never panics or propagates an error: any decode failure or signature
/// mismatch simply returns `false`.
pub fn verify_signature(ballot: &Ballot, signature_hex: &str, verifying_key_hex: &str) -> bool {
    let vk = match decode_verifying_key(verifying_key_hex) {
        Some(vk) => vk,
        None => return false,
    };
    let sig_bytes = match hex::decode(signature_hex) {
        Ok(b) => b,
        Err(_) => return false,
    };
    let sig = match Signature::from_slice(&sig_bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };

    vk.verify(&canonical_bytes(ballot), &sig).is_ok()
}

/// Derive a hex verifying key from a hex signing key, e.g. to recover the
/// voter's identity from `cast_ballot`'s `signing_key` parameter.
pub fn verifying_key_from_signing_key(signing_key_hex: &str) -> Option<String> {
    let sk = decode_signing_key(signing_key_hex)?;
    let vk = VerifyingKey::from(&sk);
    Some(hex::encode(vk.to_encoded_point(true).as_bytes()))
}

fn decode_signing_key(hex_str: &str) -> Option<SigningKey> {
    let bytes = hex::decode(hex_str).ok()?;
    SigningKey::from_bytes(bytes.as_slice().into()).ok()
}

fn decode_verifying_key(hex_str: &str) -> Option<VerifyingKey> {
    let bytes = hex::decode(hex_str).ok()?;
    VerifyingKey::from_sec1_bytes(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_ballot(vk: &str) -> Ballot {
        Ballot {
            id: Uuid::new_v4(),
            election: Uuid::new_v4(),
            candidates: vec!["A".into(), "B".into()],
            verifying_key: vk.to_string(),
        }
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let (sks, vks) = generate_keypairs(1);
        let ballot = sample_ballot(&vks[0]);
        let sig = sign_ballot(&ballot, &sks[0]).unwrap();
        assert!(verify_signature(&ballot, &sig, &vks[0]));
    }

    #[test]
    fn bit_flip_breaks_verification() {
        let (sks, vks) = generate_keypairs(1);
        let ballot = sample_ballot(&vks[0]);
        let sig = sign_ballot(&ballot, &sks[0]).unwrap();
        let mut tampered = ballot.clone();
        tampered.candidates = vec!["B".into(), "A".into()];
        assert!(!verify_signature(&tampered, &sig, &vks[0]));
    }

    #[test]
    fn verify_never_panics_on_garbage() {
        let ballot = sample_ballot("not hex");
        assert!(!verify_signature(&ballot, "also not hex", "zz"));
    }

    #[test]
    fn verifying_key_matches_generated_pair() {
        let (sks, vks) = generate_keypairs(1);
        assert_eq!(verifying_key_from_signing_key(&sks[0]).unwrap(), vks[0]);
    }
}
